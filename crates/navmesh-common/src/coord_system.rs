//! Client coordinate system configuration
//!
//! The NavMesh space is right-handed, Z-up and expressed in meters. A [`CoordSystem`]
//! describes how the client (game engine) axes and units map onto it. It is an explicit
//! value handed to whoever converts between the two spaces; the query engine itself only
//! ever sees NavMesh coordinates.

use crate::{Error, Result, Vec3};

/// Client axis mapped onto one NavMesh axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ClientAxis {
    X = 0,
    MinusX = 1,
    Y = 2,
    MinusY = 3,
    Z = 4,
    MinusZ = 5,
}

impl ClientAxis {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ClientAxis::X),
            1 => Some(ClientAxis::MinusX),
            2 => Some(ClientAxis::Y),
            3 => Some(ClientAxis::MinusY),
            4 => Some(ClientAxis::Z),
            5 => Some(ClientAxis::MinusZ),
            _ => None,
        }
    }

    fn component_index(self) -> usize {
        (self as usize) / 2
    }

    fn sign(self) -> f32 {
        if (self as u32) % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

/// Serialized part of the coordinate system, stored in every NavMesh blob header
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CoordSystemConfig {
    /// Number of client units in one meter
    pub one_meter_in_client_units: f32,
    pub client_axis_for_x: u32,
    pub client_axis_for_y: u32,
    pub client_axis_for_z: u32,
    /// Size in meters of one integer unit
    pub integer_precision: f32,
}

impl Default for CoordSystemConfig {
    fn default() -> Self {
        Self {
            one_meter_in_client_units: 1.0,
            client_axis_for_x: ClientAxis::X as u32,
            client_axis_for_y: ClientAxis::Y as u32,
            client_axis_for_z: ClientAxis::Z as u32,
            integer_precision: 0.01,
        }
    }
}

impl CoordSystemConfig {
    /// Checks that the axes form a permutation of X,Y,Z and that units are positive
    pub fn validate(&self) -> Result<()> {
        if self.one_meter_in_client_units <= 0.0 {
            return Err(Error::InvalidConfig(
                "one_meter_in_client_units must be greater than 0".to_string(),
            ));
        }
        if self.integer_precision <= 0.0 {
            return Err(Error::InvalidConfig(
                "integer_precision must be greater than 0".to_string(),
            ));
        }

        let mut used = [false; 3];
        for raw in [
            self.client_axis_for_x,
            self.client_axis_for_y,
            self.client_axis_for_z,
        ] {
            let axis = ClientAxis::from_u32(raw)
                .ok_or_else(|| Error::InvalidConfig(format!("unknown client axis {}", raw)))?;
            let idx = axis.component_index();
            if used[idx] {
                return Err(Error::InvalidConfig(
                    "the same client axis is mapped twice".to_string(),
                ));
            }
            used[idx] = true;
        }
        Ok(())
    }
}

/// Converts positions and distances between the client space and the NavMesh space
#[derive(Debug, Clone, Copy)]
pub struct CoordSystem {
    config: CoordSystemConfig,
    axes: [ClientAxis; 3],
    meter_to_client: f32,
    client_to_meter: f32,
}

impl Default for CoordSystem {
    fn default() -> Self {
        // The default configuration is always valid
        Self::build(CoordSystemConfig::default(), [ClientAxis::X, ClientAxis::Y, ClientAxis::Z])
    }
}

impl CoordSystem {
    /// Creates a coordinate system from a validated configuration
    pub fn new(config: CoordSystemConfig) -> Result<Self> {
        config.validate()?;
        let axes = [
            config.client_axis_for_x,
            config.client_axis_for_y,
            config.client_axis_for_z,
        ]
        .map(|raw| ClientAxis::from_u32(raw).unwrap_or(ClientAxis::X));
        Ok(Self::build(config, axes))
    }

    fn build(config: CoordSystemConfig, axes: [ClientAxis; 3]) -> Self {
        Self {
            config,
            axes,
            meter_to_client: config.one_meter_in_client_units,
            client_to_meter: 1.0 / config.one_meter_in_client_units,
        }
    }

    pub fn config(&self) -> &CoordSystemConfig {
        &self.config
    }

    pub fn client_to_navmesh_dist(&self, dist: f32) -> f32 {
        dist * self.client_to_meter
    }

    pub fn navmesh_to_client_dist(&self, dist: f32) -> f32 {
        dist * self.meter_to_client
    }

    pub fn client_to_navmesh_pos(&self, client: Vec3) -> Vec3 {
        let c = client.to_array();
        let mut out = [0.0; 3];
        for (dst, axis) in out.iter_mut().zip(self.axes) {
            *dst = c[axis.component_index()] * axis.sign() * self.client_to_meter;
        }
        Vec3::from_array(out)
    }

    pub fn navmesh_to_client_pos(&self, pos: Vec3) -> Vec3 {
        let p = pos.to_array();
        let mut out = [0.0; 3];
        for (value, axis) in p.iter().zip(self.axes) {
            out[axis.component_index()] = value * axis.sign() * self.meter_to_client;
        }
        Vec3::from_array(out)
    }

    /// Converts a NavMesh coordinate to integer units
    pub fn navmesh_to_int(&self, value: f32) -> i32 {
        (value / self.config.integer_precision).round() as i32
    }

    pub fn int_to_navmesh(&self, value: i32) -> f32 {
        value as f32 * self.config.integer_precision
    }
}
