//! Runtime configuration: query server memory and cell stitching tolerances

use navmesh_common::{Error, Result};

use crate::nav_mesh_types::NavTriangleKey;
use crate::traversal::PropagationNode;

/// Byte budgets of the three regions of a [`NavMeshQueryBuffer`](crate::NavMeshQueryBuffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct QueryBufferConfig {
    /// Lists returned by position and box queries
    pub result_bytes: usize,
    /// Open and closed sets of the traversals, split in two halves
    pub working_bytes: usize,
    /// Triangles recorded for queries with propagation memory enabled
    pub propagation_bytes: usize,
}

impl Default for QueryBufferConfig {
    fn default() -> Self {
        Self {
            result_bytes: 64 * 1024,
            working_bytes: 64 * 1024,
            propagation_bytes: 16 * 1024,
        }
    }
}

impl QueryBufferConfig {
    /// Number of open nodes fitting in the working region
    pub fn open_node_capacity(&self) -> usize {
        (self.working_bytes / 2) / std::mem::size_of::<PropagationNode>()
    }

    /// Number of closed nodes fitting in the working region
    pub fn closed_node_capacity(&self) -> usize {
        (self.working_bytes - self.working_bytes / 2) / std::mem::size_of::<NavTriangleKey>()
    }

    pub fn propagation_capacity(&self) -> usize {
        self.propagation_bytes / std::mem::size_of::<NavTriangleKey>()
    }

    pub fn result_capacity(&self) -> usize {
        self.result_bytes / std::mem::size_of::<NavTriangleKey>()
    }

    pub fn validate(&self) -> Result<()> {
        if self.open_node_capacity() < 1 || self.closed_node_capacity() < 1 {
            return Err(Error::InvalidConfig(format!(
                "working region of {} bytes cannot hold one open and one closed node",
                self.working_bytes
            )));
        }
        Ok(())
    }
}

/// Tolerances used to match the boundary half-edges of neighbouring cells
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StitchConfig {
    /// Horizontal distance between matching vertices, in meters
    pub vertex_tolerance: f32,
    /// Altitude difference between matching vertices, in meters
    pub altitude_tolerance: f32,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            vertex_tolerance: 1e-3,
            altitude_tolerance: 0.5,
        }
    }
}

impl StitchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.vertex_tolerance >= 0.0) || !(self.altitude_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(
                "stitch tolerances must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffer_config() -> Result<()> {
        let config = QueryBufferConfig::default();
        config.validate()?;
        assert!(config.open_node_capacity() > 1000);
        assert!(config.closed_node_capacity() > 1000);
        assert!(config.propagation_capacity() > 0);
        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        let tiny = QueryBufferConfig {
            working_bytes: 8,
            ..Default::default()
        };
        assert!(tiny.validate().is_err());

        let stitch = StitchConfig {
            vertex_tolerance: -1.0,
            ..Default::default()
        };
        assert!(stitch.validate().is_err());
        assert!(StitchConfig::default().validate().is_ok());
    }
}
