//! Oriented box obstacle

use crate::{perp_ccw, to_2d, Box2f, Box3f, Vec2, Vec3};

/// A box oriented around the Z axis.
///
/// The box is described by its center, the unit direction of its length axis in the
/// X,Y plane, its half extents along the length and width axes and its half height.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BoxObstacle {
    pub center: Vec3,
    pub length_dir: Vec2,
    pub half_length: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Default for BoxObstacle {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            length_dir: Vec2::X,
            half_length: 0.0,
            half_width: 0.0,
            half_height: 0.0,
        }
    }
}

impl BoxObstacle {
    /// Creates a box; `length_dir` is normalized, a null direction falls back to +X
    pub fn new(
        center: Vec3,
        length_dir: Vec2,
        half_length: f32,
        half_width: f32,
        half_height: f32,
    ) -> Self {
        Self {
            center,
            length_dir: length_dir.try_normalize().unwrap_or(Vec2::X),
            half_length,
            half_width,
            half_height,
        }
    }

    /// Creates an axis-aligned box obstacle from a 3D AABB
    pub fn from_aabb(aabb: &Box3f) -> Self {
        let half = (aabb.max - aabb.min) * 0.5;
        Self::new((aabb.min + aabb.max) * 0.5, Vec2::X, half.x, half.y, half.z)
    }

    /// Creates the rectangle swept by a segment of half width `half_width`, centered on
    /// `start`, moving `length` along `dir`
    pub fn from_sweep(start: Vec3, dir: Vec2, length: f32, half_width: f32) -> Self {
        let dir = dir.try_normalize().unwrap_or(Vec2::X);
        let center = start + Vec3::new(dir.x, dir.y, 0.0) * (length * 0.5);
        Self::new(center, dir, length * 0.5, half_width, 0.0)
    }

    /// The width axis, 90 degrees counter-clockwise from the length axis
    pub fn width_dir(&self) -> Vec2 {
        perp_ccw(self.length_dir)
    }

    /// The four corners in the X,Y plane, counter-clockwise
    pub fn corners_2d(&self) -> [Vec2; 4] {
        let c = to_2d(self.center);
        let l = self.length_dir * self.half_length;
        let w = self.width_dir() * self.half_width;
        [c - l - w, c + l - w, c + l + w, c - l + w]
    }

    /// Footprint of the box
    pub fn aabb_2d(&self) -> Box2f {
        let mut aabb = Box2f::empty();
        for corner in self.corners_2d() {
            aabb.expand(corner);
        }
        aabb
    }

    pub fn aabb(&self) -> Box3f {
        let footprint = self.aabb_2d();
        Box3f::new(
            Vec3::new(footprint.min.x, footprint.min.y, self.center.z - self.half_height),
            Vec3::new(footprint.max.x, footprint.max.y, self.center.z + self.half_height),
        )
    }

    /// Coordinates of `p` in the box frame (along length, along width)
    pub fn to_local_2d(&self, p: Vec3) -> Vec2 {
        let d = to_2d(p) - to_2d(self.center);
        Vec2::new(d.dot(self.length_dir), d.dot(self.width_dir()))
    }

    /// Inclusive containment test in the X,Y plane
    pub fn contains_2d(&self, p: Vec3) -> bool {
        let local = self.to_local_2d(p);
        local.x.abs() <= self.half_length && local.y.abs() <= self.half_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_and_containment() {
        let obstacle = BoxObstacle::new(Vec3::new(1.0, 1.0, 0.0), Vec2::new(0.0, 2.0), 2.0, 1.0, 1.0);
        let corners = obstacle.corners_2d();
        assert!(corners.contains(&Vec2::new(2.0, -1.0)));
        assert!(corners.contains(&Vec2::new(0.0, 3.0)));
        assert!(obstacle.contains_2d(Vec3::new(1.5, 2.5, 10.0)));
        assert!(!obstacle.contains_2d(Vec3::new(2.5, 1.0, 0.0)));

        let aabb = obstacle.aabb();
        assert_eq!(aabb.min, Vec3::new(0.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn test_from_sweep() {
        let swept = BoxObstacle::from_sweep(Vec3::ZERO, Vec2::new(1.0, 0.0), 4.0, 0.5);
        assert_eq!(swept.center, Vec3::new(2.0, 0.0, 0.0));
        assert!(swept.contains_2d(Vec3::new(4.0, 0.5, 0.0)));
        assert!(!swept.contains_2d(Vec3::new(4.1, 0.0, 0.0)));
    }
}
