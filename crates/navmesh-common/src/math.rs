//! Math utilities and bounding boxes

use crate::{CellPos, Vec2, Vec3};

/// Calculates the cross product of two 2D vectors [(x1,y1), (x2,y2)]
#[inline]
pub fn cross_2d(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    x1 * y2 - y1 * x2
}

/// Calculates the dot product of two 2D vectors [(x1,y1), (x2,y2)]
#[inline]
pub fn dot_2d(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    x1 * x2 + y1 * y2
}

/// Square a value (x²)
#[inline]
pub fn sqr(x: f32) -> f32 {
    x * x
}

/// Projects a 3D position on the X,Y plane
#[inline]
pub fn to_2d(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Returns the vector rotated by -90 degrees (the right-hand side of a direction)
#[inline]
pub fn perp_cw(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Returns the vector rotated by +90 degrees (the left-hand side of a direction)
#[inline]
pub fn perp_ccw(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Squared distance between two points in the X,Y plane
#[inline]
pub fn square_distance_2d(a: Vec3, b: Vec3) -> f32 {
    sqr(b.x - a.x) + sqr(b.y - a.y)
}

/// Distance between two points in the X,Y plane
#[inline]
pub fn distance_2d(a: Vec3, b: Vec3) -> f32 {
    square_distance_2d(a, b).sqrt()
}

/// Axis-aligned 2D bounding box in the X,Y plane
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Box2f {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Box2f {
    fn default() -> Self {
        Self::empty()
    }
}

impl Box2f {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// An inverted box that becomes valid with the first `expand`
    pub fn empty() -> Self {
        Self {
            min: Vec2::splat(f32::MAX),
            max: Vec2::splat(-f32::MAX),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn expand(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn expand_box(&mut self, other: &Box2f) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Grows the box by `margin` on every side
    pub fn enlarge(&self, margin: f32) -> Box2f {
        Box2f::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Axis-aligned 3D bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Box3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Box3f {
    fn default() -> Self {
        Self::empty()
    }
}

impl Box3f {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(-f32::MAX),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn expand_box(&mut self, other: &Box3f) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// The X,Y footprint of the box
    pub fn to_2d(&self) -> Box2f {
        Box2f::new(to_2d(self.min), to_2d(self.max))
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Inclusive box of cell positions, also known as Box2i
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CellBox {
    pub min: CellPos,
    pub max: CellPos,
}

impl Default for CellBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl CellBox {
    pub fn new(min: CellPos, max: CellPos) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: CellPos::splat(i32::MAX),
            max: CellPos::splat(i32::MIN),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn count_x(&self) -> i32 {
        if self.is_valid() {
            self.max.x - self.min.x + 1
        } else {
            0
        }
    }

    pub fn count_y(&self) -> i32 {
        if self.is_valid() {
            self.max.y - self.min.y + 1
        } else {
            0
        }
    }

    pub fn count(&self) -> usize {
        self.count_x() as usize * self.count_y() as usize
    }

    pub fn is_inside(&self, pos: CellPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Row-major index of `pos`; `pos` must be inside the box
    pub fn row_major_index(&self, pos: CellPos) -> usize {
        ((pos.y - self.min.y) * self.count_x() + (pos.x - self.min.x)) as usize
    }

    pub fn expand(&mut self, pos: CellPos) {
        self.min = self.min.min(pos);
        self.max = self.max.max(pos);
    }

    pub fn expand_box(&mut self, other: &CellBox) {
        if other.is_valid() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// Grows the box by `margin` cells on every side
    pub fn enlarge(&self, margin: i32) -> CellBox {
        if !self.is_valid() {
            return *self;
        }
        CellBox::new(self.min - CellPos::splat(margin), self.max + CellPos::splat(margin))
    }

    /// Intersection of two boxes, possibly empty
    pub fn intersect(&self, other: &CellBox) -> CellBox {
        CellBox::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Iterates positions row by row
    pub fn iter(&self) -> impl Iterator<Item = CellPos> + '_ {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| CellPos::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_box_indices() {
        let cell_box = CellBox::new(CellPos::new(-1, 2), CellPos::new(2, 4));
        assert_eq!(cell_box.count_x(), 4);
        assert_eq!(cell_box.count_y(), 3);
        assert_eq!(cell_box.count(), 12);
        assert_eq!(cell_box.row_major_index(CellPos::new(-1, 2)), 0);
        assert_eq!(cell_box.row_major_index(CellPos::new(2, 2)), 3);
        assert_eq!(cell_box.row_major_index(CellPos::new(-1, 3)), 4);
        assert!(!cell_box.is_inside(CellPos::new(3, 3)));
        assert_eq!(cell_box.iter().count(), 12);
    }

    #[test]
    fn test_empty_boxes() {
        let mut cell_box = CellBox::empty();
        assert!(!cell_box.is_valid());
        assert_eq!(cell_box.count(), 0);
        cell_box.expand(CellPos::new(3, -2));
        assert!(cell_box.is_valid());
        assert_eq!(cell_box.count(), 1);

        let mut aabb = Box3f::empty();
        assert!(!aabb.is_valid());
        aabb.expand(Vec3::new(1.0, 2.0, 3.0));
        aabb.expand(Vec3::new(-1.0, 0.0, 5.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 5.0));
        assert!(aabb.to_2d().contains(Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_perpendiculars() {
        let dir = Vec2::new(1.0, 0.0);
        assert_eq!(perp_cw(dir), Vec2::new(0.0, -1.0));
        assert_eq!(perp_ccw(dir), Vec2::new(0.0, 1.0));
    }
}
