//! 2D geometry operations
//!
//! All operations work in the X,Y plane (Z-up coordinate system); the Z coordinate of
//! `Vec3` arguments is ignored unless stated otherwise.

use crate::{sqr, Vec2, Vec3};

/// Calculate twice the signed area of a 2D triangle in the X,Y plane.
///
/// The sign indicates the winding order:
/// - Positive: counter-clockwise (when looking down the Z axis)
/// - Negative: clockwise
/// - Zero: degenerate (collinear points)
#[inline]
pub fn tri_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// Check if point c is strictly left of the line from a to b.
#[inline]
pub fn left(a: Vec3, b: Vec3, c: Vec3) -> bool {
    tri_area_2d(a, b, c) > 0.0
}

/// Check if point c is left of or on the line from a to b.
#[inline]
pub fn left_on(a: Vec3, b: Vec3, c: Vec3) -> bool {
    tri_area_2d(a, b, c) >= 0.0
}

/// Check if two 2D axis-aligned bounding boxes overlap.
#[inline]
pub fn overlap_bounds_2d(amin: Vec2, amax: Vec2, bmin: Vec2, bmax: Vec2) -> bool {
    amin.x <= bmax.x && amax.x >= bmin.x && amin.y <= bmax.y && amax.y >= bmin.y
}

/// Returns the parameter of the point of [a,b] closest to p, clamped to [0,1].
#[inline]
pub fn closest_param_on_segment_2d(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d = dx * dx + dy * dy;
    if d <= f32::EPSILON {
        return 0.0;
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / d).clamp(0.0, 1.0)
}

/// Find the closest point of segment [a,b] to p in the X,Y plane.
///
/// The altitude of the returned point is interpolated along the segment.
pub fn closest_point_on_segment_2d(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let t = closest_param_on_segment_2d(p, a, b);
    a + (b - a) * t
}

/// Squared distance from a point to a segment in the X,Y plane.
pub fn square_distance_point_to_segment_2d(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let q = closest_point_on_segment_2d(p, a, b);
    sqr(p.x - q.x) + sqr(p.y - q.y)
}

/// Distance from a point to a segment in the X,Y plane.
#[inline]
pub fn distance_point_to_segment_2d(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    square_distance_point_to_segment_2d(p, a, b).sqrt()
}

/// Check if point p lies inside triangle (v1,v2,v3), whatever its winding.
///
/// Points lying exactly on an edge or a vertex are considered inside.
pub fn point_in_triangle_2d(p: Vec3, v1: Vec3, v2: Vec3, v3: Vec3) -> bool {
    let d1 = tri_area_2d(v1, v2, p);
    let d2 = tri_area_2d(v2, v3, p);
    let d3 = tri_area_2d(v3, v1, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Squared distance from a point to a triangle in the X,Y plane (0 when inside).
pub fn square_distance_point_to_triangle_2d(p: Vec3, v1: Vec3, v2: Vec3, v3: Vec3) -> f32 {
    if point_in_triangle_2d(p, v1, v2, v3) {
        return 0.0;
    }
    square_distance_point_to_segment_2d(p, v1, v2)
        .min(square_distance_point_to_segment_2d(p, v2, v3))
        .min(square_distance_point_to_segment_2d(p, v3, v1))
}

/// Check if point b lies within the X,Y bounds of segment [a,c].
///
/// Assumes the points are collinear.
#[inline]
pub fn between(a: Vec3, b: Vec3, c: Vec3) -> bool {
    if a.x != c.x {
        (a.x <= b.x && b.x <= c.x) || (c.x <= b.x && b.x <= a.x)
    } else {
        (a.y <= b.y && b.y <= c.y) || (c.y <= b.y && b.y <= a.y)
    }
}

/// Project a set of points on an axis and return the [min,max] interval.
pub fn project_points_2d(axis: Vec2, points: &[Vec2]) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = -f32::MAX;
    for p in points {
        let proj = p.dot(axis);
        min = min.min(proj);
        max = max.max(proj);
    }
    (min, max)
}

/// Check if two intervals overlap (bounds included).
#[inline]
pub fn intervals_overlap(a: (f32, f32), b: (f32, f32)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tri_area_2d() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        assert!(tri_area_2d(a, b, c) > 0.0);
        assert!(tri_area_2d(a, c, b) < 0.0);
        assert_eq!(tri_area_2d(a, b, Vec3::new(2.0, 0.0, 7.0)), 0.0);
    }

    #[test]
    fn test_orientation() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        assert!(left(a, b, Vec3::new(0.5, 1.0, 0.0)));
        assert!(!left(a, b, Vec3::new(0.5, -1.0, 0.0)));
        assert!(!left(a, b, Vec3::new(0.5, 0.0, 0.0)));
        assert!(left_on(a, b, Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_point_in_triangle_edges_are_inside() {
        let v1 = Vec3::new(0.0, 0.0, 0.0);
        let v2 = Vec3::new(10.0, 0.0, 0.0);
        let v3 = Vec3::new(0.0, 10.0, 0.0);
        assert!(point_in_triangle_2d(Vec3::new(1.0, 1.0, 0.0), v1, v2, v3));
        assert!(point_in_triangle_2d(Vec3::new(5.0, 0.0, 0.0), v1, v2, v3));
        assert!(point_in_triangle_2d(Vec3::new(5.0, 5.0, 0.0), v1, v2, v3));
        assert!(point_in_triangle_2d(v3, v1, v2, v3));
        assert!(!point_in_triangle_2d(Vec3::new(5.1, 5.0, 0.0), v1, v2, v3));
        // winding does not matter
        assert!(point_in_triangle_2d(Vec3::new(1.0, 1.0, 0.0), v1, v3, v2));
    }

    #[test]
    fn test_distances() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 0.0, 2.0);
        let p = Vec3::new(5.0, 3.0, 0.0);
        assert_eq!(square_distance_point_to_segment_2d(p, a, b), 9.0);
        let q = closest_point_on_segment_2d(p, a, b);
        assert_eq!(q, Vec3::new(5.0, 0.0, 1.0));
        assert_eq!(square_distance_point_to_segment_2d(Vec3::new(-3.0, 4.0, 0.0), a, b), 25.0);

        let c = Vec3::new(0.0, 10.0, 0.0);
        assert_eq!(square_distance_point_to_triangle_2d(Vec3::new(1.0, 1.0, 0.0), a, b, c), 0.0);
        assert_eq!(square_distance_point_to_triangle_2d(Vec3::new(-2.0, 1.0, 0.0), a, b, c), 4.0);
    }
}
