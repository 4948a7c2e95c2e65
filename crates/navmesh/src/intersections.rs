//! 2D intersection tests and closest-point helpers
//!
//! Everything works in the X,Y plane; the Z coordinate of `Vec3` arguments is ignored
//! unless stated otherwise. Touching shapes intersect: all tests include their bounds.

use navmesh_common::{
    perp_ccw, sqr, to_2d, tri_area_2d, Box2f, Box3f, BoxObstacle, Vec2, Vec3,
};

pub use navmesh_common::{
    closest_point_on_segment_2d, square_distance_point_to_segment_2d,
    square_distance_point_to_triangle_2d,
};

/// Relative tolerance under which two directions are considered parallel
const PARALLEL_EPSILON: f32 = 1e-9;

// Boxes

pub fn aabb_vs_aabb_2d(a: &Box2f, b: &Box2f) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}

/// Footprint test of two 3D boxes
pub fn aabb3_vs_aabb3_2d(a: &Box3f, b: &Box3f) -> bool {
    aabb_vs_aabb_2d(&a.to_2d(), &b.to_2d())
}

/// Footprint test of a 3D box against a 2D one
pub fn aabb3_vs_aabb2_2d(a: &Box3f, b: &Box2f) -> bool {
    aabb_vs_aabb_2d(&a.to_2d(), b)
}

pub fn aabb_vs_aabb_3d(a: &Box3f, b: &Box3f) -> bool {
    aabb3_vs_aabb3_2d(a, b) && a.min.z <= b.max.z && a.max.z >= b.min.z
}

/// Projection interval of the oriented box on `axis`
fn box_obstacle_interval(obstacle: &BoxObstacle, axis: Vec2) -> (f32, f32) {
    let c = to_2d(obstacle.center).dot(axis);
    let r = obstacle.half_length * obstacle.length_dir.dot(axis).abs()
        + obstacle.half_width * obstacle.width_dir().dot(axis).abs();
    (c - r, c + r)
}

fn interval_of(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    navmesh_common::project_points_2d(axis, points)
}

/// Separating axis test between a convex polygon and an oriented box
fn polygon_vs_box_obstacle_2d(points: &[Vec2], obstacle: &BoxObstacle) -> bool {
    let box_axes = [obstacle.length_dir, obstacle.width_dir()];
    for axis in box_axes {
        if !navmesh_common::intervals_overlap(interval_of(points, axis), box_obstacle_interval(obstacle, axis)) {
            return false;
        }
    }
    for i in 0..points.len() {
        let edge = points[(i + 1) % points.len()] - points[i];
        if edge.length_squared() == 0.0 {
            continue;
        }
        let axis = perp_ccw(edge);
        if !navmesh_common::intervals_overlap(interval_of(points, axis), box_obstacle_interval(obstacle, axis)) {
            return false;
        }
    }
    true
}

pub fn aabb_vs_box_obstacle_2d(aabb: &Box2f, obstacle: &BoxObstacle) -> bool {
    let corners = [
        aabb.min,
        Vec2::new(aabb.max.x, aabb.min.y),
        aabb.max,
        Vec2::new(aabb.min.x, aabb.max.y),
    ];
    polygon_vs_box_obstacle_2d(&corners, obstacle)
}

// Segments

/// Liang-Barsky clipping of `p + t*d`, `t` in `[t0, t1]`, against `lo <= x <= hi` on one axis
fn clip_axis(p: f32, d: f32, lo: f32, hi: f32, t0: &mut f32, t1: &mut f32) -> bool {
    if d.abs() <= f32::EPSILON {
        return p >= lo && p <= hi;
    }
    let (mut ta, mut tb) = ((lo - p) / d, (hi - p) / d);
    if ta > tb {
        std::mem::swap(&mut ta, &mut tb);
    }
    *t0 = t0.max(ta);
    *t1 = t1.min(tb);
    *t0 <= *t1
}

/// Parameter range of segment `[a,b]` inside the box, if any
pub fn clip_segment_to_aabb_2d(a: Vec2, b: Vec2, aabb: &Box2f) -> Option<(f32, f32)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    (clip_axis(a.x, d.x, aabb.min.x, aabb.max.x, &mut t0, &mut t1)
        && clip_axis(a.y, d.y, aabb.min.y, aabb.max.y, &mut t0, &mut t1))
    .then_some((t0, t1))
}

pub fn segment_vs_aabb_2d(a: Vec3, b: Vec3, aabb: &Box2f) -> bool {
    clip_segment_to_aabb_2d(to_2d(a), to_2d(b), aabb).is_some()
}

pub fn segment_vs_box_obstacle_2d(a: Vec3, b: Vec3, obstacle: &BoxObstacle) -> bool {
    let local = Box2f::new(
        Vec2::new(-obstacle.half_length, -obstacle.half_width),
        Vec2::new(obstacle.half_length, obstacle.half_width),
    );
    clip_segment_to_aabb_2d(obstacle.to_local_2d(a), obstacle.to_local_2d(b), &local).is_some()
}

/// Parameters `(s, t)` of the crossing point of `[a,b]` and `[c,d]`, when they cross
fn segment_vs_segment_params(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<(f32, f32)> {
    let u = to_2d(b) - to_2d(a);
    let v = to_2d(d) - to_2d(c);
    let w = to_2d(a) - to_2d(c);
    let denom = u.perp_dot(v);

    if denom.abs() <= PARALLEL_EPSILON * u.length() * v.length() {
        // Parallel: only collinear overlapping segments intersect
        if u.perp_dot(w).abs() > PARALLEL_EPSILON.sqrt() * u.length().max(1.0) * w.length().max(1.0) {
            return None;
        }
        let len_sq = u.length_squared();
        if len_sq == 0.0 {
            let v_len_sq = v.length_squared();
            if v_len_sq == 0.0 {
                return (w.length_squared() == 0.0).then_some((0.0, 0.0));
            }
            let t = (-w).dot(v) / v_len_sq;
            return (0.0..=1.0).contains(&t).then_some((0.0, t));
        }
        // Projections of c and d on [a,b]
        let tc = (to_2d(c) - to_2d(a)).dot(u) / len_sq;
        let td = (to_2d(d) - to_2d(a)).dot(u) / len_sq;
        let (lo, hi) = (tc.min(td), tc.max(td));
        if hi < 0.0 || lo > 1.0 {
            return None;
        }
        let s = lo.max(0.0);
        let v_len_sq = v.length_squared();
        let t = if v_len_sq > 0.0 {
            ((to_2d(a) + u * s) - to_2d(c)).dot(v) / v_len_sq
        } else {
            0.0
        };
        return Some((s, t.clamp(0.0, 1.0)));
    }

    let s = v.perp_dot(w) / denom;
    let t = u.perp_dot(w) / denom;
    ((0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)).then_some((s, t))
}

pub fn segment_vs_segment_2d(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> bool {
    segment_vs_segment_params(a, b, c, d).is_some()
}

/// Crossing point closest to `a`; its altitude is interpolated on `[a,b]`
pub fn segment_vs_segment_2d_with_intersection(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<Vec3> {
    segment_vs_segment_params(a, b, c, d).map(|(s, _)| a + (b - a) * s)
}

/// True if the lines through `a` along `dir_a` and through `b` along `dir_b` cross
pub fn line_vs_line_2d(a: Vec3, dir_a: Vec2, b: Vec3, dir_b: Vec2) -> bool {
    dir_a.perp_dot(dir_b).abs() > PARALLEL_EPSILON * dir_a.length() * dir_b.length()
}

pub fn line_vs_line_2d_with_intersection(a: Vec3, dir_a: Vec2, b: Vec3, dir_b: Vec2) -> Option<Vec3> {
    if !line_vs_line_2d(a, dir_a, b, dir_b) {
        return None;
    }
    let w = to_2d(a) - to_2d(b);
    let s = dir_b.perp_dot(w) / dir_a.perp_dot(dir_b);
    Some(a + Vec3::new(dir_a.x, dir_a.y, 0.0) * s)
}

/// Squared distance between two segments (0 when they cross)
pub fn square_distance_segment_to_segment_2d(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> f32 {
    if segment_vs_segment_2d(a, b, c, d) {
        return 0.0;
    }
    square_distance_point_to_segment_2d(a, c, d)
        .min(square_distance_point_to_segment_2d(b, c, d))
        .min(square_distance_point_to_segment_2d(c, a, b))
        .min(square_distance_point_to_segment_2d(d, a, b))
}

// Disks and capsules

pub fn segment_vs_disk_2d(a: Vec3, b: Vec3, center: Vec3, radius: f32) -> bool {
    square_distance_point_to_segment_2d(center, a, b) <= sqr(radius)
}

/// First point of `[a,b]` inside the disk, walking from `a`
pub fn segment_vs_disk_2d_with_intersection(a: Vec3, b: Vec3, center: Vec3, radius: f32) -> Option<Vec3> {
    let d = to_2d(b) - to_2d(a);
    let f = to_2d(a) - to_2d(center);
    let r_sq = sqr(radius);
    if f.length_squared() <= r_sq {
        return Some(a);
    }
    let qa = d.length_squared();
    if qa == 0.0 {
        return None;
    }
    let qb = 2.0 * f.dot(d);
    let qc = f.length_squared() - r_sq;
    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-qb - discriminant.sqrt()) / (2.0 * qa);
    (0.0..=1.0).contains(&t).then(|| a + (b - a) * t)
}

/// Capsule swept by a disk of `radius` moving `length` meters from `center` along `dir`
pub fn segment_vs_capsule_2d(a: Vec3, b: Vec3, center: Vec3, dir: Vec2, length: f32, radius: f32) -> bool {
    let end = center + Vec3::new(dir.x, dir.y, 0.0) * length;
    square_distance_segment_to_segment_2d(a, b, center, end) <= sqr(radius)
}

/// Capsule given as its swept rectangle and the two end disks
pub fn segment_vs_capsule_box_2d(
    a: Vec3,
    b: Vec3,
    sweep: &BoxObstacle,
    start_center: Vec3,
    end_center: Vec3,
    radius: f32,
) -> bool {
    segment_vs_box_obstacle_2d(a, b, sweep)
        || segment_vs_disk_2d(a, b, start_center, radius)
        || segment_vs_disk_2d(a, b, end_center, radius)
}

/// Frame of a moving shape: `t` along the motion, `u` to its left
#[derive(Debug, Clone, Copy)]
pub(crate) struct MotionFrame {
    pub origin: Vec2,
    pub dir: Vec2,
    pub left: Vec2,
}

impl MotionFrame {
    pub fn new(origin: Vec3, dir: Vec2) -> Self {
        let dir = dir.try_normalize().unwrap_or(Vec2::X);
        Self {
            origin: to_2d(origin),
            dir,
            left: perp_ccw(dir),
        }
    }

    /// `(t, u)` coordinates of a position
    pub fn local(&self, p: Vec3) -> Vec2 {
        let d = to_2d(p) - self.origin;
        Vec2::new(d.dot(self.dir), d.dot(self.left))
    }

    pub fn world(&self, local: Vec2, altitude: f32) -> Vec3 {
        let p = self.origin + self.dir * local.x + self.left * local.y;
        Vec3::new(p.x, p.y, altitude)
    }
}

/// Part of segment `[p, q]` (local coordinates) with `u` in `[u_min, u_max]`
pub(crate) fn clip_local_segment_to_band(p: Vec2, q: Vec2, u_min: f32, u_max: f32) -> Option<(Vec2, Vec2)> {
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    if !clip_axis(p.y, q.y - p.y, u_min, u_max, &mut t0, &mut t1) {
        return None;
    }
    let d = q - p;
    Some((p + d * t0, p + d * t1))
}

/// Capsule swept by a disk of `radius` moving `length` meters from `center` along `dir`,
/// keeping only its part within `dist_on_right` on the right and `dist_on_left` on the left
/// of the motion axis
#[allow(clippy::too_many_arguments)]
pub fn segment_vs_cross_section_capsule_2d(
    a: Vec3,
    b: Vec3,
    center: Vec3,
    dir: Vec2,
    length: f32,
    radius: f32,
    dist_on_right: f32,
    dist_on_left: f32,
) -> bool {
    let frame = MotionFrame::new(center, dir);
    let Some((p, q)) = clip_local_segment_to_band(
        frame.local(a),
        frame.local(b),
        -dist_on_right.min(radius),
        dist_on_left.min(radius),
    ) else {
        return false;
    };
    let to_3d = |v: Vec2| Vec3::new(v.x, v.y, 0.0);
    square_distance_segment_to_segment_2d(
        to_3d(p),
        to_3d(q),
        Vec3::ZERO,
        Vec3::new(length, 0.0, 0.0),
    ) <= sqr(radius)
}

// Triangles

/// Point on an edge or a vertex counts as inside, whatever the winding
pub fn is_point_inside_triangle_2d(p: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
    navmesh_common::point_in_triangle_2d(p, v0, v1, v2)
}

/// Altitude at the X,Y of `p` of the plane through the triangle
pub fn compute_altitude_of_point_in_triangle(p: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    let area = tri_area_2d(v0, v1, v2);
    if area.abs() <= f32::EPSILON {
        return (v0.z + v1.z + v2.z) / 3.0;
    }
    let w0 = tri_area_2d(v1, v2, p) / area;
    let w1 = tri_area_2d(v2, v0, p) / area;
    let w2 = 1.0 - w0 - w1;
    w0 * v0.z + w1 * v1.z + w2 * v2.z
}

pub fn segment_vs_triangle_2d(a: Vec3, b: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
    is_point_inside_triangle_2d(a, v0, v1, v2)
        || segment_vs_segment_2d(a, b, v0, v1)
        || segment_vs_segment_2d(a, b, v1, v2)
        || segment_vs_segment_2d(a, b, v2, v0)
}

/// Squared distance between a triangle and a segment (0 when they overlap)
pub fn square_distance_triangle_to_segment_2d(v0: Vec3, v1: Vec3, v2: Vec3, a: Vec3, b: Vec3) -> f32 {
    if segment_vs_triangle_2d(a, b, v0, v1, v2) {
        return 0.0;
    }
    square_distance_segment_to_segment_2d(a, b, v0, v1)
        .min(square_distance_segment_to_segment_2d(a, b, v1, v2))
        .min(square_distance_segment_to_segment_2d(a, b, v2, v0))
}

pub fn triangle_vs_box_obstacle_2d(v0: Vec3, v1: Vec3, v2: Vec3, obstacle: &BoxObstacle) -> bool {
    polygon_vs_box_obstacle_2d(&[to_2d(v0), to_2d(v1), to_2d(v2)], obstacle)
}

pub fn triangle_vs_aabb_2d(v0: Vec3, v1: Vec3, v2: Vec3, aabb: &Box2f) -> bool {
    triangle_vs_box_obstacle_2d(v0, v1, v2, &BoxObstacle::from_aabb(&Box3f::new(
        Vec3::new(aabb.min.x, aabb.min.y, 0.0),
        Vec3::new(aabb.max.x, aabb.max.y, 0.0),
    )))
}

pub fn triangle_vs_triangle_2d(a: [Vec3; 3], b: [Vec3; 3]) -> bool {
    let pa = a.map(to_2d);
    let pb = b.map(to_2d);
    for (poly, other) in [(&pa, &pb), (&pb, &pa)] {
        for i in 0..3 {
            let edge = poly[(i + 1) % 3] - poly[i];
            if edge.length_squared() == 0.0 {
                continue;
            }
            let axis = perp_ccw(edge);
            if !navmesh_common::intervals_overlap(interval_of(poly, axis), interval_of(other, axis)) {
                return false;
            }
        }
    }
    true
}

/// Footprint overlap plus altitude overlap, the box being enlarged by the tolerances
pub fn overlapping_box_obstacle_vs_triangle_3d(
    obstacle: &BoxObstacle,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    tolerance_below: f32,
    tolerance_above: f32,
) -> bool {
    let z_min = obstacle.center.z - obstacle.half_height - tolerance_below;
    let z_max = obstacle.center.z + obstacle.half_height + tolerance_above;
    let tri_min = v0.z.min(v1.z).min(v2.z);
    let tri_max = v0.z.max(v1.z).max(v2.z);
    tri_min <= z_max && tri_max >= z_min && triangle_vs_box_obstacle_2d(v0, v1, v2, obstacle)
}

// Circumcircles

/// Determinant of the in-circle test, positive when `p` is inside the circumcircle of a
/// counter-clockwise triangle
pub fn compute_in_circum_circle_determinant(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> f64 {
    let row = |v: Vec3| {
        let dx = v.x as f64 - p.x as f64;
        let dy = v.y as f64 - p.y as f64;
        (dx, dy, dx * dx + dy * dy)
    };
    let (ax, ay, a2) = row(v0);
    let (bx, by, b2) = row(v1);
    let (cx, cy, c2) = row(v2);
    ax * (by * c2 - b2 * cy) - ay * (bx * c2 - b2 * cx) + a2 * (bx * cy - by * cx)
}

fn oriented_in_circum_circle_determinant(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> f64 {
    let det = compute_in_circum_circle_determinant(v0, v1, v2, p);
    if tri_area_2d(v0, v1, v2) < 0.0 {
        -det
    } else {
        det
    }
}

/// Points on the circle count as inside
pub fn is_point_inside_circum_circle_2d(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> bool {
    oriented_in_circum_circle_determinant(v0, v1, v2, p) >= 0.0
}

pub fn is_point_strictly_inside_circum_circle_2d(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> bool {
    oriented_in_circum_circle_determinant(v0, v1, v2, p) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    #[test]
    fn test_aabb_tests() {
        let a = Box2f::new(Vec2::ZERO, Vec2::splat(2.0));
        let b = Box2f::new(Vec2::splat(2.0), Vec2::splat(3.0));
        let c = Box2f::new(Vec2::splat(2.1), Vec2::splat(3.0));
        assert!(aabb_vs_aabb_2d(&a, &b));
        assert!(!aabb_vs_aabb_2d(&a, &c));

        let low = Box3f::new(Vec3::ZERO, Vec3::splat(1.0));
        let high = Box3f::new(Vec3::new(0.0, 0.0, 2.0), Vec3::splat(3.0));
        assert!(aabb3_vs_aabb3_2d(&low, &high));
        assert!(!aabb_vs_aabb_3d(&low, &high));
    }

    #[test]
    fn test_box_obstacle_tests() {
        let rotated = BoxObstacle::new(v(0.0, 0.0), Vec2::new(1.0, 1.0), 2.0, 0.1, 1.0);
        // The diagonal box reaches (1.4, 1.4) but not the corner region of (1.5, -1.5)
        assert!(aabb_vs_box_obstacle_2d(
            &Box2f::new(Vec2::splat(1.0), Vec2::splat(2.0)),
            &rotated
        ));
        assert!(!aabb_vs_box_obstacle_2d(
            &Box2f::new(Vec2::new(1.0, -2.0), Vec2::new(2.0, -1.0)),
            &rotated
        ));
        assert!(segment_vs_box_obstacle_2d(v(-1.0, 1.0), v(1.0, -1.0), &rotated));
        assert!(!segment_vs_box_obstacle_2d(v(1.0, -1.0), v(2.0, -1.0), &rotated));
        assert!(triangle_vs_box_obstacle_2d(v(0.0, 0.0), v(0.1, 0.0), v(0.0, 0.1), &rotated));
    }

    #[test]
    fn test_segment_vs_segment() {
        assert_eq!(
            segment_vs_segment_2d_with_intersection(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0)),
            Some(v(1.0, 1.0))
        );
        // Touching at an endpoint
        assert!(segment_vs_segment_2d(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)));
        // Collinear overlap and disjoint collinear
        assert!(segment_vs_segment_2d(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(3.0, 0.0)));
        assert!(!segment_vs_segment_2d(v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0), v(3.0, 0.0)));
        // Parallel
        assert!(!segment_vs_segment_2d(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0), v(1.0, 1.0)));
    }

    #[test]
    fn test_line_vs_line() {
        let p = line_vs_line_2d_with_intersection(v(0.0, 1.0), Vec2::X, v(3.0, 0.0), Vec2::Y);
        assert_eq!(p, Some(v(3.0, 1.0)));
        assert!(!line_vs_line_2d(v(0.0, 0.0), Vec2::X, v(0.0, 1.0), Vec2::new(-2.0, 0.0)));
    }

    #[test]
    fn test_disk_tests() {
        assert!(segment_vs_disk_2d(v(-2.0, 1.0), v(2.0, 1.0), v(0.0, 0.0), 1.0));
        assert!(!segment_vs_disk_2d(v(-2.0, 1.1), v(2.0, 1.1), v(0.0, 0.0), 1.0));

        let hit = segment_vs_disk_2d_with_intersection(v(-3.0, 0.0), v(3.0, 0.0), v(0.0, 0.0), 1.0)
            .expect("crossing");
        assert!((hit.x + 1.0).abs() < 1e-5);
        assert!(segment_vs_disk_2d_with_intersection(v(2.0, 0.0), v(3.0, 0.0), v(0.0, 0.0), 1.0).is_none());
        assert_eq!(
            segment_vs_disk_2d_with_intersection(v(0.5, 0.0), v(3.0, 0.0), v(0.0, 0.0), 1.0),
            Some(v(0.5, 0.0))
        );
    }

    #[test]
    fn test_capsule_tests() {
        // Capsule from (0,0) to (10,0) with radius 1
        assert!(segment_vs_capsule_2d(v(5.0, 0.9), v(5.0, 3.0), v(0.0, 0.0), Vec2::X, 10.0, 1.0));
        assert!(segment_vs_capsule_2d(v(10.5, 0.5), v(12.0, 0.5), v(0.0, 0.0), Vec2::X, 10.0, 1.0));
        assert!(!segment_vs_capsule_2d(v(11.5, 0.0), v(12.0, 0.0), v(0.0, 0.0), Vec2::X, 10.0, 1.0));

        let sweep = BoxObstacle::from_sweep(v(0.0, 0.0), Vec2::X, 10.0, 1.0);
        assert!(segment_vs_capsule_box_2d(v(10.5, 0.5), v(12.0, 0.5), &sweep, v(0.0, 0.0), v(10.0, 0.0), 1.0));
        assert!(!segment_vs_capsule_box_2d(v(11.5, 0.0), v(12.0, 0.0), &sweep, v(0.0, 0.0), v(10.0, 0.0), 1.0));
    }

    #[test]
    fn test_cross_section_capsule() {
        let hits = |a: Vec3, b: Vec3, right: f32, left: f32| {
            segment_vs_cross_section_capsule_2d(a, b, v(0.0, 0.0), Vec2::X, 10.0, 1.0, right, left)
        };
        // Wall at y = 0.5 along the motion
        let (a, b) = (v(2.0, 0.5), v(8.0, 0.5));
        assert!(hits(a, b, 1.0, 1.0));
        assert!(!hits(a, b, 1.0, 0.4));
        // Same wall on the right side
        let (a, b) = (v(2.0, -0.5), v(8.0, -0.5));
        assert!(!hits(a, b, 0.4, 1.0));
        assert!(hits(a, b, 0.6, 0.0));
        // Wall across the motion is always hit
        assert!(hits(v(5.0, -3.0), v(5.0, 3.0), 0.0, 0.0));
    }

    #[test]
    fn test_triangle_tests() {
        let (a, b, c) = (v(0.0, 0.0), v(4.0, 0.0), v(0.0, 4.0));
        assert!(is_point_inside_triangle_2d(v(1.0, 1.0), a, b, c));
        assert!(is_point_inside_triangle_2d(v(2.0, 2.0), a, b, c));
        assert!(!is_point_inside_triangle_2d(v(2.1, 2.1), a, b, c));

        assert!(segment_vs_triangle_2d(v(-1.0, 1.0), v(1.0, 1.0), a, b, c));
        assert!(segment_vs_triangle_2d(v(0.5, 0.5), v(0.6, 0.6), a, b, c));
        assert!(!segment_vs_triangle_2d(v(3.0, 3.0), v(5.0, 3.0), a, b, c));

        assert!(triangle_vs_triangle_2d([a, b, c], [v(1.0, 1.0), v(5.0, 5.0), v(1.0, 5.0)]));
        assert!(!triangle_vs_triangle_2d([a, b, c], [v(3.0, 3.0), v(5.0, 3.0), v(3.0, 5.0)]));
        assert!(triangle_vs_aabb_2d(a, b, c, &Box2f::new(Vec2::splat(1.9), Vec2::splat(3.0))));
        assert!(!triangle_vs_aabb_2d(a, b, c, &Box2f::new(Vec2::splat(2.1), Vec2::splat(3.0))));

        let d = square_distance_triangle_to_segment_2d(a, b, c, v(3.0, 3.0), v(5.0, 3.0));
        assert!((d - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_altitude_in_triangle() {
        let (a, b, c) = (
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 4.0),
            Vec3::new(0.0, 4.0, 0.0),
        );
        let z = compute_altitude_of_point_in_triangle(v(1.0, 1.0), a, b, c);
        assert!((z - 1.0).abs() < 1e-5);
        let z = compute_altitude_of_point_in_triangle(v(1.0, 1.0), a, c, b);
        assert!((z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_box_obstacle_vs_triangle_3d() {
        let (a, b, c) = (v(0.0, 0.0), v(4.0, 0.0), v(0.0, 4.0));
        let obstacle = BoxObstacle::new(Vec3::new(1.0, 1.0, 2.0), Vec2::X, 0.5, 0.5, 0.5);
        assert!(!overlapping_box_obstacle_vs_triangle_3d(&obstacle, a, b, c, 0.0, 0.0));
        assert!(overlapping_box_obstacle_vs_triangle_3d(&obstacle, a, b, c, 1.5, 0.0));
    }

    #[test]
    fn test_circum_circle() {
        let (a, b, c) = (v(0.0, 0.0), v(2.0, 0.0), v(0.0, 2.0));
        assert!(is_point_strictly_inside_circum_circle_2d(a, b, c, v(1.0, 1.0)));
        assert!(is_point_inside_circum_circle_2d(a, b, c, v(2.0, 2.0)));
        assert!(!is_point_strictly_inside_circum_circle_2d(a, b, c, v(2.0, 2.0)));
        assert!(!is_point_inside_circum_circle_2d(a, b, c, v(3.0, 3.0)));
        // Winding does not matter
        assert!(is_point_strictly_inside_circum_circle_2d(a, c, b, v(1.0, 1.0)));
        assert!(compute_in_circum_circle_determinant(a, b, c, v(1.0, 1.0)) > 0.0);
    }

    #[test]
    fn test_segment_distances() {
        let d = square_distance_segment_to_segment_2d(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 1.0), v(1.0, 3.0));
        assert!((d - 1.0).abs() < 1e-6);
        assert_eq!(
            square_distance_segment_to_segment_2d(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0)),
            0.0
        );
        assert!(segment_vs_aabb_2d(v(-1.0, 0.5), v(3.0, 0.5), &Box2f::new(Vec2::ZERO, Vec2::ONE)));
        assert!(!segment_vs_aabb_2d(v(-1.0, 1.5), v(3.0, 1.5), &Box2f::new(Vec2::ZERO, Vec2::ONE)));
    }
}
