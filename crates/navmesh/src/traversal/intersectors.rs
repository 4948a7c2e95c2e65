//! Query shapes tested against triangle edges
//!
//! Every shape measures contacts with the same key: the squared distance the shape
//! travels before touching the edge (or, for a static disk, the squared distance to its
//! center). The triangle cost is a lower bound of the key of any contact inside the
//! triangle, so a best-first propagation can stop as soon as the popped cost reaches the
//! best key found.

use navmesh_common::{
    closest_point_on_segment_2d, perp_ccw, sqr, square_distance_2d,
    square_distance_point_to_segment_2d, square_distance_point_to_triangle_2d, to_2d, Box2f, Vec2,
    Vec3,
};

use crate::intersections::{
    clip_local_segment_to_band, clip_segment_to_aabb_2d, segment_vs_cross_section_capsule_2d,
    segment_vs_segment_2d, segment_vs_segment_2d_with_intersection,
    square_distance_triangle_to_segment_2d, MotionFrame,
};

pub trait EdgeIntersector {
    /// True if the shape touches the edge `[a,b]`
    fn does_intersect_edge(&self, a: Vec3, b: Vec3) -> bool;

    /// True if an uncrossable edge `[a,b]` stops the shape
    fn is_blocked_by_edge(&self, a: Vec3, b: Vec3) -> bool {
        self.does_intersect_edge(a, b)
    }

    /// First contact position on an intersected edge and its key
    fn compute_collision_pos_on_edge(&self, a: Vec3, b: Vec3) -> (Vec3, f32);

    /// Lower bound of the key of any contact with the triangle
    fn compute_triangle_cost(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> f32;
}

/// Altitude of the edge `[a,b]` at the X,Y of `p`
fn on_edge(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let q = closest_point_on_segment_2d(p, a, b);
    Vec3::new(p.x, p.y, q.z)
}

/// Zero-width segment from `start` to `dest`
#[derive(Debug, Clone, Copy)]
pub struct RayIntersector {
    start: Vec3,
    dest: Vec3,
}

impl RayIntersector {
    pub fn new(start: Vec3, dest: Vec3) -> Self {
        Self { start, dest }
    }
}

impl EdgeIntersector for RayIntersector {
    fn does_intersect_edge(&self, a: Vec3, b: Vec3) -> bool {
        segment_vs_segment_2d(self.start, self.dest, a, b)
    }

    /// Only edges left by the ray toward their outer side stop it
    fn is_blocked_by_edge(&self, a: Vec3, b: Vec3) -> bool {
        let inward = perp_ccw(to_2d(b) - to_2d(a));
        inward.dot(to_2d(self.dest) - to_2d(self.start)) < 0.0 && self.does_intersect_edge(a, b)
    }

    fn compute_collision_pos_on_edge(&self, a: Vec3, b: Vec3) -> (Vec3, f32) {
        let p = segment_vs_segment_2d_with_intersection(self.start, self.dest, a, b)
            .unwrap_or(self.start);
        (on_edge(p, a, b), square_distance_2d(self.start, p))
    }

    fn compute_triangle_cost(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
        square_distance_point_to_triangle_2d(self.start, v0, v1, v2)
    }
}

/// Disk of `radius` moving `length` meters along `dir`.
///
/// The swept shape can be narrowed on each side of the motion axis: only the part within
/// `dist_on_right` on the right and `dist_on_left` on the left collides.
#[derive(Debug, Clone, Copy)]
pub struct CapsuleIntersector {
    frame: MotionFrame,
    start: Vec3,
    length: f32,
    radius: f32,
    dist_on_right: f32,
    dist_on_left: f32,
}

impl CapsuleIntersector {
    pub fn new(start: Vec3, dir: Vec2, length: f32, radius: f32) -> Self {
        Self {
            frame: MotionFrame::new(start, dir),
            start,
            length,
            radius,
            dist_on_right: radius,
            dist_on_left: radius,
        }
    }

    /// Cross-section capsule, side extents clamped to the radius
    pub fn with_cross_section(mut self, dist_on_right: f32, dist_on_left: f32) -> Self {
        self.dist_on_right = dist_on_right.clamp(0.0, self.radius);
        self.dist_on_left = dist_on_left.clamp(0.0, self.radius);
        self
    }

    /// Edge in the motion frame, clipped to the cross-section band
    fn clipped_edge(&self, a: Vec3, b: Vec3) -> Option<(Vec2, Vec2)> {
        clip_local_segment_to_band(
            self.frame.local(a),
            self.frame.local(b),
            -self.dist_on_right,
            self.dist_on_left,
        )
    }

    /// Travel distance before the disk touches the clipped edge `[p,q]`
    fn travel_to_contact(&self, p: Vec2, q: Vec2) -> (f32, Vec2) {
        let r = self.radius;
        let as_3d = |v: Vec2| Vec3::new(v.x, v.y, 0.0);
        if square_distance_point_to_segment_2d(Vec3::ZERO, as_3d(p), as_3d(q)) <= sqr(r) {
            let touched = closest_point_on_segment_2d(Vec3::ZERO, as_3d(p), as_3d(q));
            return (0.0, Vec2::new(touched.x, touched.y));
        }

        let contact = |v: Vec2| v.x - (sqr(r) - sqr(v.y)).max(0.0).sqrt();
        let du = q.y - p.y;
        if du.abs() <= f32::EPSILON {
            // Parallel to the motion: the nearer end is touched first
            let first = if p.x <= q.x { p } else { q };
            return (contact(first).max(0.0), first);
        }

        // t = p.x + k (u - p.y) along the edge; contact(u) is convex, its minimum is at
        // u = -k r / sqrt(1 + k^2)
        let k = (q.x - p.x) / du;
        let (u_min, u_max) = (p.y.min(q.y), p.y.max(q.y));
        let u = (-k * r / (1.0 + k * k).sqrt()).clamp(u_min, u_max);
        let touched = Vec2::new(p.x + k * (u - p.y), u);
        (contact(touched).max(0.0), touched)
    }
}

impl EdgeIntersector for CapsuleIntersector {
    fn does_intersect_edge(&self, a: Vec3, b: Vec3) -> bool {
        segment_vs_cross_section_capsule_2d(
            a,
            b,
            self.start,
            self.frame.dir,
            self.length,
            self.radius,
            self.dist_on_right,
            self.dist_on_left,
        )
    }

    fn compute_collision_pos_on_edge(&self, a: Vec3, b: Vec3) -> (Vec3, f32) {
        let Some((p, q)) = self.clipped_edge(a, b) else {
            return (self.start, f32::MAX);
        };
        let (travel, touched) = self.travel_to_contact(p, q);
        let world = self.frame.world(touched, 0.0);
        (on_edge(world, a, b), sqr(travel))
    }

    fn compute_triangle_cost(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
        let dist = square_distance_point_to_triangle_2d(self.start, v0, v1, v2).sqrt();
        sqr((dist - self.radius).max(0.0))
    }
}

/// Segment of half width `half_width`, orthogonal to `dir`, moving `length` meters along `dir`
#[derive(Debug, Clone, Copy)]
pub struct SegmentIntersector {
    frame: MotionFrame,
    start: Vec3,
    length: f32,
    half_width: f32,
}

impl SegmentIntersector {
    pub fn new(start: Vec3, dir: Vec2, length: f32, half_width: f32) -> Self {
        Self {
            frame: MotionFrame::new(start, dir),
            start,
            length,
            half_width,
        }
    }

    /// Ends of the segment at its start position, right end first
    pub fn start_segment(&self) -> (Vec3, Vec3) {
        let side = self.frame.left * self.half_width;
        let side = Vec3::new(side.x, side.y, 0.0);
        (self.start - side, self.start + side)
    }

    fn swept_box(&self) -> Box2f {
        Box2f::new(
            Vec2::new(0.0, -self.half_width),
            Vec2::new(self.length, self.half_width),
        )
    }
}

impl EdgeIntersector for SegmentIntersector {
    fn does_intersect_edge(&self, a: Vec3, b: Vec3) -> bool {
        clip_segment_to_aabb_2d(self.frame.local(a), self.frame.local(b), &self.swept_box()).is_some()
    }

    fn compute_collision_pos_on_edge(&self, a: Vec3, b: Vec3) -> (Vec3, f32) {
        let (p, q) = (self.frame.local(a), self.frame.local(b));
        let Some((t0, t1)) = clip_segment_to_aabb_2d(p, q, &self.swept_box()) else {
            return (self.start, f32::MAX);
        };
        let (c0, c1) = (p + (q - p) * t0, p + (q - p) * t1);
        let touched = if c0.x <= c1.x { c0 } else { c1 };
        let world = self.frame.world(touched, 0.0);
        (on_edge(world, a, b), sqr(touched.x.max(0.0)))
    }

    fn compute_triangle_cost(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
        let (right, left) = self.start_segment();
        square_distance_triangle_to_segment_2d(v0, v1, v2, right, left)
    }
}

/// Disk that does not move; the key is the squared distance to its center
#[derive(Debug, Clone, Copy)]
pub struct StaticDiskIntersector {
    center: Vec3,
    radius: f32,
}

impl StaticDiskIntersector {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl EdgeIntersector for StaticDiskIntersector {
    fn does_intersect_edge(&self, a: Vec3, b: Vec3) -> bool {
        square_distance_point_to_segment_2d(self.center, a, b) <= sqr(self.radius)
    }

    fn compute_collision_pos_on_edge(&self, a: Vec3, b: Vec3) -> (Vec3, f32) {
        let p = closest_point_on_segment_2d(self.center, a, b);
        (p, square_distance_2d(self.center, p))
    }

    fn compute_triangle_cost(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
        square_distance_point_to_triangle_2d(self.center, v0, v1, v2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn assert_near(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn test_ray_contact() {
        let ray = RayIntersector::new(v(0.0, 0.0), v(10.0, 0.0));
        // Obstacle at x = 4, interior on the west side: the ray leaves through it
        let (a, b) = (v(4.0, -1.0), v(4.0, 1.0));
        assert!(ray.is_blocked_by_edge(a, b));
        let (pos, key) = ray.compute_collision_pos_on_edge(a, b);
        assert_near(pos.x, 4.0);
        assert_near(key, 16.0);
        // Same edge seen from the other side is entered, not left
        assert!(ray.does_intersect_edge(b, a));
        assert!(!ray.is_blocked_by_edge(b, a));
        assert_eq!(ray.compute_triangle_cost(v(1.0, -1.0), v(2.0, -1.0), v(1.0, 1.0)), 1.0);
    }

    #[test]
    fn test_capsule_frontal_contact() {
        let capsule = CapsuleIntersector::new(v(0.0, 0.0), Vec2::X, 10.0, 1.0);
        let (a, b) = (v(5.0, -3.0), v(5.0, 3.0));
        assert!(capsule.does_intersect_edge(a, b));
        let (pos, key) = capsule.compute_collision_pos_on_edge(a, b);
        assert_near(key, 16.0);
        assert_near(pos.x, 5.0);
        assert_near(pos.y, 0.0);
    }

    #[test]
    fn test_capsule_corner_contact() {
        let capsule = CapsuleIntersector::new(v(0.0, 0.0), Vec2::X, 10.0, 1.0);
        // Edge ending at (5, 0.6): touched by the front of the disk at travel 5 - 0.8
        let (a, b) = (v(5.0, 0.6), v(5.0, 3.0));
        let (pos, key) = capsule.compute_collision_pos_on_edge(a, b);
        assert_near(key.sqrt(), 4.2);
        assert_near(pos.y, 0.6);
    }

    #[test]
    fn test_capsule_slanted_edge() {
        let capsule = CapsuleIntersector::new(v(0.0, 0.0), Vec2::X, 10.0, 1.0);
        // Line x + y = 6: the disk touches it when its center is at sqrt(2) from it
        let (a, b) = (v(6.0, 0.0), v(3.0, 3.0));
        let (_, key) = capsule.compute_collision_pos_on_edge(a, b);
        assert_near(key.sqrt(), 6.0 - 2.0f32.sqrt());
    }

    #[test]
    fn test_capsule_start_overlap() {
        let capsule = CapsuleIntersector::new(v(0.0, 0.0), Vec2::X, 5.0, 0.5);
        let (a, b) = (v(-10.0, -0.1), v(10.0, -0.1));
        assert!(capsule.does_intersect_edge(a, b));
        assert_eq!(capsule.compute_collision_pos_on_edge(a, b).1, 0.0);

        // Without any extent on the right the wall below is ignored
        let narrowed = capsule.with_cross_section(0.0, 0.5);
        assert!(!narrowed.does_intersect_edge(a, b));
    }

    #[test]
    fn test_capsule_edge_test_matches_cross_section_capsule() {
        let mut rng = fastrand::Rng::with_seed(5);
        let start = v(1.0, -2.0);
        let dir = Vec2::new(0.6, 0.8);
        let capsule = CapsuleIntersector::new(start, dir, 8.0, 1.2).with_cross_section(0.4, 1.2);
        let mut hits = 0;
        for _ in 0..500 {
            let a = v(rng.f32() * 16.0 - 6.0, rng.f32() * 16.0 - 8.0);
            let b = v(rng.f32() * 16.0 - 6.0, rng.f32() * 16.0 - 8.0);
            let expected =
                segment_vs_cross_section_capsule_2d(a, b, start, dir, 8.0, 1.2, 0.4, 1.2);
            assert_eq!(capsule.does_intersect_edge(a, b), expected, "edge {:?} {:?}", a, b);
            hits += usize::from(expected);
        }
        assert!(hits > 0);
    }

    #[test]
    fn test_capsule_cost_is_a_lower_bound() {
        let capsule = CapsuleIntersector::new(v(0.0, 0.0), Vec2::new(1.0, 0.3), 20.0, 0.7);
        let triangle = [v(6.0, 1.0), v(9.0, 2.5), v(7.0, 4.0)];
        let cost = capsule.compute_triangle_cost(triangle[0], triangle[1], triangle[2]);
        for i in 0..3 {
            let (a, b) = (triangle[i], triangle[(i + 1) % 3]);
            if capsule.does_intersect_edge(a, b) {
                assert!(cost <= capsule.compute_collision_pos_on_edge(a, b).1 + 1e-4);
            }
        }
    }

    #[test]
    fn test_segment_contact() {
        let segment = SegmentIntersector::new(v(0.0, 0.0), Vec2::X, 10.0, 1.0);
        let (right, left) = segment.start_segment();
        assert_near(right.y, -1.0);
        assert_near(left.y, 1.0);

        // Slanted edge entering the swept box at its left side
        let (a, b) = (v(3.0, 3.0), v(6.0, 0.0));
        assert!(segment.does_intersect_edge(a, b));
        let (pos, key) = segment.compute_collision_pos_on_edge(a, b);
        assert_near(key.sqrt(), 5.0);
        assert_near(pos.y, 1.0);

        assert!(!segment.does_intersect_edge(v(3.0, 1.5), v(6.0, 1.5)));
    }

    #[test]
    fn test_static_disk() {
        let disk = StaticDiskIntersector::new(v(0.0, 0.0), 2.0);
        assert!(disk.does_intersect_edge(v(-5.0, 1.5), v(5.0, 1.5)));
        assert!(!disk.does_intersect_edge(v(-5.0, 2.5), v(5.0, 2.5)));
        let (pos, key) = disk.compute_collision_pos_on_edge(v(-5.0, 1.5), v(5.0, 1.5));
        assert_near(key, 2.25);
        assert_near(pos.x, 0.0);
    }
}
