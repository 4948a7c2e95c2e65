use navmesh_common::{Vec2, Vec3};

use crate::nav_mesh_types::{NavTerrainTypeMask, NAV_TERRAIN_TYPE_MASK_ALL};
use crate::nav_safe_ptr::{NavHalfEdgeSafePtr, NavTriangleSafePtr};

use super::{
    triangle_status, PropagationQueryMemory, TriangleStatus, DEFAULT_SAFETY_DIST,
    DEFAULT_SEARCH_RANGE,
};

/// Outcome of a ray, disk or segment Cast query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastQueryResult {
    /// The shape travelled `max_dist` without collision
    MaxDistReached,
    StartOutside,
    StartMaterialForbidden,
    /// The shape collides at its start position, or moving back from the collision leaves
    /// it there
    CannotMove,
    /// The arrival position lies in a triangle
    ArrivalPosFound,
    /// Moving back from the collision ended outside of the mesh
    ArrivalError,
}

pub type RayCastQueryResult = CastQueryResult;
pub type DiskCastQueryResult = CastQueryResult;
pub type SegmentCastQueryResult = CastQueryResult;

/// Outputs shared by the three cast queries
#[derive(Debug, Clone, Default)]
pub(crate) struct CastOutput {
    pub reach_max_dist: bool,
    pub arrival_pos: Vec3,
    pub arrival_triangle: Option<NavTriangleSafePtr>,
    pub collision_pos: Vec3,
    pub intersected_half_edge: Option<NavHalfEdgeSafePtr>,
    pub consistent_result: bool,
}

fn cast_result(
    reach_max_dist: bool,
    start_pos: Vec3,
    start: Option<&NavTriangleSafePtr>,
    mask: NavTerrainTypeMask,
    arrival_pos: Vec3,
    arrival: Option<&NavTriangleSafePtr>,
) -> CastQueryResult {
    if reach_max_dist {
        return CastQueryResult::MaxDistReached;
    }
    match triangle_status(start, mask) {
        TriangleStatus::Outside => return CastQueryResult::StartOutside,
        TriangleStatus::Forbidden => return CastQueryResult::StartMaterialForbidden,
        TriangleStatus::Allowed => {}
    }
    if start_pos.x == arrival_pos.x && start_pos.y == arrival_pos.y {
        return CastQueryResult::CannotMove;
    }
    if arrival.is_some() {
        CastQueryResult::ArrivalPosFound
    } else {
        CastQueryResult::ArrivalError
    }
}

macro_rules! impl_cast_output {
    ($query:ty) => {
        impl $query {
            pub fn with_start_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
                self.start_triangle = Some(triangle);
                self
            }

            pub fn clean_output(&mut self) {
                self.reach_max_dist = false;
                self.consistent_result = false;
                self.arrival_pos = Vec3::ZERO;
                self.arrival_triangle = None;
                self.collision_pos = Vec3::ZERO;
                self.intersected_half_edge = None;
                self.memory.count = 0;
            }

            pub fn clear(&mut self) {
                *self = Self {
                    memory: PropagationQueryMemory {
                        count: 0,
                        ..self.memory
                    },
                    ..Self::default()
                };
            }

            pub fn get_result(&self) -> CastQueryResult {
                cast_result(
                    self.reach_max_dist,
                    self.start_pos,
                    self.start_triangle.as_ref(),
                    self.terrain_type_mask,
                    self.arrival_pos,
                    self.arrival_triangle.as_ref(),
                )
            }

            pub(crate) fn set_output(&mut self, output: CastOutput) {
                self.reach_max_dist = output.reach_max_dist;
                self.arrival_pos = output.arrival_pos;
                self.arrival_triangle = output.arrival_triangle;
                self.collision_pos = output.collision_pos;
                self.intersected_half_edge = output.intersected_half_edge;
                self.consistent_result = output.consistent_result;
            }
        }
    };
}

/// Casts a zero-width segment from `start_pos` along `normalized_dir_2d`.
///
/// Without collision the arrival is `max_dist` away. Otherwise it is the collision moved
/// back by `safety_dist` along the direction.
#[derive(Debug, Clone)]
pub struct RayCastQuery {
    pub start_pos: Vec3,
    pub start_triangle: Option<NavTriangleSafePtr>,
    pub normalized_dir_2d: Vec2,
    pub max_dist: f32,
    pub safety_dist: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,

    pub reach_max_dist: bool,
    pub arrival_pos: Vec3,
    /// Triangle holding `arrival_pos`, if any
    pub arrival_triangle: Option<NavTriangleSafePtr>,
    pub collision_pos: Vec3,
    pub intersected_half_edge: Option<NavHalfEdgeSafePtr>,
    /// False when the arrival triangle had to be searched outside the visited triangles
    pub consistent_result: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for RayCastQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec2::ZERO, 0.0)
    }
}

impl RayCastQuery {
    pub fn new(start_pos: Vec3, normalized_dir_2d: Vec2, max_dist: f32) -> Self {
        Self {
            start_pos,
            start_triangle: None,
            normalized_dir_2d,
            max_dist,
            safety_dist: DEFAULT_SAFETY_DIST,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            reach_max_dist: false,
            arrival_pos: Vec3::ZERO,
            arrival_triangle: None,
            collision_pos: Vec3::ZERO,
            intersected_half_edge: None,
            consistent_result: false,
            memory: PropagationQueryMemory::default(),
        }
    }
}

impl_cast_output!(RayCastQuery);

/// Casts a disk of `radius` from `start_pos` along `normalized_dir_2d`.
///
/// See [`DiskCanGoQuery`](super::DiskCanGoQuery) for the start position adaptation.
#[derive(Debug, Clone)]
pub struct DiskCastQuery {
    pub start_pos: Vec3,
    pub start_triangle: Option<NavTriangleSafePtr>,
    pub normalized_dir_2d: Vec2,
    pub radius: f32,
    pub max_dist: f32,
    pub safety_dist: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,
    pub adapt_query_to_start_position: bool,

    pub reach_max_dist: bool,
    pub arrival_pos: Vec3,
    pub arrival_triangle: Option<NavTriangleSafePtr>,
    pub collision_pos: Vec3,
    pub intersected_half_edge: Option<NavHalfEdgeSafePtr>,
    pub consistent_result: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for DiskCastQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, Vec2::ZERO, 0.0)
    }
}

impl DiskCastQuery {
    pub fn new(start_pos: Vec3, radius: f32, normalized_dir_2d: Vec2, max_dist: f32) -> Self {
        Self {
            start_pos,
            start_triangle: None,
            normalized_dir_2d,
            radius,
            max_dist,
            safety_dist: DEFAULT_SAFETY_DIST,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            adapt_query_to_start_position: true,
            reach_max_dist: false,
            arrival_pos: Vec3::ZERO,
            arrival_triangle: None,
            collision_pos: Vec3::ZERO,
            intersected_half_edge: None,
            consistent_result: false,
            memory: PropagationQueryMemory::default(),
        }
    }
}

impl_cast_output!(DiskCastQuery);

/// Casts a segment of half width `radius`, orthogonal to `normalized_dir_2d`.
///
/// `start_a` is the end on the left of the motion, `start_b` the end on its right.
#[derive(Debug, Clone)]
pub struct SegmentCastQuery {
    pub start_pos: Vec3,
    pub start_triangle: Option<NavTriangleSafePtr>,
    pub normalized_dir_2d: Vec2,
    pub radius: f32,
    pub max_dist: f32,
    pub safety_dist: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,

    pub start_a: Vec3,
    pub start_b: Vec3,
    pub reach_max_dist: bool,
    pub arrival_pos: Vec3,
    pub arrival_triangle: Option<NavTriangleSafePtr>,
    pub collision_pos: Vec3,
    pub intersected_half_edge: Option<NavHalfEdgeSafePtr>,
    pub consistent_result: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for SegmentCastQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, Vec2::ZERO, 0.0)
    }
}

impl SegmentCastQuery {
    pub fn new(start_pos: Vec3, radius: f32, normalized_dir_2d: Vec2, max_dist: f32) -> Self {
        let ortho = Vec2::new(-normalized_dir_2d.y, normalized_dir_2d.x) * radius;
        Self {
            start_pos,
            start_triangle: None,
            normalized_dir_2d,
            radius,
            max_dist,
            safety_dist: DEFAULT_SAFETY_DIST,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            start_a: Vec3::new(start_pos.x + ortho.x, start_pos.y + ortho.y, start_pos.z),
            start_b: Vec3::new(start_pos.x - ortho.x, start_pos.y - ortho.y, start_pos.z),
            reach_max_dist: false,
            arrival_pos: Vec3::ZERO,
            arrival_triangle: None,
            collision_pos: Vec3::ZERO,
            intersected_half_edge: None,
            consistent_result: false,
            memory: PropagationQueryMemory::default(),
        }
    }
}

impl_cast_output!(SegmentCastQuery);
