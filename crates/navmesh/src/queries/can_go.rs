use navmesh_common::{Vec2, Vec3};

use crate::nav_mesh_types::{NavTerrainTypeMask, NAV_TERRAIN_TYPE_MASK_ALL};
use crate::nav_safe_ptr::NavTriangleSafePtr;

use super::{triangle_status, PropagationQueryMemory, TriangleStatus, DEFAULT_SEARCH_RANGE};

/// Outcome of a ray, disk or segment CanGo query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanGoQueryResult {
    /// The shape goes from the start to the destination without collision
    Success,
    /// No triangle under the start position
    StartOutside,
    /// The start triangle terrain type is excluded by the mask
    StartMaterialForbidden,
    /// No triangle under the destination
    DestOutside,
    /// The destination triangle terrain type is excluded by the mask
    DestMaterialForbidden,
    /// The shape hits a border or a forbidden floor on the way
    Collision,
    /// Nothing above applies, the destination usually lies on another floor
    WrongFloor,
}

pub type RayCanGoQueryResult = CanGoQueryResult;
pub type DiskCanGoQueryResult = CanGoQueryResult;
pub type SegmentCanGoQueryResult = CanGoQueryResult;

fn can_go_result(
    can_go: bool,
    collision: bool,
    start: Option<&NavTriangleSafePtr>,
    dest: Option<&NavTriangleSafePtr>,
    mask: NavTerrainTypeMask,
) -> CanGoQueryResult {
    if can_go {
        return CanGoQueryResult::Success;
    }
    match triangle_status(start, mask) {
        TriangleStatus::Outside => return CanGoQueryResult::StartOutside,
        TriangleStatus::Forbidden => return CanGoQueryResult::StartMaterialForbidden,
        TriangleStatus::Allowed => {}
    }
    match triangle_status(dest, mask) {
        TriangleStatus::Outside => return CanGoQueryResult::DestOutside,
        TriangleStatus::Forbidden => return CanGoQueryResult::DestMaterialForbidden,
        TriangleStatus::Allowed => {}
    }
    if collision {
        CanGoQueryResult::Collision
    } else {
        CanGoQueryResult::WrongFloor
    }
}

/// Tests whether a zero-width segment from `start_pos` to `dest_pos` stays on the mesh
#[derive(Debug, Clone)]
pub struct RayCanGoQuery {
    pub start_pos: Vec3,
    /// Used instead of a lookup when it still resolves; written back by the server
    pub start_triangle: Option<NavTriangleSafePtr>,
    pub dest_pos: Vec3,
    pub dest_triangle: Option<NavTriangleSafePtr>,
    pub terrain_type_mask: NavTerrainTypeMask,
    /// Vertical range used to find the start and destination triangles
    pub search_range: f32,

    pub can_go: bool,
    pub collision: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for RayCanGoQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}

impl RayCanGoQuery {
    pub fn new(start_pos: Vec3, dest_pos: Vec3) -> Self {
        Self {
            start_pos,
            start_triangle: None,
            dest_pos,
            dest_triangle: None,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            can_go: false,
            collision: true,
            memory: PropagationQueryMemory::default(),
        }
    }

    pub fn with_start_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.start_triangle = Some(triangle);
        self
    }

    pub fn with_dest_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.dest_triangle = Some(triangle);
        self
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

    pub fn clean_output(&mut self) {
        self.can_go = false;
        self.collision = true;
        self.memory.count = 0;
    }

    pub fn get_result(&self) -> RayCanGoQueryResult {
        can_go_result(
            self.can_go,
            self.collision,
            self.start_triangle.as_ref(),
            self.dest_triangle.as_ref(),
            self.terrain_type_mask,
        )
    }
}

/// Tests whether a disk of `radius` can move in a straight line from `start_pos` to `dest_pos`.
///
/// When `adapt_query_to_start_position` is set and the disk already touches a border at
/// the start, its extent on each side is reduced to the free space measured by two rays
/// cast orthogonally to the motion. Such a disk may miss obstacles that only intrude in
/// the removed part.
#[derive(Debug, Clone)]
pub struct DiskCanGoQuery {
    pub start_pos: Vec3,
    pub start_triangle: Option<NavTriangleSafePtr>,
    pub dest_pos: Vec3,
    pub dest_triangle: Option<NavTriangleSafePtr>,
    pub radius: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,
    pub adapt_query_to_start_position: bool,

    pub can_go: bool,
    pub collision: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for DiskCanGoQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, 0.0)
    }
}

impl DiskCanGoQuery {
    pub fn new(start_pos: Vec3, dest_pos: Vec3, radius: f32) -> Self {
        Self {
            start_pos,
            start_triangle: None,
            dest_pos,
            dest_triangle: None,
            radius,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            adapt_query_to_start_position: true,
            can_go: false,
            collision: true,
            memory: PropagationQueryMemory::default(),
        }
    }

    pub fn with_start_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.start_triangle = Some(triangle);
        self
    }

    pub fn with_dest_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.dest_triangle = Some(triangle);
        self
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

    pub fn clean_output(&mut self) {
        self.can_go = false;
        self.collision = true;
        self.memory.count = 0;
    }

    pub fn get_result(&self) -> DiskCanGoQueryResult {
        can_go_result(
            self.can_go,
            self.collision,
            self.start_triangle.as_ref(),
            self.dest_triangle.as_ref(),
            self.terrain_type_mask,
        )
    }
}

/// Tests whether a segment orthogonal to the motion, of half width `radius`, can move from
/// `start_pos` to `dest_pos`.
///
/// `start_a` is the end on the left of the motion, `start_b` the end on its right.
#[derive(Debug, Clone)]
pub struct SegmentCanGoQuery {
    pub start_pos: Vec3,
    pub start_triangle: Option<NavTriangleSafePtr>,
    pub dest_pos: Vec3,
    pub dest_triangle: Option<NavTriangleSafePtr>,
    pub radius: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,

    pub start_a: Vec3,
    pub start_b: Vec3,
    pub can_go: bool,
    pub collision: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for SegmentCanGoQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, 0.0)
    }
}

impl SegmentCanGoQuery {
    pub fn new(start_pos: Vec3, dest_pos: Vec3, radius: f32) -> Self {
        let (start_a, start_b) = segment_ends(start_pos, dest_pos, radius);
        Self {
            start_pos,
            start_triangle: None,
            dest_pos,
            dest_triangle: None,
            radius,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            start_a,
            start_b,
            can_go: false,
            collision: true,
            memory: PropagationQueryMemory::default(),
        }
    }

    pub fn with_start_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.start_triangle = Some(triangle);
        self
    }

    pub fn with_dest_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.dest_triangle = Some(triangle);
        self
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

    pub fn clean_output(&mut self) {
        self.can_go = false;
        self.collision = true;
        self.memory.count = 0;
    }

    pub fn get_result(&self) -> SegmentCanGoQueryResult {
        can_go_result(
            self.can_go,
            self.collision,
            self.start_triangle.as_ref(),
            self.dest_triangle.as_ref(),
            self.terrain_type_mask,
        )
    }
}

/// Left and right ends of a segment of half width `radius` centered on `start` and
/// orthogonal to the motion toward `dest`
pub(crate) fn segment_ends(start: Vec3, dest: Vec3, radius: f32) -> (Vec3, Vec3) {
    let dir = Vec2::new(dest.x - start.x, dest.y - start.y).normalize_or_zero();
    let ortho = Vec2::new(-dir.y, dir.x) * radius;
    (
        Vec3::new(start.x + ortho.x, start.y + ortho.y, start.z),
        Vec3::new(start.x - ortho.x, start.y - ortho.y, start.z),
    )
}
