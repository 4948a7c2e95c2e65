use navmesh_common::Vec3;

use crate::nav_mesh_types::{NavTerrainTypeMask, NAV_TERRAIN_TYPE_MASK_ALL};
use crate::nav_safe_ptr::{NavHalfEdgeSafePtr, NavTriangleSafePtr};

use super::{
    triangle_status, PropagationQueryMemory, TriangleStatus, DEFAULT_SAFETY_DIST,
    DEFAULT_SEARCH_RANGE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskCollisionQueryResult {
    /// The disk lies entirely on navigable floors
    Fit,
    CenterOutside,
    CenterMaterialForbidden,
    /// The disk touches a border or a forbidden floor
    DoesNotFit,
}

/// Tests whether a static disk fits on the mesh
#[derive(Debug, Clone)]
pub struct DiskCollisionQuery {
    pub center: Vec3,
    pub center_triangle: Option<NavTriangleSafePtr>,
    pub radius: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,

    pub collision: bool,
    pub memory: PropagationQueryMemory,
}

impl Default for DiskCollisionQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl DiskCollisionQuery {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            center_triangle: None,
            radius,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            collision: true,
            memory: PropagationQueryMemory::default(),
        }
    }

    pub fn with_center_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.center_triangle = Some(triangle);
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
        self.collision = true;
        self.memory.count = 0;
    }

    pub fn get_result(&self) -> DiskCollisionQueryResult {
        match triangle_status(self.center_triangle.as_ref(), self.terrain_type_mask) {
            TriangleStatus::Outside => DiskCollisionQueryResult::CenterOutside,
            TriangleStatus::Forbidden => DiskCollisionQueryResult::CenterMaterialForbidden,
            TriangleStatus::Allowed if self.collision => DiskCollisionQueryResult::DoesNotFit,
            TriangleStatus::Allowed => DiskCollisionQueryResult::Fit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskExpansionQueryResult {
    /// The disk fits even at `radius_max`
    Fit,
    CenterOutside,
    CenterMaterialForbidden,
    /// The center lies on the mesh but no disk fits around it
    CannotExpand,
    /// The disk stopped growing on a border before `radius_max`
    CollisionFound,
}

/// Grows a disk around `center` until it touches a border or reaches `radius_max`.
///
/// `result_radius` is the distance to the nearest contact minus `safety_dist`, clamped at 0.
#[derive(Debug, Clone)]
pub struct DiskExpansionQuery {
    pub center: Vec3,
    pub center_triangle: Option<NavTriangleSafePtr>,
    pub radius_max: f32,
    pub safety_dist: f32,
    pub terrain_type_mask: NavTerrainTypeMask,
    pub search_range: f32,

    pub collision: bool,
    pub collision_pos: Vec3,
    pub intersected_half_edge: Option<NavHalfEdgeSafePtr>,
    pub result_radius: f32,
    pub memory: PropagationQueryMemory,
}

impl Default for DiskExpansionQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl DiskExpansionQuery {
    pub fn new(center: Vec3, radius_max: f32) -> Self {
        Self {
            center,
            center_triangle: None,
            radius_max,
            safety_dist: DEFAULT_SAFETY_DIST,
            terrain_type_mask: NAV_TERRAIN_TYPE_MASK_ALL,
            search_range: DEFAULT_SEARCH_RANGE,
            collision: true,
            collision_pos: Vec3::ZERO,
            intersected_half_edge: None,
            result_radius: 0.0,
            memory: PropagationQueryMemory::default(),
        }
    }

    pub fn with_center_triangle(mut self, triangle: NavTriangleSafePtr) -> Self {
        self.center_triangle = Some(triangle);
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
        self.collision = true;
        self.collision_pos = Vec3::ZERO;
        self.intersected_half_edge = None;
        self.result_radius = 0.0;
        self.memory.count = 0;
    }

    pub fn get_result(&self) -> DiskExpansionQueryResult {
        match triangle_status(self.center_triangle.as_ref(), self.terrain_type_mask) {
            TriangleStatus::Outside => return DiskExpansionQueryResult::CenterOutside,
            TriangleStatus::Forbidden => return DiskExpansionQueryResult::CenterMaterialForbidden,
            TriangleStatus::Allowed => {}
        }
        if !self.collision {
            DiskExpansionQueryResult::Fit
        } else if self.result_radius == 0.0 {
            DiskExpansionQueryResult::CannotExpand
        } else {
            DiskExpansionQueryResult::CollisionFound
        }
    }
}
