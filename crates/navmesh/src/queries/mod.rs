//! Query objects passed to the [`NavMeshQueryServer`](crate::NavMeshQueryServer)
//!
//! A query holds its inputs and, once processed, its outputs. `get_result()` only
//! classifies the outputs, it never runs new logic. Element references kept in outputs are
//! safe pointers so a query can be stored across frames.

mod box_obstacle;
mod can_go;
mod cast;
mod disk;
mod position;

pub use box_obstacle::{
    NavFloorsFromBoxObstacleQuery, NavFloorsFromBoxObstacleQueryResult, TrianglesFromBoxObstacleQuery,
    TrianglesFromBoxObstacleQueryResult,
};
pub(crate) use can_go::segment_ends;
pub use can_go::{
    CanGoQueryResult, DiskCanGoQuery, DiskCanGoQueryResult, RayCanGoQuery, RayCanGoQueryResult,
    SegmentCanGoQuery, SegmentCanGoQueryResult,
};
pub(crate) use cast::CastOutput;
pub use cast::{
    CastQueryResult, DiskCastQuery, DiskCastQueryResult, RayCastQuery, RayCastQueryResult,
    SegmentCastQuery, SegmentCastQueryResult,
};
pub use disk::{
    DiskCollisionQuery, DiskCollisionQueryResult, DiskExpansionQuery, DiskExpansionQueryResult,
};
pub use position::{
    InsidePosFromOutsidePosQuery, InsidePosFromOutsidePosQueryResult,
    NearestObstacleHalfEdgeFromPosQuery, NearestObstacleHalfEdgeFromPosQueryResult,
    NearestTriangleFromPosQuery, NearestTriangleFromPosQueryResult, NearestTriangleFromPosQueryType,
    TrianglesFromPosQuery, TrianglesFromPosQueryResult, TrianglesFromPosQueryType,
};

use crate::nav_mesh_types::{is_terrain_type_compliant, NavTerrainTypeMask};
use crate::nav_safe_ptr::NavTriangleSafePtr;

/// Default vertical range used to find the triangle under a position
pub const DEFAULT_SEARCH_RANGE: f32 = 1.0;
/// Default distance kept between a cast arrival position and the obstacle it hit
pub const DEFAULT_SAFETY_DIST: f32 = 0.01;

/// Asks the server to record the triangles visited by a query.
///
/// When enabled, the triangles are available in visit order through
/// [`NavMeshQueryServer::propagation_triangles`](crate::NavMeshQueryServer::propagation_triangles)
/// until the next query, and `count` holds their number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropagationQueryMemory {
    pub enabled: bool,
    pub count: usize,
}

impl PropagationQueryMemory {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            count: 0,
        }
    }
}

/// How a start (or center, or destination) triangle compares with the query mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriangleStatus {
    Outside,
    Forbidden,
    Allowed,
}

pub(crate) fn triangle_status(
    triangle: Option<&NavTriangleSafePtr>,
    mask: NavTerrainTypeMask,
) -> TriangleStatus {
    match triangle {
        None => TriangleStatus::Outside,
        Some(triangle) if !is_terrain_type_compliant(mask, triangle.terrain_type()) => {
            TriangleStatus::Forbidden
        }
        Some(_) => TriangleStatus::Allowed,
    }
}
