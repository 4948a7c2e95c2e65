use navmesh_common::Vec3;

use crate::nav_safe_ptr::{NavHalfEdgeSafePtr, NavTriangleSafePtr};

use super::DEFAULT_SEARCH_RANGE;

/// Default half width of the search box of the obstacle queries
pub const DEFAULT_HORIZONTAL_SEARCH_RANGE: f32 = 2.0;
/// Default distance kept from the border by [`InsidePosFromOutsidePosQuery`]
pub const DEFAULT_DIST_FROM_OBSTACLE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NearestTriangleFromPosQueryType {
    /// Nearest triangle above or below the position
    #[default]
    Nearest,
    NearestBelow,
    NearestAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearestTriangleFromPosQueryResult {
    PointOutside,
    TriangleFound,
}

/// Finds the triangle under (or over) a position, within `search_range` vertically
#[derive(Debug, Clone)]
pub struct NearestTriangleFromPosQuery {
    pub pos: Vec3,
    /// Added to the altitude of `pos` before searching
    pub bias_in_altitude: f32,
    pub search_range: f32,
    pub query_type: NearestTriangleFromPosQueryType,

    pub triangle: Option<NavTriangleSafePtr>,
    /// Altitude of the triangle at `pos` minus the biased altitude of `pos`
    pub relative_altitude: f32,
}

impl Default for NearestTriangleFromPosQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl NearestTriangleFromPosQuery {
    pub fn new(pos: Vec3) -> Self {
        Self {
            pos,
            bias_in_altitude: 0.0,
            search_range: DEFAULT_SEARCH_RANGE,
            query_type: NearestTriangleFromPosQueryType::Nearest,
            triangle: None,
            relative_altitude: f32::MAX,
        }
    }

    pub fn with_search_range(mut self, search_range: f32) -> Self {
        self.search_range = search_range.abs();
        self
    }

    pub fn with_type(mut self, query_type: NearestTriangleFromPosQueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clean_output(&mut self) {
        self.triangle = None;
        self.relative_altitude = f32::MAX;
    }

    pub fn get_result(&self) -> NearestTriangleFromPosQueryResult {
        match self.triangle {
            Some(_) => NearestTriangleFromPosQueryResult::TriangleFound,
            None => NearestTriangleFromPosQueryResult::PointOutside,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrianglesFromPosQueryType {
    /// Every triangle at the X,Y of the position
    #[default]
    All,
    AllBelow,
    AllAbove,
    /// The first triangle above and the first one below
    NearestAboveAndBelow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrianglesFromPosQueryResult {
    PointOutside,
    TrianglesFound,
}

/// Lists the triangles at the X,Y of a position.
///
/// The triangles are written to the result memory of the query buffer, readable through
/// [`NavMeshQueryServer::result_triangles`](crate::NavMeshQueryServer::result_triangles).
#[derive(Debug, Clone, Default)]
pub struct TrianglesFromPosQuery {
    pub pos: Vec3,
    pub bias_in_altitude: f32,
    pub query_type: TrianglesFromPosQueryType,

    pub triangle_count: usize,
}

impl TrianglesFromPosQuery {
    pub fn new(pos: Vec3, query_type: TrianglesFromPosQueryType) -> Self {
        Self {
            pos,
            bias_in_altitude: 0.0,
            query_type,
            triangle_count: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clean_output(&mut self) {
        self.triangle_count = 0;
    }

    pub fn get_result(&self) -> TrianglesFromPosQueryResult {
        if self.triangle_count == 0 {
            TrianglesFromPosQueryResult::PointOutside
        } else {
            TrianglesFromPosQueryResult::TrianglesFound
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearestObstacleHalfEdgeFromPosQueryResult {
    HalfEdgeNotFound,
    HalfEdgeFound,
}

/// Finds the mesh border nearest to a position, inside or outside of the mesh.
///
/// Only the triangles within a box of half width `horizontal_search_range` and half height
/// `vertical_search_range` around the biased position are considered.
#[derive(Debug, Clone)]
pub struct NearestObstacleHalfEdgeFromPosQuery {
    pub pos: Vec3,
    pub bias_in_altitude: f32,
    pub horizontal_search_range: f32,
    pub vertical_search_range: f32,

    pub nearest_half_edge: Option<NavHalfEdgeSafePtr>,
    pub next_half_edge_on_obstacle: Option<NavHalfEdgeSafePtr>,
    pub prev_half_edge_on_obstacle: Option<NavHalfEdgeSafePtr>,
    pub nearest_point_on_half_edge: Vec3,
    pub square_dist_from_half_edge: f32,
}

impl Default for NearestObstacleHalfEdgeFromPosQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl NearestObstacleHalfEdgeFromPosQuery {
    pub fn new(pos: Vec3) -> Self {
        Self {
            pos,
            bias_in_altitude: 0.0,
            horizontal_search_range: DEFAULT_HORIZONTAL_SEARCH_RANGE,
            vertical_search_range: DEFAULT_SEARCH_RANGE,
            nearest_half_edge: None,
            next_half_edge_on_obstacle: None,
            prev_half_edge_on_obstacle: None,
            nearest_point_on_half_edge: Vec3::splat(f32::MAX),
            square_dist_from_half_edge: f32::MAX,
        }
    }

    pub fn with_search_ranges(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_search_range = horizontal.abs();
        self.vertical_search_range = vertical.abs();
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clean_output(&mut self) {
        self.nearest_half_edge = None;
        self.next_half_edge_on_obstacle = None;
        self.prev_half_edge_on_obstacle = None;
        self.nearest_point_on_half_edge = Vec3::splat(f32::MAX);
        self.square_dist_from_half_edge = f32::MAX;
    }

    pub fn get_result(&self) -> NearestObstacleHalfEdgeFromPosQueryResult {
        match self.nearest_half_edge {
            Some(_) => NearestObstacleHalfEdgeFromPosQueryResult::HalfEdgeFound,
            None => NearestObstacleHalfEdgeFromPosQueryResult::HalfEdgeNotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsidePosFromOutsidePosQueryResult {
    PosNotFound,
    PosFound,
}

/// Finds a position on the mesh near `pos`, `dist_from_obstacle` inside the nearest border.
///
/// Narrow geometry may force the result closer to the border than `dist_from_obstacle`.
#[derive(Debug, Clone)]
pub struct InsidePosFromOutsidePosQuery {
    pub pos: Vec3,
    pub bias_in_altitude: f32,
    pub horizontal_search_range: f32,
    pub vertical_search_range: f32,
    pub dist_from_obstacle: f32,

    pub inside_pos: Vec3,
    /// Triangle holding `inside_pos`
    pub triangle: Option<NavTriangleSafePtr>,
}

impl Default for InsidePosFromOutsidePosQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl InsidePosFromOutsidePosQuery {
    pub fn new(pos: Vec3) -> Self {
        Self {
            pos,
            bias_in_altitude: 0.0,
            horizontal_search_range: DEFAULT_HORIZONTAL_SEARCH_RANGE,
            vertical_search_range: DEFAULT_SEARCH_RANGE,
            dist_from_obstacle: DEFAULT_DIST_FROM_OBSTACLE,
            inside_pos: Vec3::splat(f32::MAX),
            triangle: None,
        }
    }

    pub fn with_search_ranges(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_search_range = horizontal.abs();
        self.vertical_search_range = vertical.abs();
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clean_output(&mut self) {
        self.inside_pos = Vec3::splat(f32::MAX);
        self.triangle = None;
    }

    pub fn get_result(&self) -> InsidePosFromOutsidePosQueryResult {
        match self.triangle {
            Some(_) => InsidePosFromOutsidePosQueryResult::PosFound,
            None => InsidePosFromOutsidePosQueryResult::PosNotFound,
        }
    }
}
