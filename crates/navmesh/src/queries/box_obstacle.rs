use navmesh_common::BoxObstacle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrianglesFromBoxObstacleQueryResult {
    BoxOutside,
    TrianglesFound,
}

/// Lists the triangles overlapping an oriented box.
///
/// The search volume is the box extended by `tolerance_below` under its bottom face and
/// `tolerance_above` over its top face. The triangles are written to the result memory of
/// the query buffer.
#[derive(Debug, Clone, Default)]
pub struct TrianglesFromBoxObstacleQuery {
    pub obstacle: BoxObstacle,
    pub tolerance_below: f32,
    pub tolerance_above: f32,

    pub triangle_count: usize,
}

impl TrianglesFromBoxObstacleQuery {
    pub fn new(obstacle: BoxObstacle, tolerance_below: f32, tolerance_above: f32) -> Self {
        Self {
            obstacle,
            tolerance_below,
            tolerance_above,
            triangle_count: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clean_output(&mut self) {
        self.triangle_count = 0;
    }

    pub fn get_result(&self) -> TrianglesFromBoxObstacleQueryResult {
        if self.triangle_count == 0 {
            TrianglesFromBoxObstacleQueryResult::BoxOutside
        } else {
            TrianglesFromBoxObstacleQueryResult::TrianglesFound
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavFloorsFromBoxObstacleQueryResult {
    BoxOutside,
    Found,
}

/// Lists the floors holding at least one triangle overlapping an oriented box.
///
/// Same search volume as [`TrianglesFromBoxObstacleQuery`]; the floors are written to the
/// result memory of the query buffer.
#[derive(Debug, Clone, Default)]
pub struct NavFloorsFromBoxObstacleQuery {
    pub obstacle: BoxObstacle,
    pub tolerance_below: f32,
    pub tolerance_above: f32,

    pub floor_count: usize,
}

impl NavFloorsFromBoxObstacleQuery {
    pub fn new(obstacle: BoxObstacle, tolerance_below: f32, tolerance_above: f32) -> Self {
        Self {
            obstacle,
            tolerance_below,
            tolerance_above,
            floor_count: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clean_output(&mut self) {
        self.floor_count = 0;
    }

    pub fn get_result(&self) -> NavFloorsFromBoxObstacleQueryResult {
        if self.floor_count == 0 {
            NavFloorsFromBoxObstacleQueryResult::BoxOutside
        } else {
            NavFloorsFromBoxObstacleQueryResult::Found
        }
    }
}
