use navmesh_common::{
    closest_point_on_segment_2d, perp_ccw, square_distance_2d, to_2d, Box2f, BoxObstacle, Vec2,
    Vec3,
};

use crate::containers::FixedArray;
use crate::intersections::{aabb_vs_aabb_2d, aabb_vs_box_obstacle_2d, overlapping_box_obstacle_vs_triangle_3d};
use crate::nav_mesh_manager::NavMeshManager;
use crate::nav_mesh_types::{NavFloorKey, NavTriangleKey, NAV_TERRAIN_TYPE_MASK_ALL};
use crate::nav_ptr::{NavCellPtr, NavFloorPtr, NavHalfEdgePtr, NavTrianglePtr};
use crate::queries::{
    InsidePosFromOutsidePosQuery, NavFloorsFromBoxObstacleQuery, NearestObstacleHalfEdgeFromPosQuery,
    NearestTriangleFromPosQuery, NearestTriangleFromPosQueryType, TrianglesFromBoxObstacleQuery,
    TrianglesFromPosQuery, TrianglesFromPosQueryType,
};
use crate::status::{ContainerResult, QueryServerError, QueryServerResult};

use super::NavMeshQueryServer;

/// Times the distance kept from the border is halved before giving up on an inside position
const INSIDE_POS_ATTEMPTS: u32 = 8;

/// Nearest uncrossable half-edge found around a position
struct ObstacleHit<'m> {
    half_edge: NavHalfEdgePtr<'m>,
    point: Vec3,
    square_dist: f32,
}

impl<'m> NavMeshQueryServer<'m> {
    pub fn nearest_triangle_from_pos(&mut self, query: &mut NearestTriangleFromPosQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let pos = query.pos + Vec3::Z * query.bias_in_altitude;
        if let Some((triangle, relative)) =
            self.find_nearest_triangle(pos, query.search_range, query.query_type)
        {
            query.triangle = Some(triangle.to_safe_ptr());
            query.relative_altitude = relative;
        }
        Ok(())
    }

    /// Lists the triangles at the X,Y of the position into the result memory
    pub fn triangles_from_pos(&mut self, query: &mut TrianglesFromPosQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let pos = query.pos + Vec3::Z * query.bias_in_altitude;
        let manager = self.manager;
        let Some(cell) = manager
            .stitched_cell_at(pos)
            .and_then(|cell| manager.cell_ptr(cell.idx()))
        else {
            return Ok(());
        };

        let mut result = FixedArray::new(&mut self.buffer.result_triangles);
        let outcome = collect_triangles_at(&cell, pos, query.query_type, &mut result);
        let count = result.len();
        self.result_triangle_count = count;
        query.triangle_count = count;
        outcome.map_err(|err| {
            log::debug!("Triangle list stopped at {} triangles: {}", count, err);
            QueryServerError::LackOfResultMemory
        })
    }

    /// Lists the triangles overlapping the box obstacle into the result memory
    pub fn triangles_in_box_obstacle(&mut self, query: &mut TrianglesFromBoxObstacleQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let manager = self.manager;
        let mut result = FixedArray::new(&mut self.buffer.result_triangles);
        let outcome = for_each_floor_under_box(manager, &query.obstacle, query.tolerance_below, query.tolerance_above, |floor| {
            for triangle in floor.triangles() {
                let [v0, v1, v2] = triangle.vertices();
                if overlapping_box_obstacle_vs_triangle_3d(
                    &query.obstacle,
                    v0,
                    v1,
                    v2,
                    query.tolerance_below,
                    query.tolerance_above,
                ) {
                    result.push_back(triangle.key())?;
                }
            }
            Ok(())
        });
        let count = result.len();
        self.result_triangle_count = count;
        query.triangle_count = count;
        outcome.map_err(|err| {
            log::debug!("Box triangle list stopped at {} triangles: {}", count, err);
            QueryServerError::LackOfResultMemory
        })
    }

    /// Lists the floors holding a triangle that overlaps the box obstacle into the result
    /// memory
    pub fn nav_floors_in_box_obstacle(&mut self, query: &mut NavFloorsFromBoxObstacleQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let manager = self.manager;
        let mut result = FixedArray::<NavFloorKey>::new(&mut self.buffer.result_floors);
        let outcome = for_each_floor_under_box(manager, &query.obstacle, query.tolerance_below, query.tolerance_above, |floor| {
            let overlapped = floor.triangles().any(|triangle| {
                let [v0, v1, v2] = triangle.vertices();
                overlapping_box_obstacle_vs_triangle_3d(
                    &query.obstacle,
                    v0,
                    v1,
                    v2,
                    query.tolerance_below,
                    query.tolerance_above,
                )
            });
            if overlapped {
                result.push_back(floor.key())?;
            }
            Ok(())
        });
        let count = result.len();
        self.result_floor_count = count;
        query.floor_count = count;
        outcome.map_err(|err| {
            log::debug!("Box floor list stopped at {} floors: {}", count, err);
            QueryServerError::LackOfResultMemory
        })
    }

    pub fn nearest_obstacle_half_edge_from_pos(
        &mut self,
        query: &mut NearestObstacleHalfEdgeFromPosQuery,
    ) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let pos = query.pos + Vec3::Z * query.bias_in_altitude;
        if let Some(hit) =
            self.find_nearest_obstacle(pos, query.horizontal_search_range, query.vertical_search_range)
        {
            query.nearest_half_edge = Some(hit.half_edge.to_safe_ptr());
            query.next_half_edge_on_obstacle = Some(
                hit.half_edge
                    .next_half_edge_along_obstacle(NAV_TERRAIN_TYPE_MASK_ALL)
                    .to_safe_ptr(),
            );
            query.prev_half_edge_on_obstacle = Some(
                hit.half_edge
                    .prev_half_edge_along_obstacle(NAV_TERRAIN_TYPE_MASK_ALL)
                    .to_safe_ptr(),
            );
            query.nearest_point_on_half_edge = hit.point;
            query.square_dist_from_half_edge = hit.square_dist;
        }
        Ok(())
    }

    /// Moves the position inside the mesh, `dist_from_obstacle` away from the nearest border.
    ///
    /// The distance is halved while the moved position falls outside of the mesh, which
    /// happens in corridors narrower than twice the distance.
    pub fn inside_pos_from_outside_pos(&mut self, query: &mut InsidePosFromOutsidePosQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let pos = query.pos + Vec3::Z * query.bias_in_altitude;
        let Some(hit) =
            self.find_nearest_obstacle(pos, query.horizontal_search_range, query.vertical_search_range)
        else {
            return Ok(());
        };

        let dir = inward_dir(&hit);
        let mut dist = query.dist_from_obstacle;
        for _ in 0..INSIDE_POS_ATTEMPTS {
            let moved = to_2d(hit.point) + dir * dist;
            let candidate = Vec3::new(moved.x, moved.y, hit.point.z);
            if let Some((triangle, relative)) = self.find_nearest_triangle(
                candidate,
                query.vertical_search_range,
                NearestTriangleFromPosQueryType::Nearest,
            ) {
                query.inside_pos = candidate + Vec3::Z * relative;
                query.triangle = Some(triangle.to_safe_ptr());
                return Ok(());
            }
            dist *= 0.5;
        }
        log::debug!("No inside position found near {:?}", pos);
        Ok(())
    }

    /// Uncrossable half-edge nearest to `pos` in the X,Y plane, within `horizontal_range`,
    /// whose nearest point lies within `vertical_range` of `pos`
    fn find_nearest_obstacle(
        &self,
        pos: Vec3,
        horizontal_range: f32,
        vertical_range: f32,
    ) -> Option<ObstacleHit<'m>> {
        let manager = self.manager;
        let search_box = Box2f::new(
            to_2d(pos) - Vec2::splat(horizontal_range),
            to_2d(pos) + Vec2::splat(horizontal_range),
        );
        let max_square_dist = horizontal_range * horizontal_range;

        let mut best: Option<ObstacleHit<'m>> = None;
        for cell_pos in manager.grid().cell_box_of_an_aabbox(&search_box).iter() {
            let Some(cell) = manager
                .stitched_cell(cell_pos)
                .and_then(|cell| manager.cell_ptr(cell.idx()))
            else {
                continue;
            };
            for floor in cell.floors() {
                let aabb = &floor.nav_floor().aabb;
                if !aabb_vs_aabb_2d(&aabb.to_2d(), &search_box)
                    || pos.z + vertical_range < aabb.min.z
                    || pos.z - vertical_range > aabb.max.z
                {
                    continue;
                }
                for half_edge in floor.half_edges() {
                    if half_edge.is_half_edge_crossable(NAV_TERRAIN_TYPE_MASK_ALL) {
                        continue;
                    }
                    let point = closest_point_on_segment_2d(pos, half_edge.start_vertex(), half_edge.end_vertex());
                    if (point.z - pos.z).abs() > vertical_range {
                        continue;
                    }
                    let square_dist = square_distance_2d(pos, point);
                    if square_dist > max_square_dist {
                        continue;
                    }
                    if best.as_ref().map_or(true, |hit| square_dist < hit.square_dist) {
                        best = Some(ObstacleHit {
                            half_edge,
                            point,
                            square_dist,
                        });
                    }
                }
            }
        }
        best
    }
}

/// Unit direction pointing into the mesh from the nearest point of a border.
///
/// On an end of the half-edge the neighbour border half-edge is blended in, so the
/// direction points into the corner.
fn inward_dir(hit: &ObstacleHit<'_>) -> Vec2 {
    let normal = |half_edge: &NavHalfEdgePtr<'_>| {
        perp_ccw(to_2d(half_edge.end_vertex()) - to_2d(half_edge.start_vertex())).normalize_or_zero()
    };
    let own = normal(&hit.half_edge);
    let at = |v: Vec3| square_distance_2d(hit.point, v) <= f32::EPSILON;
    let blended = if at(hit.half_edge.end_vertex()) {
        own + normal(&hit.half_edge.next_half_edge_along_obstacle(NAV_TERRAIN_TYPE_MASK_ALL))
    } else if at(hit.half_edge.start_vertex()) {
        own + normal(&hit.half_edge.prev_half_edge_along_obstacle(NAV_TERRAIN_TYPE_MASK_ALL))
    } else {
        own
    };
    blended.try_normalize().unwrap_or(own)
}

fn collect_triangles_at(
    cell: &NavCellPtr<'_>,
    pos: Vec3,
    query_type: TrianglesFromPosQueryType,
    result: &mut FixedArray<'_, NavTriangleKey>,
) -> ContainerResult {
    let mut nearest_below: Option<(NavTrianglePtr<'_>, f32)> = None;
    let mut nearest_above: Option<(NavTrianglePtr<'_>, f32)> = None;
    for floor in cell.floors() {
        for triangle in floor.triangles() {
            if !triangle.is_inside_2d(pos) {
                continue;
            }
            let relative = triangle.altitude_at(pos) - pos.z;
            let listed = match query_type {
                TrianglesFromPosQueryType::All => true,
                TrianglesFromPosQueryType::AllBelow => relative <= 0.0,
                TrianglesFromPosQueryType::AllAbove => relative >= 0.0,
                TrianglesFromPosQueryType::NearestAboveAndBelow => {
                    if relative <= 0.0 {
                        if nearest_below.map_or(true, |(_, best)| relative > best) {
                            nearest_below = Some((triangle, relative));
                        }
                    } else if nearest_above.map_or(true, |(_, best)| relative < best) {
                        nearest_above = Some((triangle, relative));
                    }
                    false
                }
            };
            if listed {
                result.push_back(triangle.key())?;
            }
        }
    }
    for (triangle, _) in nearest_below.into_iter().chain(nearest_above) {
        result.push_back(triangle.key())?;
    }
    Ok(())
}

/// Calls `visit` on every loaded floor whose bounding box overlaps the enlarged box
fn for_each_floor_under_box<'m>(
    manager: &'m NavMeshManager,
    obstacle: &BoxObstacle,
    tolerance_below: f32,
    tolerance_above: f32,
    mut visit: impl FnMut(NavFloorPtr<'m>) -> ContainerResult,
) -> ContainerResult {
    let z_min = obstacle.center.z - obstacle.half_height - tolerance_below;
    let z_max = obstacle.center.z + obstacle.half_height + tolerance_above;
    for cell_pos in manager.grid().cell_box_of_an_aabbox(&obstacle.aabb_2d()).iter() {
        let Some(cell) = manager
            .stitched_cell(cell_pos)
            .and_then(|cell| manager.cell_ptr(cell.idx()))
        else {
            continue;
        };
        for floor in cell.floors() {
            let aabb = &floor.nav_floor().aabb;
            if aabb.min.z > z_max || aabb.max.z < z_min {
                continue;
            }
            if aabb_vs_box_obstacle_2d(&aabb.to_2d(), obstacle) {
                visit(floor)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryBufferConfig;
    use crate::nav_mesh::NavMesh;
    use crate::nav_mesh_builder::NavMeshBuilder;
    use crate::queries::{
        InsidePosFromOutsidePosQueryResult, NavFloorsFromBoxObstacleQueryResult,
        NearestObstacleHalfEdgeFromPosQueryResult, NearestTriangleFromPosQueryResult,
        TrianglesFromBoxObstacleQueryResult,
        TrianglesFromPosQueryResult,
    };
    use crate::test_mesh_helpers::*;
    use navmesh_common::{CellPos, Result};

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    /// Two squares stacked at altitudes 0 and 3 in one cell
    fn create_stacked_mesh() -> Result<NavMesh> {
        let square = |z: f32| {
            [
                Vec3::new(1.0, 1.0, z),
                Vec3::new(9.0, 1.0, z),
                Vec3::new(9.0, 9.0, z),
                Vec3::new(1.0, 9.0, z),
            ]
        };
        let mut builder = NavMeshBuilder::new(10.0);
        builder.add_floor(CellPos::ZERO, &square(0.0), &[[0, 1, 2], [0, 2, 3]], 0x1);
        builder.add_floor(CellPos::ZERO, &square(3.0), &[[0, 1, 2], [0, 2, 3]], 0x1);
        builder.build()
    }

    #[test]
    fn test_nearest_triangle_from_pos() -> Result<()> {
        let (manager, _) = create_manager_with(create_stacked_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = NearestTriangleFromPosQuery::new(Vec3::new(3.0, 2.0, 2.5));
        server.nearest_triangle_from_pos(&mut query)?;
        assert_eq!(query.get_result(), NearestTriangleFromPosQueryResult::TriangleFound);
        assert!((query.relative_altitude - 0.5).abs() < 1e-5);

        let mut query = NearestTriangleFromPosQuery::new(Vec3::new(3.0, 2.0, 2.5))
            .with_search_range(5.0)
            .with_type(NearestTriangleFromPosQueryType::NearestBelow);
        server.nearest_triangle_from_pos(&mut query)?;
        assert_eq!(query.get_result(), NearestTriangleFromPosQueryResult::TriangleFound);
        assert!((query.relative_altitude + 2.5).abs() < 1e-5);

        let mut query = NearestTriangleFromPosQuery::new(Vec3::new(3.0, 2.0, 1.5));
        server.nearest_triangle_from_pos(&mut query)?;
        assert_eq!(query.get_result(), NearestTriangleFromPosQueryResult::PointOutside);

        let mut query = NearestTriangleFromPosQuery::new(Vec3::new(3.0, 2.0, 1.5));
        query.bias_in_altitude = 1.0;
        server.nearest_triangle_from_pos(&mut query)?;
        assert_eq!(query.get_result(), NearestTriangleFromPosQueryResult::TriangleFound);
        Ok(())
    }

    #[test]
    fn test_triangles_from_pos() -> Result<()> {
        let (manager, _) = create_manager_with(create_stacked_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;
        let pos = Vec3::new(3.0, 2.0, 1.0);

        let mut query = TrianglesFromPosQuery::new(pos, TrianglesFromPosQueryType::All);
        server.triangles_from_pos(&mut query)?;
        assert_eq!(query.get_result(), TrianglesFromPosQueryResult::TrianglesFound);
        assert_eq!(query.triangle_count, 2);
        assert_eq!(server.result_triangles().len(), 2);

        let mut query = TrianglesFromPosQuery::new(pos, TrianglesFromPosQueryType::AllAbove);
        server.triangles_from_pos(&mut query)?;
        assert_eq!(query.triangle_count, 1);
        assert_eq!(server.result_triangles()[0].floor, 1);

        let mut query = TrianglesFromPosQuery::new(pos, TrianglesFromPosQueryType::NearestAboveAndBelow);
        server.triangles_from_pos(&mut query)?;
        let floors: Vec<u32> = server.result_triangles().iter().map(|key| key.floor).collect();
        assert_eq!(floors, vec![0, 1]);

        let mut query = TrianglesFromPosQuery::new(Vec3::new(0.5, 2.0, 0.0), TrianglesFromPosQueryType::All);
        server.triangles_from_pos(&mut query)?;
        assert_eq!(query.get_result(), TrianglesFromPosQueryResult::PointOutside);

        let tiny = QueryBufferConfig {
            result_bytes: 12,
            ..Default::default()
        };
        let mut server = NavMeshQueryServer::with_config(&manager, &tiny)?;
        let mut query = TrianglesFromPosQuery::new(pos, TrianglesFromPosQueryType::All);
        assert_eq!(
            server.triangles_from_pos(&mut query),
            Err(QueryServerError::LackOfResultMemory)
        );
        assert_eq!(query.triangle_count, 1);
        Ok(())
    }

    #[test]
    fn test_box_obstacle_queries() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(2, 1, 4.0, CellPos::ZERO)?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        // inside one triangle of the first cell
        let small = BoxObstacle::new(Vec3::new(1.5, 0.5, 0.0), Vec2::X, 0.2, 0.2, 1.0);
        let mut query = TrianglesFromBoxObstacleQuery::new(small, 0.0, 0.0);
        server.triangles_in_box_obstacle(&mut query)?;
        assert_eq!(query.get_result(), TrianglesFromBoxObstacleQueryResult::TrianglesFound);
        assert_eq!(query.triangle_count, 1);

        // straddling the border between the two cells
        let wide = BoxObstacle::new(Vec3::new(4.0, 2.0, 0.0), Vec2::X, 0.5, 0.5, 1.0);
        let mut floors = NavFloorsFromBoxObstacleQuery::new(wide, 0.0, 0.0);
        server.nav_floors_in_box_obstacle(&mut floors)?;
        assert_eq!(floors.get_result(), NavFloorsFromBoxObstacleQueryResult::Found);
        assert_eq!(server.result_floors().len(), 2);

        let mut query = TrianglesFromBoxObstacleQuery::new(wide, 0.0, 0.0);
        server.triangles_in_box_obstacle(&mut query)?;
        assert!(query.triangle_count >= 4);
        assert!(server.result_floors().is_empty());

        let high = BoxObstacle::new(Vec3::new(1.5, 0.5, 5.0), Vec2::X, 0.2, 0.2, 1.0);
        let mut query = TrianglesFromBoxObstacleQuery::new(high, 0.0, 0.0);
        server.triangles_in_box_obstacle(&mut query)?;
        assert_eq!(query.get_result(), TrianglesFromBoxObstacleQueryResult::BoxOutside);

        let mut query = TrianglesFromBoxObstacleQuery::new(high, 4.5, 0.0);
        server.triangles_in_box_obstacle(&mut query)?;
        assert_eq!(query.triangle_count, 1);
        Ok(())
    }

    #[test]
    fn test_nearest_obstacle_half_edge() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = NearestObstacleHalfEdgeFromPosQuery::new(v(5.0, 5.5));
        server.nearest_obstacle_half_edge_from_pos(&mut query)?;
        assert_eq!(query.get_result(), NearestObstacleHalfEdgeFromPosQueryResult::HalfEdgeFound);
        assert!((query.square_dist_from_half_edge - 0.25).abs() < 1e-5);
        assert!((query.nearest_point_on_half_edge.y - 6.0).abs() < 1e-5);
        assert!(query.next_half_edge_on_obstacle.is_some());
        assert!(query.prev_half_edge_on_obstacle.is_some());

        let mut query = NearestObstacleHalfEdgeFromPosQuery::new(v(5.0, 9.5));
        server.nearest_obstacle_half_edge_from_pos(&mut query)?;
        assert_eq!(query.get_result(), NearestObstacleHalfEdgeFromPosQueryResult::HalfEdgeNotFound);
        Ok(())
    }

    #[test]
    fn test_inside_pos_from_outside_pos() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = InsidePosFromOutsidePosQuery::new(v(5.0, 7.0));
        server.inside_pos_from_outside_pos(&mut query)?;
        assert_eq!(query.get_result(), InsidePosFromOutsidePosQueryResult::PosFound);
        assert!((query.inside_pos.x - 5.0).abs() < 1e-4);
        assert!((query.inside_pos.y - (6.0 - query.dist_from_obstacle)).abs() < 1e-4);
        let triangle = query
            .triangle
            .as_ref()
            .and_then(|triangle| triangle.resolve(&manager))
            .expect("inside position lies in a triangle");
        assert!(triangle.is_inside_2d(query.inside_pos));

        let mut query = InsidePosFromOutsidePosQuery::new(v(5.0, 9.5));
        server.inside_pos_from_outside_pos(&mut query)?;
        assert_eq!(query.get_result(), InsidePosFromOutsidePosQueryResult::PosNotFound);
        Ok(())
    }
}
