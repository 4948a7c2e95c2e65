//! Runs query objects against the loaded NavMeshes
//!
//! The server borrows the manager for its whole life and owns a [`NavMeshQueryBuffer`]
//! whose regions are lent to the traversals of each query. Nothing is allocated while a
//! query runs: when a region is too small the query stops with the matching
//! [`QueryServerError`] and its outputs describe what was found so far.

mod can_go;
mod cast;
mod disk;
mod position;

use navmesh_common::{perp_ccw, to_2d, Result, Vec2, Vec3};

use crate::config::QueryBufferConfig;
use crate::containers::{BinaryMinHeap, FixedArray, FixedDeque};
use crate::nav_mesh_manager::NavMeshManager;
use crate::nav_mesh_types::{
    is_terrain_type_compliant, NavFloorKey, NavTerrainTypeMask, NavTriangleKey,
};
use crate::nav_ptr::NavTrianglePtr;
use crate::nav_safe_ptr::NavTriangleSafePtr;
use crate::queries::{CastOutput, NearestTriangleFromPosQueryType};
use crate::query_buffer::NavMeshQueryBuffer;
use crate::status::QueryServerError;
use crate::traversal::{
    BestFirstSearchTraversal, BreadthFirstSearchTraversal, CapsuleIntersector, EdgeCollision,
    EdgeCollisionVisitor, EdgeIntersector, RayIntersector, StaticDiskIntersector,
};

/// Processes the queries of one thread.
///
/// Queries are mutated in place: inputs are read, safe pointers to the start triangles
/// are written back, then the outputs are filled for `get_result()`. The triangle and
/// floor lists of the list queries, and the propagation of the last traversing query, stay
/// readable until the next query.
pub struct NavMeshQueryServer<'m> {
    manager: &'m NavMeshManager,
    buffer: NavMeshQueryBuffer,
    propagation_count: usize,
    result_triangle_count: usize,
    result_floor_count: usize,
}

/// What an edge-collision propagation left behind
#[derive(Debug, Clone, Copy)]
struct EdgeSearch<'m> {
    collision: Option<EdgeCollision<'m>>,
    /// Closed triangles, at the front of the closed region of the buffer
    closed_count: usize,
}

impl<'m> NavMeshQueryServer<'m> {
    pub fn new(manager: &'m NavMeshManager, buffer: NavMeshQueryBuffer) -> Self {
        Self {
            manager,
            buffer,
            propagation_count: 0,
            result_triangle_count: 0,
            result_floor_count: 0,
        }
    }

    /// Allocates a buffer sized by `config`
    pub fn with_config(manager: &'m NavMeshManager, config: &QueryBufferConfig) -> Result<Self> {
        Ok(Self::new(manager, NavMeshQueryBuffer::new(config)?))
    }

    pub fn manager(&self) -> &'m NavMeshManager {
        self.manager
    }

    pub fn buffer(&self) -> &NavMeshQueryBuffer {
        &self.buffer
    }

    /// Gives the buffer back, to reuse it with another manager
    pub fn into_buffer(self) -> NavMeshQueryBuffer {
        self.buffer
    }

    /// Triangles visited by the last query that asked for its propagation, in visit order
    pub fn propagation_triangles(&self) -> &[NavTriangleKey] {
        &self.buffer.propagation[..self.propagation_count]
    }

    /// Triangles listed by the last triangle list query
    pub fn result_triangles(&self) -> &[NavTriangleKey] {
        &self.buffer.result_triangles[..self.result_triangle_count]
    }

    /// Floors listed by the last floor list query
    pub fn result_floors(&self) -> &[NavFloorKey] {
        &self.buffer.result_floors[..self.result_floor_count]
    }

    fn reset_outputs(&mut self) {
        self.propagation_count = 0;
        self.result_triangle_count = 0;
        self.result_floor_count = 0;
    }

    /// Triangle under or over `pos` whose altitude at `pos` is the closest, within
    /// `search_range` vertically. Returns it with its altitude relative to `pos`.
    fn find_nearest_triangle(
        &self,
        pos: Vec3,
        search_range: f32,
        query_type: NearestTriangleFromPosQueryType,
    ) -> Option<(NavTrianglePtr<'m>, f32)> {
        let manager = self.manager;
        let cell = manager.cell_ptr(manager.stitched_cell_at(pos)?.idx())?;

        let mut best: Option<(NavTrianglePtr<'m>, f32)> = None;
        for floor in cell.floors() {
            let aabb = &floor.nav_floor().aabb;
            if pos.z + search_range < aabb.min.z || pos.z - search_range > aabb.max.z {
                continue;
            }
            for triangle in floor.triangles() {
                if !triangle.is_inside_2d(pos) {
                    continue;
                }
                let relative = triangle.altitude_at(pos) - pos.z;
                let in_range = match query_type {
                    NearestTriangleFromPosQueryType::Nearest => relative.abs() <= search_range,
                    NearestTriangleFromPosQueryType::NearestBelow => {
                        relative <= 0.0 && relative >= -search_range
                    }
                    NearestTriangleFromPosQueryType::NearestAbove => {
                        relative >= 0.0 && relative <= search_range
                    }
                };
                if in_range && best.map_or(true, |(_, b)| relative.abs() < b.abs()) {
                    best = Some((triangle, relative));
                }
            }
        }
        best
    }

    /// The triangle a query starts from: the cached one if it still resolves, else the
    /// nearest at `pos`
    fn resolve_triangle(
        &self,
        cached: Option<&NavTriangleSafePtr>,
        pos: Vec3,
        search_range: f32,
    ) -> Option<NavTrianglePtr<'m>> {
        cached
            .and_then(|triangle| triangle.resolve(self.manager))
            .or_else(|| {
                self.find_nearest_triangle(pos, search_range, NearestTriangleFromPosQueryType::Nearest)
                    .map(|(triangle, _)| triangle)
            })
    }

    /// Best-first propagation of `intersector` from `start`, keeping the nearest contact
    fn run_edge_search<I: EdgeIntersector>(
        &mut self,
        start: NavTrianglePtr<'m>,
        intersector: I,
        terrain_mask: NavTerrainTypeMask,
        record_propagation: bool,
    ) -> std::result::Result<EdgeSearch<'m>, QueryServerError> {
        let manager = self.manager;
        let buffer = &mut self.buffer;
        let visitor = EdgeCollisionVisitor::new(intersector, terrain_mask);
        let mut traversal = BestFirstSearchTraversal::new(
            manager,
            visitor,
            terrain_mask,
            BinaryMinHeap::new(&mut buffer.open_nodes),
            FixedArray::new(&mut buffer.closed),
        );
        if record_propagation {
            traversal = traversal.with_visited_nodes(FixedArray::new(&mut buffer.propagation));
        }

        let outcome = traversal
            .set_start_triangle(start)
            .and_then(|()| traversal.search());
        let closed_count = traversal.closed_nodes().len();
        let propagation_count = traversal.visited_nodes().len();
        let collision = traversal.into_visitor().collision().copied();

        if record_propagation {
            self.propagation_count = propagation_count;
        }
        if let Err(err) = outcome {
            log::debug!(
                "Edge collision search stopped after {} triangles: {}",
                closed_count,
                err
            );
            return Err(err.into());
        }
        Ok(EdgeSearch {
            collision,
            closed_count,
        })
    }

    /// Breadth-first search of any contact of a static disk; true if one is found
    fn run_disk_collision_search(
        &mut self,
        start: NavTrianglePtr<'m>,
        center: Vec3,
        radius: f32,
        terrain_mask: NavTerrainTypeMask,
        record_propagation: bool,
    ) -> std::result::Result<bool, QueryServerError> {
        let manager = self.manager;
        let buffer = &mut self.buffer;
        let visitor = EdgeCollisionVisitor::new(StaticDiskIntersector::new(center, radius), terrain_mask);
        let mut traversal = BreadthFirstSearchTraversal::new(
            manager,
            visitor,
            terrain_mask,
            FixedDeque::new(&mut buffer.open_keys),
            FixedArray::new(&mut buffer.closed),
        );
        if record_propagation {
            traversal = traversal.with_visited_nodes(FixedArray::new(&mut buffer.propagation));
        }

        let outcome = traversal
            .set_start_triangle(start)
            .and_then(|()| traversal.search());
        let closed_count = traversal.closed_nodes().len();
        let propagation_count = traversal.visited_nodes().len();
        let collision = traversal.visitor().collision().is_some();

        if record_propagation {
            self.propagation_count = propagation_count;
        }
        if let Err(err) = outcome {
            log::debug!(
                "Disk collision search stopped after {} triangles: {}",
                closed_count,
                err
            );
            return Err(err.into());
        }
        Ok(collision)
    }

    fn closed_triangles(&self, search: &EdgeSearch<'m>) -> &[NavTriangleKey] {
        &self.buffer.closed[..search.closed_count]
    }

    fn is_closed(&self, search: &EdgeSearch<'m>, key: NavTriangleKey) -> bool {
        self.closed_triangles(search).contains(&key)
    }

    fn closed_triangle_containing(
        &self,
        search: &EdgeSearch<'m>,
        pos: Vec3,
    ) -> Option<NavTrianglePtr<'m>> {
        let manager = self.manager;
        self.closed_triangles(search)
            .iter()
            .filter_map(|key| manager.triangle_ptr(*key))
            .find(|triangle| triangle.is_inside_2d(pos))
    }

    /// Disk to sweep from `start_pos`, narrowed on each side when the disk already touches a
    /// border at the start.
    ///
    /// The free space on each side is measured with a ray cast orthogonally to `dir` up to
    /// `radius`; the disk keeps that space minus `safety_dist` on the side of a hit.
    #[allow(clippy::too_many_arguments)]
    fn start_adapted_capsule(
        &mut self,
        start: NavTrianglePtr<'m>,
        start_pos: Vec3,
        dir: Vec2,
        length: f32,
        radius: f32,
        safety_dist: f32,
        terrain_mask: NavTerrainTypeMask,
    ) -> std::result::Result<CapsuleIntersector, QueryServerError> {
        let capsule = CapsuleIntersector::new(start_pos, dir, length, radius);
        if !self.run_disk_collision_search(start, start_pos, radius, terrain_mask, false)? {
            return Ok(capsule);
        }

        let left = perp_ccw(dir);
        let clearance_left = self.clearance(start, start_pos, left, radius, terrain_mask)?;
        let clearance_right = self.clearance(start, start_pos, -left, radius, terrain_mask)?;
        let band = |clearance: Option<f32>| {
            clearance.map_or(radius, |dist| (dist - safety_dist).clamp(0.0, radius))
        };
        let (on_right, on_left) = (band(clearance_right), band(clearance_left));
        log::debug!(
            "Start disk at {:?} touches a border, sweeping {} on the right and {} on the left",
            start_pos,
            on_right,
            on_left
        );
        Ok(capsule.with_cross_section(on_right, on_left))
    }

    /// Distance to the first contact of a ray of `length` cast along `side`
    fn clearance(
        &mut self,
        start: NavTrianglePtr<'m>,
        start_pos: Vec3,
        side: Vec2,
        length: f32,
        terrain_mask: NavTerrainTypeMask,
    ) -> std::result::Result<Option<f32>, QueryServerError> {
        let end = start_pos + Vec3::new(side.x, side.y, 0.0) * length;
        let search = self.run_edge_search(start, RayIntersector::new(start_pos, end), terrain_mask, false)?;
        Ok(search.collision.map(|collision| collision.key.sqrt()))
    }

    /// Arrival of a cast along `dir` from the contact (or the lack of it) left by `search`
    #[allow(clippy::too_many_arguments)]
    fn cast_output(
        &self,
        search: &EdgeSearch<'m>,
        start: NavTrianglePtr<'m>,
        start_pos: Vec3,
        dir: Vec2,
        max_dist: f32,
        safety_dist: f32,
        search_range: f32,
    ) -> CastOutput {
        let mut output = CastOutput::default();
        let travel = match search.collision {
            None => {
                output.reach_max_dist = true;
                max_dist
            }
            Some(collision) => {
                output.collision_pos = collision.pos;
                output.intersected_half_edge = Some(collision.half_edge.to_safe_ptr());
                (collision.key.sqrt() - safety_dist).clamp(0.0, max_dist.max(0.0))
            }
        };

        if travel <= 0.0 {
            output.arrival_pos = start_pos;
            output.arrival_triangle = Some(start.to_safe_ptr());
            output.consistent_result = true;
            return output;
        }

        let arrival = to_2d(start_pos) + dir * travel;
        let mut arrival_pos = Vec3::new(arrival.x, arrival.y, start_pos.z);
        if let Some(triangle) = self.closed_triangle_containing(search, arrival_pos) {
            arrival_pos.z = triangle.altitude_at(arrival_pos);
            output.arrival_triangle = Some(triangle.to_safe_ptr());
            output.consistent_result = true;
        } else if let Some((triangle, relative)) = self.find_nearest_triangle(
            arrival_pos,
            search_range,
            NearestTriangleFromPosQueryType::Nearest,
        ) {
            arrival_pos.z += relative;
            output.arrival_triangle = Some(triangle.to_safe_ptr());
        }
        output.arrival_pos = arrival_pos;
        output
    }
}

/// Triangle usable as a query start with `mask`
fn is_allowed(triangle: &NavTrianglePtr<'_>, mask: NavTerrainTypeMask) -> bool {
    is_terrain_type_compliant(mask, triangle.terrain_type())
}

/// Unit direction in the X,Y plane, X when `dir` is degenerate
fn normalized_2d(dir: Vec2) -> Vec2 {
    dir.try_normalize().unwrap_or(Vec2::X)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mesh_helpers::*;

    #[test]
    fn test_nearest_triangle_respects_vertical_range() -> Result<()> {
        let (manager, _) = create_manager_with(create_flat_square_mesh()?);
        let server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let (triangle, relative) = server
            .find_nearest_triangle(Vec3::new(3.0, 2.0, 0.5), 1.0, NearestTriangleFromPosQueryType::Nearest)
            .expect("point above the floor");
        assert!(triangle.is_inside_2d(Vec3::new(3.0, 2.0, 0.0)));
        assert!((relative + 0.5).abs() < 1e-5);

        assert!(server
            .find_nearest_triangle(Vec3::new(3.0, 2.0, 1.5), 1.0, NearestTriangleFromPosQueryType::Nearest)
            .is_none());
        assert!(server
            .find_nearest_triangle(Vec3::new(3.0, 2.0, 0.5), 1.0, NearestTriangleFromPosQueryType::NearestAbove)
            .is_none());
        assert!(server
            .find_nearest_triangle(Vec3::new(15.0, 2.0, 0.0), 1.0, NearestTriangleFromPosQueryType::Nearest)
            .is_none());
        Ok(())
    }

    #[test]
    fn test_stale_cached_triangle_falls_back_to_lookup() -> Result<()> {
        let (mut manager, id) = create_manager_with(create_flat_square_mesh()?);
        let stale = manager
            .triangle_ptr(NavTriangleKey::default())
            .expect("fixture has triangles")
            .to_safe_ptr();
        manager.remove_nav_mesh(id)?;
        manager.add_nav_mesh(std::sync::Arc::new(create_flat_square_mesh()?))?;

        let server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;
        assert!(stale.resolve(&manager).is_none());
        let triangle = server
            .resolve_triangle(Some(&stale), Vec3::new(8.0, 1.0, 0.0), 1.0)
            .expect("lookup finds the reloaded floor");
        assert!(triangle.is_inside_2d(Vec3::new(8.0, 1.0, 0.0)));
        Ok(())
    }
}
