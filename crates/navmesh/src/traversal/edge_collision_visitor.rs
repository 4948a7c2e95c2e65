use navmesh_common::Vec3;

use crate::nav_mesh_types::NavTerrainTypeMask;
use crate::nav_ptr::{NavHalfEdgePtr, NavTrianglePtr};

use super::intersectors::EdgeIntersector;
use super::{BestFirstSearchVisitor, BreadthFirstSearchVisitor};

/// Uncrossable half-edge touched by a query shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCollision<'m> {
    pub half_edge: NavHalfEdgePtr<'m>,
    pub pos: Vec3,
    /// Squared travel distance (or squared distance for static shapes) to the contact
    pub key: f32,
}

/// Propagates through the edges crossed by a shape and keeps the nearest contact with an
/// uncrossable edge.
///
/// As a best-first visitor the search ends once the popped cost reaches the nearest key,
/// or at the first contact when `stop_at_first_collision` is set. As a breadth-first
/// visitor it always ends at the first contact.
pub struct EdgeCollisionVisitor<'m, I> {
    intersector: I,
    terrain_mask: NavTerrainTypeMask,
    stop_at_first_collision: bool,
    collision: Option<EdgeCollision<'m>>,
    last_cost: f32,
}

impl<'m, I: EdgeIntersector> EdgeCollisionVisitor<'m, I> {
    pub fn new(intersector: I, terrain_mask: NavTerrainTypeMask) -> Self {
        Self {
            intersector,
            terrain_mask,
            stop_at_first_collision: false,
            collision: None,
            last_cost: 0.0,
        }
    }

    pub fn stop_at_first_collision(mut self, stop: bool) -> Self {
        self.stop_at_first_collision = stop;
        self
    }

    pub fn intersector(&self) -> &I {
        &self.intersector
    }

    pub fn collision(&self) -> Option<&EdgeCollision<'m>> {
        self.collision.as_ref()
    }

    fn record_contacts(&mut self, triangle: &NavTrianglePtr<'m>) {
        for n in 0..3 {
            let half_edge = triangle.half_edge(n);
            if half_edge.is_half_edge_crossable(self.terrain_mask) {
                continue;
            }
            let (a, b) = (half_edge.start_vertex(), half_edge.end_vertex());
            if !self.intersector.is_blocked_by_edge(a, b) {
                continue;
            }
            let (pos, key) = self.intersector.compute_collision_pos_on_edge(a, b);
            if self.collision.map_or(true, |best| key < best.key) {
                self.collision = Some(EdgeCollision {
                    half_edge,
                    pos,
                    key,
                });
            }
        }
    }

    fn crosses(&self, via: Option<&NavHalfEdgePtr<'m>>) -> bool {
        via.map_or(true, |half_edge| {
            self.intersector
                .does_intersect_edge(half_edge.start_vertex(), half_edge.end_vertex())
        })
    }
}

impl<'m, I: EdgeIntersector> BestFirstSearchVisitor<'m> for EdgeCollisionVisitor<'m, I> {
    fn compute_triangle_cost(&mut self, triangle: &NavTrianglePtr<'m>) -> f32 {
        let [v0, v1, v2] = triangle.vertices();
        self.intersector.compute_triangle_cost(v0, v1, v2)
    }

    fn visit(&mut self, triangle: &NavTrianglePtr<'m>, cost: f32) {
        self.last_cost = cost;
        self.record_contacts(triangle);
    }

    fn is_search_finished(&self) -> bool {
        match self.collision {
            Some(collision) => self.stop_at_first_collision || self.last_cost >= collision.key,
            None => false,
        }
    }

    fn should_visit_triangle(
        &mut self,
        _triangle: &NavTrianglePtr<'m>,
        via: Option<&NavHalfEdgePtr<'m>>,
    ) -> bool {
        self.crosses(via)
    }
}

impl<'m, I: EdgeIntersector> BreadthFirstSearchVisitor<'m> for EdgeCollisionVisitor<'m, I> {
    fn visit(&mut self, triangle: &NavTrianglePtr<'m>) {
        self.record_contacts(triangle);
    }

    fn is_search_finished(&self) -> bool {
        self.collision.is_some()
    }

    fn should_visit_triangle(
        &mut self,
        _triangle: &NavTrianglePtr<'m>,
        via: Option<&NavHalfEdgePtr<'m>>,
    ) -> bool {
        self.crosses(via)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{BinaryMinHeap, FixedArray};
    use crate::nav_mesh_manager::NavMeshManager;
    use crate::nav_mesh_types::{NavTriangleKey, NAV_TERRAIN_TYPE_MASK_ALL};
    use crate::test_mesh_helpers::*;
    use crate::traversal::{
        BestFirstSearchTraversal, CapsuleIntersector, PropagationNode, RayIntersector,
    };
    use navmesh_common::{CellPos, Result, Vec2};

    fn triangle_at(manager: &NavMeshManager, pos: Vec3) -> NavTrianglePtr<'_> {
        manager
            .stitched_cell_at(pos)
            .and_then(|cell| manager.cell_ptr(cell.idx()))
            .and_then(|cell| cell.floor(0))
            .and_then(|floor| floor.triangles().find(|t| t.is_inside_2d(pos)))
            .expect("triangle under pos")
    }

    fn run<'m, I: EdgeIntersector>(
        manager: &'m NavMeshManager,
        start: Vec3,
        intersector: I,
    ) -> (Option<EdgeCollision<'m>>, usize) {
        let mut open = vec![PropagationNode::default(); 512];
        let mut closed = vec![NavTriangleKey::default(); 512];
        let visitor = EdgeCollisionVisitor::new(intersector, NAV_TERRAIN_TYPE_MASK_ALL);
        let mut traversal = BestFirstSearchTraversal::new(
            manager,
            visitor,
            NAV_TERRAIN_TYPE_MASK_ALL,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        );
        traversal
            .set_start_triangle(triangle_at(manager, start))
            .expect("room for start");
        traversal.search().expect("enough memory");
        let closed_count = traversal.closed_nodes().len();
        (traversal.into_visitor().collision().copied(), closed_count)
    }

    #[test]
    fn test_ray_hits_cell_border() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(3, 1, 4.0, CellPos::ZERO)?);
        let start = Vec3::new(1.0, 1.0, 0.0);
        let (collision, _) = run(&manager, start, RayIntersector::new(start, Vec3::new(20.0, 1.0, 0.0)));
        let collision = collision.expect("mesh ends at x = 12");
        assert!((collision.pos.x - 12.0).abs() < 1e-4);
        assert!((collision.key - 121.0).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn test_ray_inside_mesh_has_no_collision() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(3, 1, 4.0, CellPos::ZERO)?);
        let start = Vec3::new(1.0, 1.0, 0.0);
        let (collision, closed) = run(&manager, start, RayIntersector::new(start, Vec3::new(11.0, 3.0, 0.0)));
        assert!(collision.is_none());
        // Only the triangles along the ray are visited
        assert!(closed < 24);
        Ok(())
    }

    #[test]
    fn test_capsule_finds_nearest_wall_in_corridor() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let start = Vec3::new(1.0, 5.0, 0.0);

        // Disk of radius 0.5 going east hits the east end of the corridor
        let capsule = CapsuleIntersector::new(start, Vec2::X, 20.0, 0.5);
        let (collision, _) = run(&manager, start, capsule);
        let collision = collision.expect("corridor ends at x = 10");
        assert!((collision.key.sqrt() - 8.5).abs() < 1e-3);

        // A wider disk touches the side walls from the start
        let capsule = CapsuleIntersector::new(start, Vec2::X, 20.0, 1.5);
        let (collision, _) = run(&manager, start, capsule);
        assert_eq!(collision.map(|c| c.key), Some(0.0));
        Ok(())
    }

    #[test]
    fn test_cross_section_capsule_search_finds_nearest_contact() -> Result<()> {
        // Side walls lie outside the cross-section, only the far end stops the disk
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let start = Vec3::new(1.0, 5.0, 0.0);
        let capsule =
            CapsuleIntersector::new(start, Vec2::X, 20.0, 1.5).with_cross_section(0.5, 0.5);
        let (collision, closed) = run(&manager, start, capsule);
        let collision = collision.expect("corridor ends at x = 10");
        assert!((collision.pos.x - 10.0).abs() < 1e-4);
        assert!((collision.key.sqrt() - 7.5).abs() < 1e-3);
        // Every triangle costs less than the contact key
        assert_eq!(closed, 10);
        Ok(())
    }
}
