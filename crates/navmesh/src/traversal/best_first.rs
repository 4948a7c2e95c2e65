use crate::containers::{BinaryMinHeap, FixedArray};
use crate::nav_mesh_manager::NavMeshManager;
use crate::nav_mesh_types::{is_terrain_type_compliant, NavTerrainTypeMask, NavTriangleKey};
use crate::nav_ptr::NavTrianglePtr;
use crate::status::{TraversalError, TraversalResult};

use super::{BestFirstSearchVisitor, PropagationNode};

/// Visits triangles in order of increasing visitor cost.
///
/// Each popped triangle is closed, visited, then its neighbours across crossable
/// half-edges are pushed with their cost unless already open or closed.
pub struct BestFirstSearchTraversal<'m, 'b, V> {
    manager: &'m NavMeshManager,
    visitor: V,
    terrain_mask: NavTerrainTypeMask,
    open: BinaryMinHeap<'b, PropagationNode>,
    closed: FixedArray<'b, NavTriangleKey>,
    visited: Option<FixedArray<'b, NavTriangleKey>>,
    sequence: u32,
}

impl<'m, 'b, V: BestFirstSearchVisitor<'m>> BestFirstSearchTraversal<'m, 'b, V> {
    pub fn new(
        manager: &'m NavMeshManager,
        visitor: V,
        terrain_mask: NavTerrainTypeMask,
        open: BinaryMinHeap<'b, PropagationNode>,
        closed: FixedArray<'b, NavTriangleKey>,
    ) -> Self {
        Self {
            manager,
            visitor,
            terrain_mask,
            open,
            closed,
            visited: None,
            sequence: 0,
        }
    }

    /// Records every visited triangle, in visit order
    pub fn with_visited_nodes(mut self, visited: FixedArray<'b, NavTriangleKey>) -> Self {
        self.visited = Some(visited);
        self
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }

    pub fn visitor_mut(&mut self) -> &mut V {
        &mut self.visitor
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    pub fn closed_nodes(&self) -> &[NavTriangleKey] {
        self.closed.as_slice()
    }

    pub fn visited_nodes(&self) -> &[NavTriangleKey] {
        match &self.visited {
            Some(visited) => visited.as_slice(),
            None => &[],
        }
    }

    pub fn is_closed(&self, key: &NavTriangleKey) -> bool {
        self.closed.contains(key)
    }

    fn is_open(&self, key: &NavTriangleKey) -> bool {
        self.open.as_slice().iter().any(|node| node.triangle == *key)
    }

    /// Resets the propagation and opens `start` if its terrain type is in the mask and the
    /// visitor accepts it
    pub fn set_start_triangle(&mut self, start: NavTrianglePtr<'m>) -> TraversalResult {
        self.open.clear();
        self.closed.clear();
        if let Some(visited) = self.visited.as_mut() {
            visited.clear();
        }
        self.sequence = 0;

        if !is_terrain_type_compliant(self.terrain_mask, start.terrain_type())
            || !self.visitor.should_visit_triangle(&start, None)
        {
            return Ok(());
        }
        let cost = self.visitor.compute_triangle_cost(&start);
        self.push_open(start.key(), cost)
    }

    fn push_open(&mut self, triangle: NavTriangleKey, cost: f32) -> TraversalResult {
        self.open
            .insert(PropagationNode {
                triangle,
                cost,
                sequence: self.sequence,
            })
            .map_err(TraversalError::for_open_nodes)?;
        self.sequence += 1;
        Ok(())
    }

    /// Runs the propagation until the open set is empty or the visitor is done
    pub fn search(&mut self) -> TraversalResult {
        while !self.open.is_empty() {
            let node = self
                .open
                .delete_min()
                .map_err(TraversalError::for_open_nodes)?;
            let Some(triangle) = self.manager.triangle_ptr(node.triangle) else {
                continue;
            };

            self.closed
                .push_back(node.triangle)
                .map_err(TraversalError::for_closed_nodes)?;
            self.visitor.visit(&triangle, node.cost);
            if let Some(visited) = self.visited.as_mut() {
                visited
                    .push_back(node.triangle)
                    .map_err(TraversalError::for_visited_nodes)?;
            }
            if self.visitor.is_search_finished() {
                return Ok(());
            }

            for n in 0..3 {
                let half_edge = triangle.half_edge(n);
                let Some(pair) = half_edge.is_half_edge_crossable_with_pair(self.terrain_mask) else {
                    continue;
                };
                let neighbour = pair.triangle();
                let key = neighbour.key();
                if self.is_closed(&key) || self.is_open(&key) {
                    continue;
                }
                if !self.visitor.should_visit_triangle(&neighbour, Some(&half_edge)) {
                    continue;
                }
                let cost = self.visitor.compute_triangle_cost(&neighbour);
                self.push_open(key, cost)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav_mesh_types::{NavFloorKey, NAV_TERRAIN_TYPE_MASK_ALL};
    use crate::nav_ptr::NavHalfEdgePtr;
    use crate::test_mesh_helpers::*;
    use navmesh_common::{square_distance_point_to_triangle_2d, CellPos, Result, Vec3};

    /// Visits everything by distance to a point, optionally stopping after `limit` triangles
    struct DistanceVisitor {
        origin: Vec3,
        limit: usize,
        costs: Vec<f32>,
    }

    impl<'m> BestFirstSearchVisitor<'m> for DistanceVisitor {
        fn compute_triangle_cost(&mut self, triangle: &NavTrianglePtr<'m>) -> f32 {
            let [v0, v1, v2] = triangle.vertices();
            square_distance_point_to_triangle_2d(self.origin, v0, v1, v2)
        }

        fn visit(&mut self, _triangle: &NavTrianglePtr<'m>, cost: f32) {
            self.costs.push(cost);
        }

        fn is_search_finished(&self) -> bool {
            self.costs.len() >= self.limit
        }

        fn should_visit_triangle(
            &mut self,
            _triangle: &NavTrianglePtr<'m>,
            _via: Option<&NavHalfEdgePtr<'m>>,
        ) -> bool {
            true
        }
    }

    fn start_triangle(manager: &NavMeshManager, pos: Vec3) -> NavTrianglePtr<'_> {
        let cell = manager.stitched_cell_at(pos).expect("loaded cell");
        manager
            .cell_ptr(cell.idx())
            .and_then(|cell| cell.floor(0))
            .and_then(|floor| floor.triangles().find(|t| t.is_inside_2d(pos)))
            .expect("triangle under pos")
    }

    #[test]
    fn test_visits_every_triangle_in_cost_order() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(3, 3, 4.0, CellPos::ZERO)?);
        let origin = Vec3::new(1.0, 1.0, 0.0);
        let start = start_triangle(&manager, origin);

        let mut open = vec![PropagationNode::default(); 256];
        let mut closed = vec![NavTriangleKey::default(); 256];
        let mut visited = vec![NavTriangleKey::default(); 256];
        let visitor = DistanceVisitor {
            origin,
            limit: usize::MAX,
            costs: Vec::new(),
        };
        let mut traversal = BestFirstSearchTraversal::new(
            &manager,
            visitor,
            NAV_TERRAIN_TYPE_MASK_ALL,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        )
        .with_visited_nodes(FixedArray::new(&mut visited));
        traversal.set_start_triangle(start).expect("open set has room");
        traversal.search().expect("enough memory");

        // 9 cells of 8 triangles, all reachable through the stitched borders
        assert_eq!(traversal.closed_nodes().len(), 72);
        assert_eq!(traversal.visited_nodes(), traversal.closed_nodes());
        let costs = &traversal.visitor().costs;
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
        Ok(())
    }

    #[test]
    fn test_stops_when_visitor_is_done() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(2, 2, 4.0, CellPos::ZERO)?);
        let origin = Vec3::new(1.0, 1.0, 0.0);
        let start = start_triangle(&manager, origin);

        let mut open = vec![PropagationNode::default(); 64];
        let mut closed = vec![NavTriangleKey::default(); 64];
        let visitor = DistanceVisitor {
            origin,
            limit: 5,
            costs: Vec::new(),
        };
        let mut traversal = BestFirstSearchTraversal::new(
            &manager,
            visitor,
            NAV_TERRAIN_TYPE_MASK_ALL,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        );
        traversal.set_start_triangle(start).expect("open set has room");
        traversal.search().expect("enough memory");
        assert_eq!(traversal.closed_nodes().len(), 5);
        assert!(traversal.visited_nodes().is_empty());
        Ok(())
    }

    #[test]
    fn test_reports_lack_of_memory() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(2, 2, 4.0, CellPos::ZERO)?);
        let origin = Vec3::new(1.0, 1.0, 0.0);
        let start = start_triangle(&manager, origin);
        let new_visitor = || DistanceVisitor {
            origin,
            limit: usize::MAX,
            costs: Vec::new(),
        };

        let mut open = vec![PropagationNode::default(); 64];
        let mut closed = vec![NavTriangleKey::default(); 4];
        let mut traversal = BestFirstSearchTraversal::new(
            &manager,
            new_visitor(),
            NAV_TERRAIN_TYPE_MASK_ALL,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        );
        traversal.set_start_triangle(start).expect("open set has room");
        assert_eq!(traversal.search(), Err(TraversalError::LackOfMemoryForClosedNodes));

        let mut open = vec![PropagationNode::default(); 1];
        let mut closed = vec![NavTriangleKey::default(); 64];
        let mut traversal = BestFirstSearchTraversal::new(
            &manager,
            new_visitor(),
            NAV_TERRAIN_TYPE_MASK_ALL,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        );
        traversal.set_start_triangle(start).expect("open set has room");
        assert_eq!(traversal.search(), Err(TraversalError::LackOfMemoryForOpenNodes));

        let mut open: Vec<PropagationNode> = Vec::new();
        let mut closed = vec![NavTriangleKey::default(); 64];
        let mut traversal = BestFirstSearchTraversal::new(
            &manager,
            new_visitor(),
            NAV_TERRAIN_TYPE_MASK_ALL,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        );
        assert_eq!(
            traversal.set_start_triangle(start),
            Err(TraversalError::InvalidMemoryForOpenNodes)
        );
        Ok(())
    }

    #[test]
    fn test_terrain_mask_limits_propagation() -> Result<()> {
        let (manager, _) = create_manager_with(create_two_floor_mesh()?);
        let origin = Vec3::new(1.0, 5.0, 0.0);
        let start = start_triangle(&manager, origin);

        for (mask, expected) in [(0x1, 2), (0x3, 4)] {
            let mut open = vec![PropagationNode::default(); 16];
            let mut closed = vec![NavTriangleKey::default(); 16];
            let visitor = DistanceVisitor {
                origin,
                limit: usize::MAX,
                costs: Vec::new(),
            };
            let mut traversal = BestFirstSearchTraversal::new(
                &manager,
                visitor,
                mask,
                BinaryMinHeap::new(&mut open),
                FixedArray::new(&mut closed),
            );
            traversal.set_start_triangle(start).expect("open set has room");
            traversal.search().expect("enough memory");
            assert_eq!(traversal.closed_nodes().len(), expected);
        }
        Ok(())
    }

    #[test]
    fn test_start_outside_terrain_mask_visits_nothing() -> Result<()> {
        let (manager, _) = create_manager_with(create_two_floor_mesh()?);
        let start = manager
            .floor_ptr(NavFloorKey { cell: 0, floor: 1 })
            .and_then(|floor| floor.triangle(0))
            .expect("triangle on the 0x2 floor");

        let mut open = vec![PropagationNode::default(); 16];
        let mut closed = vec![NavTriangleKey::default(); 16];
        let visitor = DistanceVisitor {
            origin: Vec3::new(7.0, 5.0, 0.0),
            limit: usize::MAX,
            costs: Vec::new(),
        };
        let mut traversal = BestFirstSearchTraversal::new(
            &manager,
            visitor,
            0x1,
            BinaryMinHeap::new(&mut open),
            FixedArray::new(&mut closed),
        );
        traversal.set_start_triangle(start).expect("open set has room");
        traversal.search().expect("nothing to search");
        assert!(traversal.closed_nodes().is_empty());
        assert!(traversal.visitor().costs.is_empty());
        Ok(())
    }
}
