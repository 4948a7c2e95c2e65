use crate::containers::{FixedArray, FixedDeque};
use crate::nav_mesh_manager::NavMeshManager;
use crate::nav_mesh_types::{is_terrain_type_compliant, NavTerrainTypeMask, NavTriangleKey};
use crate::nav_ptr::NavTrianglePtr;
use crate::status::{TraversalError, TraversalResult};

use super::BreadthFirstSearchVisitor;

/// Visits triangles ring by ring from the start triangle
pub struct BreadthFirstSearchTraversal<'m, 'b, V> {
    manager: &'m NavMeshManager,
    visitor: V,
    terrain_mask: NavTerrainTypeMask,
    open: FixedDeque<'b, NavTriangleKey>,
    closed: FixedArray<'b, NavTriangleKey>,
    visited: Option<FixedArray<'b, NavTriangleKey>>,
}

impl<'m, 'b, V: BreadthFirstSearchVisitor<'m>> BreadthFirstSearchTraversal<'m, 'b, V> {
    pub fn new(
        manager: &'m NavMeshManager,
        visitor: V,
        terrain_mask: NavTerrainTypeMask,
        open: FixedDeque<'b, NavTriangleKey>,
        closed: FixedArray<'b, NavTriangleKey>,
    ) -> Self {
        Self {
            manager,
            visitor,
            terrain_mask,
            open,
            closed,
            visited: None,
        }
    }

    pub fn with_visited_nodes(mut self, visited: FixedArray<'b, NavTriangleKey>) -> Self {
        self.visited = Some(visited);
        self
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
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

    /// Resets the search from `start`; a start outside the terrain mask leaves nothing to visit
    pub fn set_start_triangle(&mut self, start: NavTrianglePtr<'m>) -> TraversalResult {
        self.open.clear();
        self.closed.clear();
        if let Some(visited) = self.visited.as_mut() {
            visited.clear();
        }
        if !is_terrain_type_compliant(self.terrain_mask, start.terrain_type())
            || !self.visitor.should_visit_triangle(&start, None)
        {
            return Ok(());
        }
        self.open
            .push_back(start.key())
            .map_err(TraversalError::for_open_nodes)
    }

    pub fn search(&mut self) -> TraversalResult {
        while !self.open.is_empty() {
            let key = self
                .open
                .pop_front()
                .map_err(TraversalError::for_open_nodes)?;
            let Some(triangle) = self.manager.triangle_ptr(key) else {
                continue;
            };

            self.closed
                .push_back(key)
                .map_err(TraversalError::for_closed_nodes)?;
            self.visitor.visit(&triangle);
            if let Some(visited) = self.visited.as_mut() {
                visited
                    .push_back(key)
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
                let neighbour_key = neighbour.key();
                if self.closed.contains(&neighbour_key) || self.open.contains(&neighbour_key) {
                    continue;
                }
                if !self.visitor.should_visit_triangle(&neighbour, Some(&half_edge)) {
                    continue;
                }
                self.open
                    .push_back(neighbour_key)
                    .map_err(TraversalError::for_open_nodes)?;
            }
        }
        Ok(())
    }
}
