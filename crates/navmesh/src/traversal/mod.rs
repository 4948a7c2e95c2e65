//! Traversals over the triangles of the loaded NavMeshes
//!
//! A traversal owns the propagation (open set, closed set, optional record of visited
//! triangles) and delegates every decision to a visitor: which neighbour to enter, at
//! which cost, and when to stop. All working memory is borrowed from the caller through
//! the fixed-capacity containers, so a traversal never allocates.

mod best_first;
mod breadth_first;
mod connected_component;
mod edge_collision_visitor;
mod intersectors;

pub use best_first::BestFirstSearchTraversal;
pub use breadth_first::BreadthFirstSearchTraversal;
pub use connected_component::ConnectedComponentTraversal;
pub use edge_collision_visitor::{EdgeCollision, EdgeCollisionVisitor};
pub use intersectors::{
    CapsuleIntersector, EdgeIntersector, RayIntersector, SegmentIntersector, StaticDiskIntersector,
};

use std::cmp::Ordering;

use crate::nav_mesh_types::NavTriangleKey;
use crate::nav_ptr::{NavHalfEdgePtr, NavTrianglePtr};

/// Entry of the best-first open set
#[derive(Debug, Clone, Copy, Default)]
pub struct PropagationNode {
    pub triangle: NavTriangleKey,
    pub cost: f32,
    /// Insertion order, breaks ties between equal costs
    pub sequence: u32,
}

impl PartialEq for PropagationNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PropagationNode {}

impl PartialOrd for PropagationNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropagationNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Drives a [`BestFirstSearchTraversal`]
pub trait BestFirstSearchVisitor<'m> {
    /// Cost of a triangle about to enter the open set; lower is visited first
    fn compute_triangle_cost(&mut self, triangle: &NavTrianglePtr<'m>) -> f32;

    /// Called once per triangle, in order of increasing cost
    fn visit(&mut self, triangle: &NavTrianglePtr<'m>, cost: f32);

    fn is_search_finished(&self) -> bool;

    /// Whether `triangle`, reached through `via` (`None` for the start), enters the open set
    fn should_visit_triangle(
        &mut self,
        triangle: &NavTrianglePtr<'m>,
        via: Option<&NavHalfEdgePtr<'m>>,
    ) -> bool;
}

/// Drives a [`BreadthFirstSearchTraversal`]
pub trait BreadthFirstSearchVisitor<'m> {
    fn visit(&mut self, triangle: &NavTrianglePtr<'m>);

    fn is_search_finished(&self) -> bool;

    fn should_visit_triangle(
        &mut self,
        triangle: &NavTrianglePtr<'m>,
        via: Option<&NavHalfEdgePtr<'m>>,
    ) -> bool;
}
