//! Floors: connected patches of triangles sharing one terrain type inside a cell

use navmesh_common::{Box3f, Error, Result, Vec3};

use crate::nav_half_edge::{
    half_edge_idx_to_triangle_idx, next_half_edge_idx, prev_half_edge_idx,
    triangle_idx_to_half_edge_idx, HalfEdgeKind, NavHalfEdge,
};
use crate::nav_mesh_types::{FloorLink, NavTerrainType};

/// Flat vertex, half-edge and link arrays of one floor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavFloor {
    pub aabb: Box3f,
    pub vertices: Vec<Vec3>,
    /// Three half-edges per triangle
    pub half_edges: Vec<NavHalfEdge>,
    /// Indexed by the payload of FLOOR_BOUNDARY half-edges
    pub floor_links: Vec<FloorLink>,
    pub terrain_type: NavTerrainType,
}

impl NavFloor {
    pub fn triangle_count(&self) -> u32 {
        (self.half_edges.len() / 3) as u32
    }

    pub fn half_edge_count(&self) -> u32 {
        self.half_edges.len() as u32
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[inline]
    pub fn half_edge(&self, half_edge_idx: u32) -> &NavHalfEdge {
        &self.half_edges[half_edge_idx as usize]
    }

    #[inline]
    pub fn vertex(&self, vertex_idx: u32) -> Vec3 {
        self.vertices[vertex_idx as usize]
    }

    #[inline]
    pub fn start_vertex_idx(&self, half_edge_idx: u32) -> u32 {
        self.half_edge(half_edge_idx).start_vertex_idx
    }

    #[inline]
    pub fn end_vertex_idx(&self, half_edge_idx: u32) -> u32 {
        self.half_edge(next_half_edge_idx(half_edge_idx)).start_vertex_idx
    }

    /// Vertex of the triangle that is not on the half-edge
    #[inline]
    pub fn third_vertex_idx(&self, half_edge_idx: u32) -> u32 {
        self.half_edge(prev_half_edge_idx(half_edge_idx)).start_vertex_idx
    }

    pub fn start_vertex(&self, half_edge_idx: u32) -> Vec3 {
        self.vertex(self.start_vertex_idx(half_edge_idx))
    }

    pub fn end_vertex(&self, half_edge_idx: u32) -> Vec3 {
        self.vertex(self.end_vertex_idx(half_edge_idx))
    }

    pub fn triangle_vertex_indices(&self, triangle_idx: u32) -> [u32; 3] {
        [0, 1, 2].map(|n| self.start_vertex_idx(triangle_idx_to_half_edge_idx(triangle_idx, n)))
    }

    pub fn triangle_vertices(&self, triangle_idx: u32) -> [Vec3; 3] {
        self.triangle_vertex_indices(triangle_idx).map(|v| self.vertex(v))
    }

    /// Recomputes the bounding box from the vertices
    pub fn compute_aabb(&mut self) {
        let mut aabb = Box3f::empty();
        for v in &self.vertices {
            aabb.expand(*v);
        }
        self.aabb = aabb;
    }

    /// Checks that every index stored in the floor is in range and that paired half-edges
    /// form an involution between reversed edges
    pub fn validate(&self) -> Result<()> {
        if self.half_edges.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "floor has {} half-edges, not a multiple of 3",
                self.half_edges.len()
            )));
        }

        let vertex_count = self.vertex_count();
        let half_edge_count = self.half_edge_count();
        for (idx, half_edge) in self.half_edges.iter().enumerate() {
            let idx = idx as u32;
            if half_edge.start_vertex_idx >= vertex_count {
                return Err(Error::InvalidMesh(format!(
                    "half-edge {} starts at vertex {} out of {}",
                    idx, half_edge.start_vertex_idx, vertex_count
                )));
            }
            match half_edge.kind() {
                HalfEdgeKind::Paired(pair) => {
                    if pair >= half_edge_count
                        || half_edge_idx_to_triangle_idx(pair) == half_edge_idx_to_triangle_idx(idx)
                    {
                        return Err(Error::InvalidMesh(format!(
                            "half-edge {} has an invalid pair {}",
                            idx, pair
                        )));
                    }
                    if self.half_edge(pair).kind() != HalfEdgeKind::Paired(idx) {
                        return Err(Error::InvalidMesh(format!(
                            "half-edge {} and {} are not paired both ways",
                            idx, pair
                        )));
                    }
                    if self.start_vertex_idx(pair) != self.end_vertex_idx(idx)
                        || self.end_vertex_idx(pair) != self.start_vertex_idx(idx)
                    {
                        return Err(Error::InvalidMesh(format!(
                            "paired half-edges {} and {} do not share their vertices",
                            idx, pair
                        )));
                    }
                }
                HalfEdgeKind::Obstacle(next) => {
                    if next >= half_edge_count {
                        return Err(Error::InvalidMesh(format!(
                            "obstacle half-edge {} links to {}",
                            idx, next
                        )));
                    }
                }
                HalfEdgeKind::FloorBoundary(link) => {
                    if link as usize >= self.floor_links.len() {
                        return Err(Error::InvalidMesh(format!(
                            "floor boundary half-edge {} uses link {} out of {}",
                            idx,
                            link,
                            self.floor_links.len()
                        )));
                    }
                }
                // Checked by the owning cell
                HalfEdgeKind::CellBoundary { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mesh_helpers::flat_square_floor;

    #[test]
    fn test_triangle_accessors() -> Result<()> {
        let floor = flat_square_floor(10.0, 0x1);
        floor.validate()?;
        assert_eq!(floor.triangle_count(), 2);

        for idx in 0..floor.half_edge_count() {
            let next = next_half_edge_idx(idx);
            assert_eq!(floor.end_vertex_idx(idx), floor.start_vertex_idx(next));
            assert_eq!(floor.third_vertex_idx(idx), floor.end_vertex_idx(next));
        }
        Ok(())
    }

    #[test]
    fn test_pairing_is_an_involution() {
        let floor = flat_square_floor(10.0, 0x1);
        let mut paired = 0;
        for idx in 0..floor.half_edge_count() {
            if let HalfEdgeKind::Paired(pair) = floor.half_edge(idx).kind() {
                assert_eq!(floor.half_edge(pair).kind(), HalfEdgeKind::Paired(idx));
                assert_eq!(floor.start_vertex(pair), floor.end_vertex(idx));
                assert_eq!(floor.end_vertex(pair), floor.start_vertex(idx));
                paired += 1;
            }
        }
        assert_eq!(paired, 2);
    }

    #[test]
    fn test_broken_pair_is_rejected() {
        let mut floor = flat_square_floor(10.0, 0x1);
        let idx = (0..floor.half_edge_count())
            .find(|&i| matches!(floor.half_edge(i).kind(), HalfEdgeKind::Paired(_)))
            .unwrap();
        floor.half_edges[idx as usize].set_kind(HalfEdgeKind::Paired(idx));
        assert!(floor.validate().is_err());
    }
}
