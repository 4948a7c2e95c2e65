//! Runtime wrappers around loaded cells and meshes
//!
//! A [`StitchedNavCell`] adds to an immutable [`NavCell`] the state that depends on what else
//! is loaded: the links of its boundary half-edges to the neighbour cells and the connected
//! component of each of its floors.

use std::sync::Arc;

use navmesh_common::{square_distance_2d, CellPos};

use crate::config::StitchConfig;
use crate::nav_cell::NavCell;
use crate::nav_mesh::NavMesh;
use crate::nav_mesh_manager::NavMeshId;
use crate::nav_mesh_types::{CardinalDir, StitchedCellIdx, UNSET_IDX};

/// Target of a stitched CELL_BOUNDARY half-edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBoundaryLink {
    pub cell: StitchedCellIdx,
    pub floor_idx: u32,
    pub half_edge_idx: u32,
}

#[derive(Debug, Clone)]
pub struct StitchedNavCell {
    pub(crate) mesh: Arc<NavMesh>,
    pub(crate) mesh_id: NavMeshId,
    /// Index of the cell in its mesh
    pub(crate) cell_idx: u32,
    /// Slot of this cell in the manager
    pub(crate) idx: StitchedCellIdx,
    /// One entry per boundary edge of the cell, per direction
    pub(crate) links: [Vec<Option<CellBoundaryLink>>; 4],
    pub(crate) floor_components: Vec<u32>,
}

impl StitchedNavCell {
    pub(crate) fn new(
        mesh: Arc<NavMesh>,
        mesh_id: NavMeshId,
        cell_idx: u32,
        idx: StitchedCellIdx,
    ) -> Self {
        let cell = mesh.cell(cell_idx);
        let links = CardinalDir::ALL.map(|dir| vec![None; cell.boundary_edges(dir).len()]);
        let floor_components = vec![UNSET_IDX; cell.floors.len()];
        Self {
            mesh,
            mesh_id,
            cell_idx,
            idx,
            links,
            floor_components,
        }
    }

    #[inline]
    pub fn nav_cell(&self) -> &NavCell {
        self.mesh.cell(self.cell_idx)
    }

    pub fn cell_pos(&self) -> CellPos {
        self.nav_cell().cell_pos
    }

    pub fn mesh(&self) -> &Arc<NavMesh> {
        &self.mesh
    }

    pub fn mesh_id(&self) -> NavMeshId {
        self.mesh_id
    }

    pub fn cell_idx(&self) -> u32 {
        self.cell_idx
    }

    pub fn idx(&self) -> StitchedCellIdx {
        self.idx
    }

    pub fn link(&self, dir: CardinalDir, boundary_idx: u32) -> Option<CellBoundaryLink> {
        self.links[dir.index()]
            .get(boundary_idx as usize)
            .copied()
            .flatten()
    }

    /// Number of boundary edges linked to a neighbour
    pub fn linked_edge_count(&self) -> usize {
        self.links.iter().flatten().filter(|link| link.is_some()).count()
    }

    /// Connected component of a floor, [`UNSET_IDX`] until computed
    pub fn connected_component(&self, floor_idx: u32) -> u32 {
        self.floor_components
            .get(floor_idx as usize)
            .copied()
            .unwrap_or(UNSET_IDX)
    }

    pub(crate) fn clear_links(&mut self, dir: CardinalDir) {
        self.links[dir.index()].iter_mut().for_each(|link| *link = None);
    }
}

/// Pairs `(i, j)` of matching boundary edges: edge `i` of `cell` toward `dir` runs along
/// edge `j` of `neighbour` toward the opposite direction, with reversed endpoints
pub(crate) fn compute_stitch_pairs(
    cell: &StitchedNavCell,
    neighbour: &StitchedNavCell,
    dir: CardinalDir,
    config: &StitchConfig,
) -> Vec<(usize, usize)> {
    let tolerance_sq = config.vertex_tolerance * config.vertex_tolerance;
    let matches = |a: navmesh_common::Vec3, b: navmesh_common::Vec3| {
        square_distance_2d(a, b) <= tolerance_sq && (a.z - b.z).abs() <= config.altitude_tolerance
    };

    let nav_cell = cell.nav_cell();
    let other_cell = neighbour.nav_cell();
    let others = other_cell.boundary_edges(dir.opposite());

    let mut pairs = Vec::new();
    for (i, edge) in nav_cell.boundary_edges(dir).iter().enumerate() {
        let floor = nav_cell.floor(edge.floor_idx);
        let start = floor.start_vertex(edge.half_edge_idx);
        let end = floor.end_vertex(edge.half_edge_idx);

        let found = others.iter().position(|other| {
            let other_floor = other_cell.floor(other.floor_idx);
            matches(start, other_floor.end_vertex(other.half_edge_idx))
                && matches(end, other_floor.start_vertex(other.half_edge_idx))
        });
        if let Some(j) = found {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Slot of a mesh in the manager
#[derive(Debug, Clone)]
pub(crate) struct StitchedNavMesh {
    pub(crate) mesh: Arc<NavMesh>,
    pub(crate) salt: u32,
    /// Manager slot of each cell of the mesh, `None` while the cell is not loaded
    pub(crate) stitched_cells: Vec<Option<StitchedCellIdx>>,
}

impl StitchedNavMesh {
    pub(crate) fn loaded_cell_count(&self) -> usize {
        self.stitched_cells.iter().filter(|c| c.is_some()).count()
    }
}
