//! NavMesh manager: the runtime world made of every loaded mesh
//!
//! Loaded cells are kept in a slab of [`StitchedNavCell`] indexed by [`StitchedCellIdx`].
//! Several meshes may load a cell at the same [`CellPos`]: every loaded cell is a version of
//! its position, and only the last inserted version is active. The [`NavCellGrid`] references
//! the active versions, and only those are stitched. Inserting a cell deactivates the version
//! it replaces; removing the active version reactivates the previous one.
//!
//! Several insertions (or removals) can be grouped between `start_multiple_*` and
//! `end_multiple_*`: the ruler rebuild and the stitching are then done once at the end.
//! Queries must not run while a batch is open.

use std::collections::HashMap;
use std::sync::Arc;

use navmesh_common::{to_2d, CellBox, CellPos, Vec3};

use crate::config::StitchConfig;
use crate::containers::FixedDeque;
use crate::nav_cell::NavCell;
use crate::nav_cell_grid::NavCellGrid;
use crate::nav_mesh::NavMesh;
use crate::nav_mesh_types::{
    CardinalDir, NavFloorKey, NavTriangleKey, StitchedCellIdx, UNSET_IDX,
};
use crate::nav_ptr::{NavCellPtr, NavFloorPtr, NavTrianglePtr};
use crate::stitched::{compute_stitch_pairs, CellBoundaryLink, StitchedNavCell, StitchedNavMesh};
use crate::status::{NavMeshManagerError, TraversalError};
use crate::traversal::ConnectedComponentTraversal;

/// Identifies a mesh inserted in a [`NavMeshManager`].
///
/// The salt changes every time a slot is reused, so an id kept after its mesh has been
/// removed never resolves to another mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavMeshId {
    pub(crate) index: u32,
    pub(crate) salt: u32,
}

impl NavMeshId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn salt(&self) -> u32 {
        self.salt
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LoadedParams {
    cell_size: f32,
    entity_radius: f32,
    entity_height: f32,
}

impl LoadedParams {
    fn of(mesh: &NavMesh) -> Self {
        Self {
            cell_size: mesh.cell_size,
            entity_radius: mesh.generation_params.entity_radius,
            entity_height: mesh.generation_params.entity_height,
        }
    }
}

#[derive(Debug)]
pub struct NavMeshManager {
    meshes: Vec<Option<StitchedNavMesh>>,
    next_salt: u32,
    cells: Vec<Option<StitchedNavCell>>,
    free_cells: Vec<StitchedCellIdx>,
    /// Loaded versions per cell position, the active one last
    versions: HashMap<CellPos, Vec<StitchedCellIdx>>,
    grid: NavCellGrid,
    stitch_config: StitchConfig,
    params: Option<LoadedParams>,
    in_multiple_insertion: bool,
    in_multiple_removal: bool,
    /// Cells inserted since the last stitching pass
    pending_stitch: Vec<StitchedCellIdx>,
    rulers_dirty: bool,
    component_count: Option<u32>,
    /// Connected component memory, reused from one computation to the next
    component_memory: ComponentMemory,
}

#[derive(Debug, Default)]
struct ComponentMemory {
    open: Vec<NavFloorKey>,
    offsets: Vec<u32>,
    labels: Vec<u32>,
}

impl Default for NavMeshManager {
    fn default() -> Self {
        Self::new(StitchConfig::default())
    }
}

impl NavMeshManager {
    pub fn new(stitch_config: StitchConfig) -> Self {
        Self {
            meshes: Vec::new(),
            next_salt: 1,
            cells: Vec::new(),
            free_cells: Vec::new(),
            versions: HashMap::new(),
            grid: NavCellGrid::default(),
            stitch_config,
            params: None,
            in_multiple_insertion: false,
            in_multiple_removal: false,
            pending_stitch: Vec::new(),
            rulers_dirty: false,
            component_count: None,
            component_memory: ComponentMemory::default(),
        }
    }

    pub fn stitch_config(&self) -> &StitchConfig {
        &self.stitch_config
    }

    // Mesh level

    /// Inserts every cell of `mesh` and stitches them to the loaded neighbours.
    ///
    /// A cell landing on a position already loaded by another mesh becomes the active version
    /// of that position.
    pub fn add_nav_mesh(&mut self, mesh: Arc<NavMesh>) -> Result<NavMeshId, NavMeshManagerError> {
        if mesh.validate().is_err() || mesh.cell_size <= 0.0 {
            log::warn!("Rejecting invalid NavMesh");
            return Err(NavMeshManagerError::InvalidNavMesh);
        }
        if !self.is_compatible_with(&mesh) {
            log::warn!(
                "Rejecting NavMesh generated with cell size {} radius {} height {}",
                mesh.cell_size,
                mesh.generation_params.entity_radius,
                mesh.generation_params.entity_height
            );
            return Err(NavMeshManagerError::InvalidNavMesh);
        }
        if self
            .meshes
            .iter()
            .flatten()
            .any(|loaded| Arc::ptr_eq(&loaded.mesh, &mesh))
        {
            return Err(NavMeshManagerError::NavMeshAlreadyLoaded);
        }
        let id = self.allocate_mesh_slot(Arc::clone(&mesh));
        if self.params.is_none() {
            self.params = Some(LoadedParams::of(&mesh));
            self.grid.set_cell_size(mesh.cell_size);
        }
        self.grid.ensure_contains(&mesh.cell_box);
        for cell_idx in 0..mesh.cell_count() {
            self.insert_cell(id, cell_idx);
        }
        log::debug!(
            "NavMesh {:?} inserted: {} cells, {} triangles",
            id,
            mesh.cell_count(),
            mesh.triangle_count()
        );
        self.update_if_not_batched();
        Ok(id)
    }

    /// Removes every loaded cell of the mesh and frees its slot
    pub fn remove_nav_mesh(&mut self, id: NavMeshId) -> Result<(), NavMeshManagerError> {
        let stitched_cells = match self.mesh_slot(id) {
            Some(slot) => slot.stitched_cells.clone(),
            None => return Err(NavMeshManagerError::NavMeshNotLoaded),
        };
        for idx in stitched_cells.into_iter().flatten() {
            self.remove_cell(idx);
        }
        self.meshes[id.index as usize] = None;
        log::debug!("NavMesh {:?} removed", id);

        if self.number_of_inserted_nav_meshes() == 0 {
            self.params = None;
            self.grid.reset();
            self.cells.clear();
            self.free_cells.clear();
            self.versions.clear();
            self.pending_stitch.clear();
            self.rulers_dirty = false;
            self.component_count = None;
        } else {
            self.update_if_not_batched();
        }
        Ok(())
    }

    /// Inserts one cell of an already inserted mesh
    pub fn add_nav_cell(&mut self, id: NavMeshId, cell_pos: CellPos) -> Result<(), NavMeshManagerError> {
        let slot = self.mesh_slot(id).ok_or(NavMeshManagerError::NavMeshNotLoaded)?;
        let cell_idx = slot
            .mesh
            .cell_idx(cell_pos)
            .ok_or(NavMeshManagerError::InvalidNavCell)?;
        if slot.stitched_cells[cell_idx as usize].is_some() {
            return Err(NavMeshManagerError::NavCellAlreadyLoaded);
        }
        self.grid.ensure_contains(&CellBox::new(cell_pos, cell_pos));
        self.insert_cell(id, cell_idx);
        self.update_if_not_batched();
        Ok(())
    }

    /// Removes one cell; the mesh stays inserted even with no cell left
    pub fn remove_nav_cell(&mut self, id: NavMeshId, cell_pos: CellPos) -> Result<(), NavMeshManagerError> {
        let slot = self.mesh_slot(id).ok_or(NavMeshManagerError::NavMeshNotLoaded)?;
        let cell_idx = slot
            .mesh
            .cell_idx(cell_pos)
            .ok_or(NavMeshManagerError::InvalidNavCell)?;
        let idx = slot.stitched_cells[cell_idx as usize].ok_or(NavMeshManagerError::NavCellNotLoaded)?;

        self.remove_cell(idx);
        self.update_if_not_batched();
        Ok(())
    }

    pub fn start_multiple_insertion(&mut self) {
        self.in_multiple_insertion = true;
    }

    pub fn end_multiple_insertion(&mut self) {
        self.in_multiple_insertion = false;
        self.update_if_not_batched();
    }

    pub fn start_multiple_removal(&mut self) {
        self.in_multiple_removal = true;
    }

    pub fn end_multiple_removal(&mut self) {
        self.in_multiple_removal = false;
        self.update_if_not_batched();
    }

    fn allocate_mesh_slot(&mut self, mesh: Arc<NavMesh>) -> NavMeshId {
        let salt = self.next_salt;
        self.next_salt = self.next_salt.wrapping_add(1).max(1);
        let slot = StitchedNavMesh {
            stitched_cells: vec![None; mesh.cells.len()],
            mesh,
            salt,
        };

        let index = match self.meshes.iter().position(Option::is_none) {
            Some(index) => {
                self.meshes[index] = Some(slot);
                index
            }
            None => {
                self.meshes.push(Some(slot));
                self.meshes.len() - 1
            }
        };
        NavMeshId {
            index: index as u32,
            salt,
        }
    }

    fn mesh_slot(&self, id: NavMeshId) -> Option<&StitchedNavMesh> {
        self.meshes
            .get(id.index as usize)?
            .as_ref()
            .filter(|slot| slot.salt == id.salt)
    }

    // Cell level

    fn insert_cell(&mut self, id: NavMeshId, cell_idx: u32) {
        let Some(mesh) = self.mesh_slot(id).map(|slot| Arc::clone(&slot.mesh)) else {
            return;
        };
        let cell_pos = mesh.cell(cell_idx).cell_pos;

        let idx = match self.free_cells.pop() {
            Some(idx) => idx,
            None => {
                self.cells.push(None);
                (self.cells.len() - 1) as StitchedCellIdx
            }
        };
        self.cells[idx as usize] = Some(StitchedNavCell::new(mesh, id, cell_idx, idx));
        if let Some(Some(slot)) = self.meshes.get_mut(id.index as usize) {
            slot.stitched_cells[cell_idx as usize] = Some(idx);
        }

        if let Some(previous) = self.grid.get(cell_pos) {
            log::debug!(
                "NavCell {:?} of {:?} replaces the active version of cell {:?}",
                cell_idx,
                id,
                cell_pos
            );
            self.unstitch_active(cell_pos);
            self.pending_stitch.retain(|&pending| pending != previous);
        }
        self.versions.entry(cell_pos).or_default().push(idx);
        self.activate(cell_pos, Some(idx));
    }

    fn remove_cell(&mut self, idx: StitchedCellIdx) {
        let Some(cell_pos) = self.stitched_cell_by_idx(idx).map(StitchedNavCell::cell_pos) else {
            return;
        };
        let was_active = self.grid.get(cell_pos) == Some(idx);
        if was_active {
            self.unstitch_active(cell_pos);
        }
        let Some(cell) = self.cells.get_mut(idx as usize).and_then(Option::take) else {
            return;
        };
        if let Some(Some(slot)) = self.meshes.get_mut(cell.mesh_id.index as usize) {
            slot.stitched_cells[cell.cell_idx as usize] = None;
        }

        let mut fallback = None;
        if let Some(versions) = self.versions.get_mut(&cell_pos) {
            versions.retain(|&version| version != idx);
            fallback = versions.last().copied();
            if versions.is_empty() {
                self.versions.remove(&cell_pos);
            }
        }
        self.pending_stitch.retain(|&pending| pending != idx);
        self.free_cells.push(idx);

        if was_active {
            if fallback.is_some() {
                log::debug!("Cell {:?} falls back to a previous version", cell_pos);
            }
            self.activate(cell_pos, fallback);
        }
    }

    /// Makes `idx` the active version of `cell_pos`, to be stitched at the next update
    fn activate(&mut self, cell_pos: CellPos, idx: Option<StitchedCellIdx>) {
        self.grid.set(cell_pos, idx);
        if let Some(idx) = idx {
            self.pending_stitch.push(idx);
        }
        self.rulers_dirty = true;
        self.component_count = None;
    }

    /// Clears the links of the active version of `cell_pos` and the links pointing to it
    fn unstitch_active(&mut self, cell_pos: CellPos) {
        let Some(active) = self.grid.get(cell_pos) else {
            return;
        };
        for dir in CardinalDir::ALL {
            if let Some(Some(cell)) = self.cells.get_mut(active as usize) {
                cell.clear_links(dir);
            }
            if let Some(neighbour) = self.grid.get(cell_pos + dir.offset()) {
                if let Some(Some(neighbour)) = self.cells.get_mut(neighbour as usize) {
                    neighbour.clear_links(dir.opposite());
                }
            }
        }
    }

    fn update_if_not_batched(&mut self) {
        if self.in_multiple_insertion || self.in_multiple_removal {
            return;
        }
        if self.rulers_dirty {
            let cells = self
                .stitched_cells()
                .map(|cell| (cell.cell_pos(), cell.nav_cell().aabb))
                .collect::<Vec<_>>();
            self.grid.rebuild_rulers(cells);
            self.rulers_dirty = false;
            log::debug!(
                "Cell grid updated: {} cells loaded in {:?}",
                self.grid.occupied_count(),
                self.grid.cell_box()
            );
        }

        let pending = std::mem::take(&mut self.pending_stitch);
        for idx in pending {
            self.stitch_cell(idx);
        }
    }

    /// Links the boundary half-edges of a cell with the four neighbour cells
    fn stitch_cell(&mut self, idx: StitchedCellIdx) {
        let Some(cell) = self.stitched_cell_by_idx(idx) else {
            return;
        };
        let cell_pos = cell.cell_pos();

        for dir in CardinalDir::ALL {
            let Some(neighbour_idx) = self.grid.get(cell_pos + dir.offset()) else {
                continue;
            };
            let links = match (self.stitched_cell_by_idx(idx), self.stitched_cell_by_idx(neighbour_idx)) {
                (Some(cell), Some(neighbour)) => {
                    let pairs = compute_stitch_pairs(cell, neighbour, dir, &self.stitch_config);
                    let edges = cell.nav_cell().boundary_edges(dir);
                    let other_edges = neighbour.nav_cell().boundary_edges(dir.opposite());
                    pairs
                        .into_iter()
                        .map(|(i, j)| {
                            let to_neighbour = CellBoundaryLink {
                                cell: neighbour_idx,
                                floor_idx: other_edges[j].floor_idx,
                                half_edge_idx: other_edges[j].half_edge_idx,
                            };
                            let to_cell = CellBoundaryLink {
                                cell: idx,
                                floor_idx: edges[i].floor_idx,
                                half_edge_idx: edges[i].half_edge_idx,
                            };
                            (i, to_neighbour, j, to_cell)
                        })
                        .collect::<Vec<_>>()
                }
                _ => continue,
            };

            if let Some(Some(cell)) = self.cells.get_mut(idx as usize) {
                cell.clear_links(dir);
                for &(i, to_neighbour, _, _) in &links {
                    cell.links[dir.index()][i] = Some(to_neighbour);
                }
            }
            if let Some(Some(neighbour)) = self.cells.get_mut(neighbour_idx as usize) {
                neighbour.clear_links(dir.opposite());
                for &(_, _, j, to_cell) in &links {
                    neighbour.links[dir.opposite().index()][j] = Some(to_cell);
                }
            }
        }
    }

    // Accessors

    pub fn number_of_inserted_nav_meshes(&self) -> usize {
        self.meshes.iter().flatten().count()
    }

    /// The `n`-th inserted mesh, in slot order
    pub fn inserted_nav_mesh(&self, n: usize) -> Option<(NavMeshId, &Arc<NavMesh>)> {
        self.meshes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slot| (index, slot)))
            .nth(n)
            .map(|(index, slot)| {
                (
                    NavMeshId {
                        index: index as u32,
                        salt: slot.salt,
                    },
                    &slot.mesh,
                )
            })
    }

    pub fn nav_mesh(&self, id: NavMeshId) -> Option<&Arc<NavMesh>> {
        self.mesh_slot(id).map(|slot| &slot.mesh)
    }

    pub fn is_nav_mesh_loaded(&self, id: NavMeshId) -> bool {
        self.mesh_slot(id).is_some()
    }

    /// Number of cells of the mesh currently inserted
    pub fn loaded_cell_count(&self, id: NavMeshId) -> usize {
        self.mesh_slot(id).map_or(0, StitchedNavMesh::loaded_cell_count)
    }

    /// Manager slot of a cell given by its mesh and its index in the mesh
    pub fn stitched_cell_idx_of(&self, id: NavMeshId, cell_idx: u32) -> Option<StitchedCellIdx> {
        self.mesh_slot(id)?
            .stitched_cells
            .get(cell_idx as usize)
            .copied()
            .flatten()
    }

    pub fn cell_box(&self) -> CellBox {
        *self.grid.cell_box()
    }

    /// Cell size shared by the loaded meshes, 0 when empty
    pub fn cell_size(&self) -> f32 {
        self.params.map_or(0.0, |p| p.cell_size)
    }

    pub fn generation_radius(&self) -> f32 {
        self.params.map_or(0.0, |p| p.entity_radius)
    }

    pub fn generation_height(&self) -> f32 {
        self.params.map_or(0.0, |p| p.entity_height)
    }

    /// True if `mesh` has been generated with the same cell size and entity as the loaded meshes
    pub fn is_compatible_with(&self, mesh: &NavMesh) -> bool {
        match self.params {
            Some(params) => params == LoadedParams::of(mesh),
            None => true,
        }
    }

    pub fn grid(&self) -> &NavCellGrid {
        &self.grid
    }

    pub fn compute_nav_cell_pos(&self, pos: Vec3) -> CellPos {
        self.grid.compute_nav_cell_pos(to_2d(pos))
    }

    pub fn stitched_cell(&self, cell_pos: CellPos) -> Option<&StitchedNavCell> {
        self.grid
            .get(cell_pos)
            .and_then(|idx| self.stitched_cell_by_idx(idx))
    }

    pub fn stitched_cell_by_idx(&self, idx: StitchedCellIdx) -> Option<&StitchedNavCell> {
        self.cells.get(idx as usize)?.as_ref()
    }

    /// Cell owning the position, following the half-open cell convention
    pub fn stitched_cell_at(&self, pos: Vec3) -> Option<&StitchedNavCell> {
        self.stitched_cell(self.compute_nav_cell_pos(pos))
    }

    pub fn nav_cell(&self, cell_pos: CellPos) -> Option<&NavCell> {
        self.stitched_cell(cell_pos).map(StitchedNavCell::nav_cell)
    }

    /// Every active cell
    pub fn stitched_cells(&self) -> impl Iterator<Item = &StitchedNavCell> + '_ {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| self.is_active(cell.idx()))
    }

    pub fn stitched_cell_count(&self) -> usize {
        self.stitched_cells().count()
    }

    /// True if the cell is the active version of its position
    pub fn is_active(&self, idx: StitchedCellIdx) -> bool {
        self.stitched_cell_by_idx(idx)
            .is_some_and(|cell| self.grid.get(cell.cell_pos()) == Some(idx))
    }

    /// Loaded versions of a cell position, from the oldest to the active one
    pub fn cell_versions(&self, cell_pos: CellPos) -> &[StitchedCellIdx] {
        self.versions.get(&cell_pos).map_or(&[], Vec::as_slice)
    }

    /// Size of the cell slab, an upper bound of every [`StitchedCellIdx`]
    pub fn stitched_cell_capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn total_floor_count(&self) -> usize {
        self.stitched_cells()
            .map(|cell| cell.nav_cell().floors.len())
            .sum()
    }

    /// Handle on an active cell
    pub fn cell_ptr(&self, idx: StitchedCellIdx) -> Option<NavCellPtr<'_>> {
        self.stitched_cell_by_idx(idx)
            .filter(|_| self.is_active(idx))
            .map(|cell| NavCellPtr::new(self, cell))
    }

    pub fn floor_ptr(&self, key: NavFloorKey) -> Option<NavFloorPtr<'_>> {
        self.cell_ptr(key.cell)?.floor(key.floor)
    }

    pub fn triangle_ptr(&self, key: NavTriangleKey) -> Option<NavTrianglePtr<'_>> {
        self.floor_ptr(key.floor_key())?.triangle(key.triangle)
    }

    // Connected components

    /// Labels every loaded floor with its connected component and returns the component count.
    ///
    /// Two floors are connected when a FLOOR_BOUNDARY or a stitched CELL_BOUNDARY half-edge
    /// joins them, whatever their terrain types.
    pub fn compute_connected_components(&mut self) -> Result<u32, TraversalError> {
        let mut memory = std::mem::take(&mut self.component_memory);
        let (offset_count, label_count) = ConnectedComponentTraversal::memory_for(self);
        memory.open.clear();
        memory.open.resize(
            FixedDeque::<NavFloorKey>::slots_for(label_count),
            NavFloorKey::default(),
        );
        memory.offsets.clear();
        memory.offsets.resize(offset_count, UNSET_IDX);
        memory.labels.clear();
        memory.labels.resize(label_count, UNSET_IDX);

        let outcome = ConnectedComponentTraversal::new(
            self,
            FixedDeque::new(&mut memory.open),
            &mut memory.offsets,
            &mut memory.labels,
        )
        .search();
        if let Ok(count) = outcome {
            for (cell, &offset) in self.cells.iter_mut().zip(&memory.offsets) {
                let Some(cell) = cell else {
                    continue;
                };
                if offset == UNSET_IDX {
                    continue;
                }
                let start = offset as usize;
                let end = start + cell.floor_components.len();
                if let Some(labels) = memory.labels.get(start..end) {
                    cell.floor_components.copy_from_slice(labels);
                }
            }
            self.component_count = Some(count);
            log::debug!("{} connected components computed", count);
        }
        self.component_memory = memory;
        outcome
    }

    /// Component of a floor, [`UNSET_IDX`] if components are not up to date
    pub fn connected_component(&self, floor: NavFloorKey) -> u32 {
        if self.component_count.is_none() {
            return UNSET_IDX;
        }
        self.stitched_cell_by_idx(floor.cell)
            .map_or(UNSET_IDX, |cell| cell.connected_component(floor.floor))
    }

    pub fn connected_component_count(&self) -> Option<u32> {
        self.component_count
    }
}
