use crate::containers::FixedDeque;
use crate::nav_mesh_manager::NavMeshManager;
use crate::nav_mesh_types::{NavFloorKey, UNSET_IDX};
use crate::status::TraversalError;

/// Flood fill labelling every active floor with a connected component id.
///
/// Floors are joined by floor links and by stitched cell boundaries, whatever their
/// terrain types. Labels live in caller memory: `offsets` holds, per manager slot, the index
/// of the first label of the cell, and the floors of a cell are contiguous in `labels`.
/// See [`ConnectedComponentTraversal::memory_for`] for the sizes.
pub struct ConnectedComponentTraversal<'m, 'b> {
    manager: &'m NavMeshManager,
    open: FixedDeque<'b, NavFloorKey>,
    offsets: &'b mut [u32],
    labels: &'b mut [u32],
}

impl<'m, 'b> ConnectedComponentTraversal<'m, 'b> {
    pub fn new(
        manager: &'m NavMeshManager,
        open: FixedDeque<'b, NavFloorKey>,
        offsets: &'b mut [u32],
        labels: &'b mut [u32],
    ) -> Self {
        Self {
            manager,
            open,
            offsets,
            labels,
        }
    }

    /// Entries needed in `offsets` and in `labels`
    pub fn memory_for(manager: &NavMeshManager) -> (usize, usize) {
        (manager.stitched_cell_capacity(), manager.total_floor_count())
    }

    /// First label index of a manager slot, [`UNSET_IDX`] for slots with no active cell
    pub fn offsets(&self) -> &[u32] {
        &*self.offsets
    }

    pub fn labels(&self) -> &[u32] {
        &*self.labels
    }

    /// Component of a floor found by the last search, [`UNSET_IDX`] for an unknown floor
    pub fn label(&self, key: NavFloorKey) -> u32 {
        self.label_idx(key)
            .and_then(|idx| self.labels.get(idx))
            .copied()
            .unwrap_or(UNSET_IDX)
    }

    fn label_idx(&self, key: NavFloorKey) -> Option<usize> {
        let offset = *self.offsets.get(key.cell as usize)?;
        if offset == UNSET_IDX {
            return None;
        }
        let floor_count = self.manager.stitched_cell_by_idx(key.cell)?.nav_cell().floor_count();
        (key.floor < floor_count).then_some((offset + key.floor) as usize)
    }

    fn set_label(&mut self, key: NavFloorKey, component: u32) {
        if let Some(label) = self.label_idx(key).and_then(|idx| self.labels.get_mut(idx)) {
            *label = component;
        }
    }

    /// Lays out the labels of the active cells and unsets them
    fn reset(&mut self) -> Result<(), TraversalError> {
        let (offset_count, _) = Self::memory_for(self.manager);
        if self.offsets.len() < offset_count {
            return Err(TraversalError::InvalidMemoryForClosedNodes);
        }
        self.offsets.fill(UNSET_IDX);

        let mut next = 0;
        for cell in self.manager.stitched_cells() {
            let floor_count = cell.nav_cell().floor_count() as usize;
            if next + floor_count > self.labels.len() {
                return Err(TraversalError::LackOfMemoryForClosedNodes);
            }
            self.offsets[cell.idx() as usize] = next as u32;
            next += floor_count;
        }
        self.labels[..next].fill(UNSET_IDX);
        Ok(())
    }

    /// Labels every floor and returns the number of components
    pub fn search(&mut self) -> Result<u32, TraversalError> {
        self.reset()?;
        let mut component_count = 0;
        let manager = self.manager;

        for cell in manager.stitched_cells() {
            for floor in 0..cell.nav_cell().floor_count() {
                let seed = NavFloorKey {
                    cell: cell.idx(),
                    floor,
                };
                if self.label(seed) != UNSET_IDX {
                    continue;
                }

                self.open.clear();
                self.set_label(seed, component_count);
                self.open
                    .push_back(seed)
                    .map_err(TraversalError::for_open_nodes)?;

                while !self.open.is_empty() {
                    let current = self
                        .open
                        .pop_front()
                        .map_err(TraversalError::for_open_nodes)?;
                    let Some(floor_ptr) = manager.floor_ptr(current) else {
                        continue;
                    };
                    for neighbour in floor_ptr.neighbour_floors() {
                        if self.label(neighbour) != UNSET_IDX {
                            continue;
                        }
                        self.set_label(neighbour, component_count);
                        self.open
                            .push_back(neighbour)
                            .map_err(TraversalError::for_open_nodes)?;
                    }
                }
                component_count += 1;
            }
        }
        Ok(component_count)
    }
}
