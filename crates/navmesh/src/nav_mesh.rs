//! The NavMesh: an immutable set of cells produced offline
//!
//! A NavMesh only holds indices, never pointers, so it can be written to and read from a
//! flat blob (see [`crate::binary_format`]) and shared between threads behind an `Arc`.
//! Runtime state (links to neighbouring meshes, connected components) lives in the
//! [`NavMeshManager`](crate::NavMeshManager).

use navmesh_common::{Box3f, CellBox, CellPos, CoordSystemConfig, Error, Result};

use crate::nav_cell::NavCell;
use crate::nav_mesh_types::{GuidCompound, NavMeshFlags, NavMeshGenerationParams};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavMesh {
    pub coord_system: CoordSystemConfig,
    pub aabb: Box3f,
    /// Cell coordinates covered by the mesh, bounds included
    pub cell_box: CellBox,
    /// Side of a cell in meters
    pub cell_size: f32,
    pub guid: GuidCompound,
    pub generation_params: NavMeshGenerationParams,
    pub cells: Vec<NavCell>,
    pub flags: NavMeshFlags,
}

impl NavMesh {
    pub fn cell_count(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn cell(&self, cell_idx: u32) -> &NavCell {
        &self.cells[cell_idx as usize]
    }

    /// Index of the cell at `pos`, if the mesh has one there
    pub fn cell_idx(&self, pos: CellPos) -> Option<u32> {
        if !self.cell_box.is_inside(pos) {
            return None;
        }
        self.cells
            .iter()
            .position(|cell| cell.cell_pos == pos)
            .map(|idx| idx as u32)
    }

    pub fn floor_count(&self) -> u32 {
        self.cells.iter().map(NavCell::floor_count).sum()
    }

    pub fn triangle_count(&self) -> u32 {
        self.cells.iter().map(NavCell::triangle_count).sum()
    }

    /// Recomputes the overall bounding box from the floors
    pub fn compute_aabb(&mut self) {
        let mut aabb = Box3f::empty();
        for floor in self.cells.iter().flat_map(|cell| cell.floors.iter()) {
            aabb.expand_box(&floor.aabb);
        }
        self.aabb = aabb;
    }

    /// Checks the header and every cell
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size > 0.0) {
            return Err(Error::InvalidMesh(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }

        for (idx, cell) in self.cells.iter().enumerate() {
            if !self.cell_box.is_inside(cell.cell_pos) {
                return Err(Error::InvalidMesh(format!(
                    "cell {} at {} lies outside the cell box",
                    idx, cell.cell_pos
                )));
            }
            if self.cells[..idx].iter().any(|c| c.cell_pos == cell.cell_pos) {
                return Err(Error::InvalidMesh(format!(
                    "cell position {} is used twice",
                    cell.cell_pos
                )));
            }
            cell.validate()?;
        }
        Ok(())
    }

    /// Saves the mesh to a JSON file
    #[cfg(feature = "serialization")]
    pub fn save_to_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::NavMesh(format!("JSON encoding failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a mesh from a JSON file
    #[cfg(feature = "serialization")]
    pub fn load_from_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let nav_mesh: NavMesh = serde_json::from_str(&json)
            .map_err(|e| Error::NavMesh(format!("JSON decoding failed: {}", e)))?;
        nav_mesh.validate()?;
        Ok(nav_mesh)
    }
}
