//! Safe handles: references to NavMesh elements that survive manager changes
//!
//! A safe pointer keeps its mesh alive through an `Arc` and identifies the element by
//! mesh id and indices. It resolves to a fast pointer only while the mesh and the cell are
//! still inserted in the manager; the salt of the [`NavMeshId`] prevents a reused slot
//! from resolving to another mesh.

use std::sync::Arc;

use navmesh_common::Vec3;

use crate::nav_mesh::NavMesh;
use crate::nav_mesh_manager::{NavMeshId, NavMeshManager};
use crate::nav_mesh_types::NavTerrainType;
use crate::nav_ptr::{NavCellPtr, NavFloorPtr, NavHalfEdgePtr, NavTrianglePtr, NavVertexPtr};

#[derive(Debug, Clone)]
pub struct NavCellSafePtr {
    mesh: Arc<NavMesh>,
    mesh_id: NavMeshId,
    cell_idx: u32,
}

impl NavCellSafePtr {
    pub fn new(mesh: Arc<NavMesh>, mesh_id: NavMeshId, cell_idx: u32) -> Self {
        Self {
            mesh,
            mesh_id,
            cell_idx,
        }
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

    pub fn resolve<'m>(&self, manager: &'m NavMeshManager) -> Option<NavCellPtr<'m>> {
        let loaded = manager.nav_mesh(self.mesh_id)?;
        if !Arc::ptr_eq(loaded, &self.mesh) {
            return None;
        }
        let idx = manager.stitched_cell_idx_of(self.mesh_id, self.cell_idx)?;
        manager.cell_ptr(idx)
    }

    pub fn is_valid(&self, manager: &NavMeshManager) -> bool {
        self.resolve(manager).is_some()
    }
}

impl PartialEq for NavCellSafePtr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mesh, &other.mesh)
            && self.mesh_id == other.mesh_id
            && self.cell_idx == other.cell_idx
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavFloorSafePtr {
    cell: NavCellSafePtr,
    floor_idx: u32,
}

impl NavFloorSafePtr {
    pub fn new(cell: NavCellSafePtr, floor_idx: u32) -> Self {
        Self { cell, floor_idx }
    }

    pub fn cell(&self) -> &NavCellSafePtr {
        &self.cell
    }

    pub fn floor_idx(&self) -> u32 {
        self.floor_idx
    }

    /// Terrain type read from the mesh, available even when the mesh has been removed
    pub fn terrain_type(&self) -> NavTerrainType {
        self.cell
            .mesh
            .cell(self.cell.cell_idx)
            .floor(self.floor_idx)
            .terrain_type
    }

    pub fn resolve<'m>(&self, manager: &'m NavMeshManager) -> Option<NavFloorPtr<'m>> {
        self.cell.resolve(manager)?.floor(self.floor_idx)
    }

    pub fn is_valid(&self, manager: &NavMeshManager) -> bool {
        self.resolve(manager).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavTriangleSafePtr {
    floor: NavFloorSafePtr,
    triangle_idx: u32,
}

impl NavTriangleSafePtr {
    pub fn new(floor: NavFloorSafePtr, triangle_idx: u32) -> Self {
        Self {
            floor,
            triangle_idx,
        }
    }

    pub fn floor(&self) -> &NavFloorSafePtr {
        &self.floor
    }

    pub fn triangle_idx(&self) -> u32 {
        self.triangle_idx
    }

    pub fn terrain_type(&self) -> NavTerrainType {
        self.floor.terrain_type()
    }

    /// Triangle corners read from the mesh, without the manager
    pub fn vertices(&self) -> [Vec3; 3] {
        let cell = &self.floor.cell;
        cell.mesh
            .cell(cell.cell_idx)
            .floor(self.floor.floor_idx)
            .triangle_vertices(self.triangle_idx)
    }

    pub fn resolve<'m>(&self, manager: &'m NavMeshManager) -> Option<NavTrianglePtr<'m>> {
        self.floor.resolve(manager)?.triangle(self.triangle_idx)
    }

    pub fn is_valid(&self, manager: &NavMeshManager) -> bool {
        self.resolve(manager).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavHalfEdgeSafePtr {
    floor: NavFloorSafePtr,
    half_edge_idx: u32,
}

impl NavHalfEdgeSafePtr {
    pub fn new(floor: NavFloorSafePtr, half_edge_idx: u32) -> Self {
        Self {
            floor,
            half_edge_idx,
        }
    }

    pub fn floor(&self) -> &NavFloorSafePtr {
        &self.floor
    }

    pub fn half_edge_idx(&self) -> u32 {
        self.half_edge_idx
    }

    pub fn terrain_type(&self) -> NavTerrainType {
        self.floor.terrain_type()
    }

    pub fn resolve<'m>(&self, manager: &'m NavMeshManager) -> Option<NavHalfEdgePtr<'m>> {
        self.floor.resolve(manager)?.half_edge(self.half_edge_idx)
    }

    pub fn is_valid(&self, manager: &NavMeshManager) -> bool {
        self.resolve(manager).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavVertexSafePtr {
    floor: NavFloorSafePtr,
    vertex_idx: u32,
}

impl NavVertexSafePtr {
    pub fn new(floor: NavFloorSafePtr, vertex_idx: u32) -> Self {
        Self { floor, vertex_idx }
    }

    pub fn floor(&self) -> &NavFloorSafePtr {
        &self.floor
    }

    pub fn vertex_idx(&self) -> u32 {
        self.vertex_idx
    }

    pub fn position(&self) -> Vec3 {
        let cell = &self.floor.cell;
        cell.mesh
            .cell(cell.cell_idx)
            .floor(self.floor.floor_idx)
            .vertex(self.vertex_idx)
    }

    pub fn resolve<'m>(&self, manager: &'m NavMeshManager) -> Option<NavVertexPtr<'m>> {
        self.floor.resolve(manager)?.vertex(self.vertex_idx)
    }

    pub fn is_valid(&self, manager: &NavMeshManager) -> bool {
        self.resolve(manager).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav_mesh_types::NavTriangleKey;
    use crate::test_mesh_helpers::*;
    use navmesh_common::{CellPos, Result};

    #[test]
    fn test_safe_ptr_round_trip() -> Result<()> {
        let (manager, _) = create_manager_with(create_flat_square_mesh()?);
        let triangle = manager
            .triangle_ptr(NavTriangleKey { cell: 0, floor: 0, triangle: 1 })
            .expect("triangle");
        let safe = triangle.to_safe_ptr();
        assert_eq!(safe.resolve(&manager), Some(triangle));
        assert_eq!(safe.vertices(), triangle.vertices());
        assert_eq!(safe.terrain_type(), 0x1);

        let half_edge = triangle.half_edge(2);
        assert_eq!(half_edge.to_safe_ptr().resolve(&manager), Some(half_edge));
        let vertex = half_edge.start_vertex_ptr();
        assert_eq!(vertex.to_safe_ptr().position(), half_edge.start_vertex());
        Ok(())
    }

    #[test]
    fn test_safe_ptr_invalidated_by_removal() -> Result<()> {
        let (mut manager, id) = create_manager_with(create_flat_square_mesh()?);
        let safe = manager
            .triangle_ptr(NavTriangleKey::default())
            .expect("triangle")
            .to_safe_ptr();

        manager.remove_nav_mesh(id).expect("loaded");
        assert!(!safe.is_valid(&manager));
        // Terrain stays readable from the mesh kept alive by the pointer
        assert_eq!(safe.terrain_type(), 0x1);

        // Same slot, other mesh
        manager
            .add_nav_mesh(Arc::new(create_flat_square_mesh()?))
            .expect("reinserted");
        assert!(!safe.is_valid(&manager));
        Ok(())
    }

    #[test]
    fn test_safe_ptr_invalidated_by_cell_removal() -> Result<()> {
        let (mut manager, id) = create_manager_with(create_grid_mesh(2, 1, 10.0, CellPos::ZERO)?);
        let east = manager.stitched_cell(CellPos::new(1, 0)).expect("east").idx();
        let safe = manager.cell_ptr(east).expect("cell").to_safe_ptr();
        assert!(safe.is_valid(&manager));

        manager.remove_nav_cell(id, CellPos::new(1, 0)).expect("loaded");
        assert!(!safe.is_valid(&manager));
        manager.add_nav_cell(id, CellPos::new(1, 0)).expect("reloaded");
        assert!(safe.is_valid(&manager));
        Ok(())
    }
}
