//! NavMesh fixtures shared by the unit tests

use std::sync::Arc;

use navmesh_common::{CellPos, Result, Vec3};

use crate::nav_floor::NavFloor;
use crate::nav_mesh::NavMesh;
use crate::nav_mesh_builder::NavMeshBuilder;
use crate::nav_mesh_manager::{NavMeshId, NavMeshManager};
use crate::nav_mesh_types::NavTerrainType;

/// Square of `size` meters split along its diagonal, alone in a cell of the same size
pub fn create_flat_square_mesh_with(size: f32, terrain_type: NavTerrainType) -> Result<NavMesh> {
    let mut builder = NavMeshBuilder::new(size);
    builder.add_floor(
        CellPos::ZERO,
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(size, 0.0, 0.0),
            Vec3::new(size, size, 0.0),
            Vec3::new(0.0, size, 0.0),
        ],
        &[[0, 1, 2], [0, 2, 3]],
        terrain_type,
    );
    builder.build()
}

/// The 10x10 square with vertices (0,0,0), (10,0,0), (10,10,0), (0,10,0)
pub fn create_flat_square_mesh() -> Result<NavMesh> {
    create_flat_square_mesh_with(10.0, 0x1)
}

pub fn flat_square_floor(size: f32, terrain_type: NavTerrainType) -> NavFloor {
    let mesh = create_flat_square_mesh_with(size, terrain_type).expect("valid fixture");
    mesh.cells[0].floors[0].clone()
}

/// One 10x10 cell holding two floors that share the edge x = 5.
///
/// Floor 0 covers x in [0,5] with terrain type 0x1, floor 1 covers x in [5,10] with
/// terrain type 0x2. Each floor has two triangles.
pub fn create_two_floor_mesh() -> Result<NavMesh> {
    let v = |x: f32, y: f32| Vec3::new(x, y, 0.0);
    let mut builder = NavMeshBuilder::new(10.0);
    builder.add_floor(
        CellPos::ZERO,
        &[v(0.0, 0.0), v(5.0, 0.0), v(5.0, 10.0), v(0.0, 10.0)],
        &[[0, 1, 2], [0, 2, 3]],
        0x1,
    );
    builder.add_floor(
        CellPos::ZERO,
        &[v(5.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(5.0, 10.0)],
        &[[0, 1, 2], [0, 2, 3]],
        0x2,
    );
    builder.build()
}

/// Flat grid of `cells_x` x `cells_y` cells starting at `first_cell`, 8 triangles per cell
pub fn create_grid_mesh(
    cells_x: i32,
    cells_y: i32,
    cell_size: f32,
    first_cell: CellPos,
) -> Result<NavMesh> {
    let mut builder = NavMeshBuilder::new(cell_size);
    builder.add_flat_grid(first_cell, cells_x, cells_y, 2, 0.0, 0x1);
    builder.build()
}

/// East-west corridor from (0,4) to (10,6) inside a single 10x10 cell.
///
/// The long sides are obstacles, the short ones lie on the cell border.
pub fn create_corridor_mesh() -> Result<NavMesh> {
    let v = |x: f32, y: f32| Vec3::new(x, y, 0.0);
    let mut vertices = Vec::new();
    for i in 0..=5 {
        let x = i as f32 * 2.0;
        vertices.push(v(x, 4.0));
        vertices.push(v(x, 6.0));
    }
    let mut triangles = Vec::new();
    for i in 0..5u32 {
        let (b0, t0, b1, t1) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        triangles.push([b0, b1, t1]);
        triangles.push([b0, t1, t0]);
    }

    let mut builder = NavMeshBuilder::new(10.0);
    builder.add_floor(CellPos::ZERO, &vertices, &triangles, 0x1);
    builder.build()
}

/// Manager holding `mesh` alone
pub fn create_manager_with(mesh: NavMesh) -> (NavMeshManager, NavMeshId) {
    let mut manager = NavMeshManager::default();
    let id = manager
        .add_nav_mesh(Arc::new(mesh))
        .expect("fixture mesh is accepted");
    (manager, id)
}
