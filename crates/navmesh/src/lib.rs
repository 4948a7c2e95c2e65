//! Runtime NavMesh for agents moving on the ground
//!
//! A NavMesh is a set of cells laid on a regular grid. Each cell holds floors, and each
//! floor is a small triangle mesh stored with half-edges. Several NavMeshes can be
//! loaded in a [`NavMeshManager`], which stitches neighbouring cells together and
//! swaps overlapping cells of different meshes in and out.
//!
//! Queries run on a [`NavMeshQueryServer`] that owns a preallocated
//! [`NavMeshQueryBuffer`]: they never allocate, and report exhausted memory through
//! [`QueryServerError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use navmesh::queries::{CanGoQueryResult, DiskCanGoQuery};
//! use navmesh::{NavMeshBuilder, NavMeshManager, NavMeshQueryServer, QueryBufferConfig};
//! use navmesh_common::{CellPos, Vec3};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = NavMeshBuilder::new(10.0);
//! builder.add_flat_grid(CellPos::ZERO, 2, 2, 4, 0.0, 0x1);
//! let mesh = builder.build()?;
//!
//! let mut manager = NavMeshManager::default();
//! manager.add_nav_mesh(Arc::new(mesh))?;
//!
//! let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;
//! let mut query = DiskCanGoQuery::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(18.0, 15.0, 0.0), 0.4);
//! server.disk_can_go(&mut query)?;
//! assert_eq!(query.get_result(), CanGoQueryResult::Success);
//! # Ok(())
//! # }
//! ```

pub mod binary_format;
mod config;
pub mod containers;
pub mod intersections;
mod nav_cell;
mod nav_cell_grid;
mod nav_floor;
mod nav_half_edge;
mod nav_mesh;
mod nav_mesh_builder;
mod nav_mesh_manager;
mod nav_mesh_types;
mod nav_ptr;
mod nav_safe_ptr;
pub mod queries;
mod query_buffer;
mod query_server;
mod status;
mod stitched;
pub mod traversal;

#[cfg(test)]
mod test_mesh_helpers;

pub use binary_format::{blob_endianness, swap_endianness, Endianness};
pub use config::{QueryBufferConfig, StitchConfig};
pub use nav_cell::NavCell;
pub use nav_cell_grid::NavCellGrid;
pub use nav_floor::NavFloor;
pub use nav_half_edge::{
    half_edge_idx_to_triangle_idx, next_half_edge_idx, prev_half_edge_idx,
    triangle_idx_to_half_edge_idx, HalfEdgeKind, HalfEdgeType, NavHalfEdge,
};
pub use nav_mesh::NavMesh;
pub use nav_mesh_builder::{cell_aabb, compute_cell_pos, NavMeshBuilder};
pub use nav_mesh_manager::{NavMeshId, NavMeshManager};
pub use nav_mesh_types::*;
pub use nav_ptr::{NavCellPtr, NavFloorPtr, NavHalfEdgePtr, NavTrianglePtr, NavVertexPtr};
pub use nav_safe_ptr::{
    NavCellSafePtr, NavFloorSafePtr, NavHalfEdgeSafePtr, NavTriangleSafePtr, NavVertexSafePtr,
};
pub use query_buffer::NavMeshQueryBuffer;
pub use query_server::NavMeshQueryServer;
pub use status::{
    ContainerError, ContainerResult, NavMeshManagerError, QueryServerError, QueryServerResult,
    TraversalError, TraversalResult,
};
pub use stitched::{CellBoundaryLink, StitchedNavCell};
