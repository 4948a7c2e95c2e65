//! Common utilities and data structures shared by the NavMesh runtime and its tools
//!
//! Everything here works in the NavMesh space: Z is up, queries happen in the X,Y plane
//! and all distances are expressed in meters.

mod box_obstacle;
mod coord_system;
mod geometry;
mod math;

pub use box_obstacle::*;
pub use coord_system::*;
pub use geometry::*;
pub use math::*;

/// Represents a 2D position or direction in the X,Y plane
pub type Vec2 = glam::Vec2;

/// Represents a 3D position (Z up)
pub type Vec3 = glam::Vec3;

/// Integer position of a cell in the cell grid
pub type CellPos = glam::IVec2;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid navmesh data: {0}")]
    InvalidMesh(String),

    #[error("blob is not a NavMesh blob")]
    WrongBlobType,

    #[error("unsupported NavMesh blob version {found} (expected {expected})")]
    WrongVersion { found: u32, expected: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("navmesh error: {0}")]
    NavMesh(String),
}

/// Result type for NavMesh operations
pub type Result<T> = std::result::Result<T, Error>;
