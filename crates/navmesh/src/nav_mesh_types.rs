//! Shared NavMesh types: index sentinels, cardinal directions, terrain types and links

use navmesh_common::CellPos;

/// Index that does not reference anything
pub const INVALID_IDX: u32 = u32::MAX;
/// Index that has not been computed yet
pub const UNSET_IDX: u32 = u32::MAX - 1;
/// Index of something that lies outside of the loaded data
pub const OUTSIDE_IDX: u32 = u32::MAX - 2;

/// Returns true if `idx` is none of the sentinels
#[inline]
pub fn is_valid_idx(idx: u32) -> bool {
    idx < OUTSIDE_IDX
}

/// Terrain type of a floor, tested against a [`NavTerrainTypeMask`]
pub type NavTerrainType = u32;
/// Bitmask of the terrain types a query is allowed to walk on
pub type NavTerrainTypeMask = u32;

/// Every terrain type is navigable
pub const NAV_TERRAIN_TYPE_MASK_ALL: NavTerrainTypeMask = 0xFFFF_FFFF;

/// Terrain type given to floors generated without any tag
pub const NAV_TERRAIN_TYPE_DEFAULT: NavTerrainType = 0x1;

#[inline]
pub fn is_terrain_type_compliant(mask: NavTerrainTypeMask, terrain_type: NavTerrainType) -> bool {
    (mask & terrain_type) != 0
}

/// One of the four sides of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum CardinalDir {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl CardinalDir {
    pub const ALL: [CardinalDir; 4] = [
        CardinalDir::East,
        CardinalDir::North,
        CardinalDir::West,
        CardinalDir::South,
    ];

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(CardinalDir::East),
            1 => Some(CardinalDir::North),
            2 => Some(CardinalDir::West),
            3 => Some(CardinalDir::South),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        match self {
            CardinalDir::East => CardinalDir::West,
            CardinalDir::North => CardinalDir::South,
            CardinalDir::West => CardinalDir::East,
            CardinalDir::South => CardinalDir::North,
        }
    }

    /// Offset to the neighbouring cell in this direction
    pub fn offset(self) -> CellPos {
        match self {
            CardinalDir::East => CellPos::new(1, 0),
            CardinalDir::North => CellPos::new(0, 1),
            CardinalDir::West => CellPos::new(-1, 0),
            CardinalDir::South => CellPos::new(0, -1),
        }
    }
}

/// Link from a FLOOR_BOUNDARY half-edge to the matching half-edge of another floor in the
/// same cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct FloorLink {
    pub half_edge_idx: u32,
    pub floor_idx: u32,
}

/// Half-edge lying on one side of a cell, candidate for stitching with the neighbour cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CellBoundaryEdge {
    pub half_edge_idx: u32,
    pub floor_idx: u32,
}

/// Identifies one generation of a NavMesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct GuidCompound {
    pub guid: [u32; 4],
    pub timestamp: u32,
}

/// Entity parameters the NavMesh was generated for
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavMeshGenerationParams {
    pub entity_radius: f32,
    pub entity_height: f32,
    pub step_max: f32,
    /// Maximum slope in degrees
    pub slope_max: f32,
}

impl Default for NavMeshGenerationParams {
    fn default() -> Self {
        Self {
            entity_radius: 0.4,
            entity_height: 1.8,
            step_max: 0.5,
            slope_max: 45.0,
        }
    }
}

bitflags::bitflags! {
    /// Flags stored in the NavMesh header
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(
        feature = "serialization",
        derive(serde::Serialize, serde::Deserialize)
    )]
    pub struct NavMeshFlags: u32 {
        const NO_FLAG = 0;
        /// The NavMesh has been produced by a partitioned generation
        const FROM_PARTITIONER = 1;
    }
}

/// Slot of a stitched cell in the [`NavMeshManager`](crate::NavMeshManager)
pub type StitchedCellIdx = u32;

/// Floor of a loaded cell.
///
/// Keys are plain indices into the manager: they stay meaningful only as long as no cell
/// is inserted or removed. Use safe pointers to keep a reference across such changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NavFloorKey {
    pub cell: StitchedCellIdx,
    pub floor: u32,
}

/// Triangle of a loaded cell, see [`NavFloorKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NavTriangleKey {
    pub cell: StitchedCellIdx,
    pub floor: u32,
    pub triangle: u32,
}

impl NavTriangleKey {
    pub fn floor_key(&self) -> NavFloorKey {
        NavFloorKey {
            cell: self.cell,
            floor: self.floor,
        }
    }
}
