//! Half-edges and the index arithmetic of triangle topology
//!
//! Triangle `i` of a floor owns the half-edges `3i`, `3i+1` and `3i+2`. Half-edge `3i+n`
//! starts at the `n`-th vertex of the triangle and ends at the `(n+1)%3`-th one, so the
//! whole topology is derived from indices without any stored pointer.
//!
//! Each half-edge carries one packed 32-bit word: the edge type in bits 30-31 and a
//! type-dependent payload in the low bits. [`HalfEdgeKind`] is the decoded form.

use crate::nav_mesh_types::CardinalDir;

const TYPE_SHIFT: u32 = 30;
const TYPE_MASK: u32 = 0xC000_0000;
const PAYLOAD_MASK: u32 = 0x0FFF_FFFF;
const DIR_SHIFT: u32 = 28;
const DIR_MASK: u32 = 0x3000_0000;

/// Largest index a half-edge payload can hold
pub const MAX_HALF_EDGE_PAYLOAD: u32 = PAYLOAD_MASK;

/// Type tag stored in the top two bits of the packed word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HalfEdgeType {
    Paired = 0,
    Obstacle = 1,
    FloorBoundary = 2,
    CellBoundary = 3,
}

/// Decoded half-edge data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfEdgeKind {
    /// Shares its edge with the given half-edge of the same floor
    Paired(u32),
    /// Border of the walkable surface; payload is the next obstacle half-edge of the floor
    Obstacle(u32),
    /// Index in the floor's link array
    FloorBoundary(u32),
    /// Index in the cell's boundary edge list for `dir`
    CellBoundary { dir: CardinalDir, idx: u32 },
}

impl HalfEdgeKind {
    pub fn edge_type(&self) -> HalfEdgeType {
        match self {
            HalfEdgeKind::Paired(_) => HalfEdgeType::Paired,
            HalfEdgeKind::Obstacle(_) => HalfEdgeType::Obstacle,
            HalfEdgeKind::FloorBoundary(_) => HalfEdgeType::FloorBoundary,
            HalfEdgeKind::CellBoundary { .. } => HalfEdgeType::CellBoundary,
        }
    }

    /// Packs into the wire representation
    pub fn encode(&self) -> u32 {
        let (ty, payload) = match *self {
            HalfEdgeKind::Paired(idx) => (HalfEdgeType::Paired, idx & PAYLOAD_MASK),
            HalfEdgeKind::Obstacle(idx) => (HalfEdgeType::Obstacle, idx & PAYLOAD_MASK),
            HalfEdgeKind::FloorBoundary(idx) => (HalfEdgeType::FloorBoundary, idx & PAYLOAD_MASK),
            HalfEdgeKind::CellBoundary { dir, idx } => (
                HalfEdgeType::CellBoundary,
                ((dir as u32) << DIR_SHIFT) | (idx & PAYLOAD_MASK),
            ),
        };
        ((ty as u32) << TYPE_SHIFT) | payload
    }

    /// Unpacks the wire representation
    pub fn decode(data: u32) -> Self {
        let payload = data & PAYLOAD_MASK;
        match (data & TYPE_MASK) >> TYPE_SHIFT {
            0 => HalfEdgeKind::Paired(payload),
            1 => HalfEdgeKind::Obstacle(payload),
            2 => HalfEdgeKind::FloorBoundary(payload),
            _ => {
                let dir = match (data & DIR_MASK) >> DIR_SHIFT {
                    0 => CardinalDir::East,
                    1 => CardinalDir::North,
                    2 => CardinalDir::West,
                    _ => CardinalDir::South,
                };
                HalfEdgeKind::CellBoundary { dir, idx: payload }
            }
        }
    }
}

/// One directed side of a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavHalfEdge {
    /// Index of the start vertex in the floor vertex array
    pub start_vertex_idx: u32,
    /// Packed type and payload
    pub data: u32,
}

impl NavHalfEdge {
    pub fn new(start_vertex_idx: u32, kind: HalfEdgeKind) -> Self {
        Self {
            start_vertex_idx,
            data: kind.encode(),
        }
    }

    #[inline]
    pub fn kind(&self) -> HalfEdgeKind {
        HalfEdgeKind::decode(self.data)
    }

    #[inline]
    pub fn edge_type(&self) -> HalfEdgeType {
        self.kind().edge_type()
    }

    pub fn set_kind(&mut self, kind: HalfEdgeKind) {
        self.data = kind.encode();
    }
}

#[inline]
pub fn half_edge_idx_to_triangle_idx(half_edge_idx: u32) -> u32 {
    half_edge_idx / 3
}

#[inline]
pub fn triangle_idx_to_half_edge_idx(triangle_idx: u32, n: u32) -> u32 {
    triangle_idx * 3 + n
}

#[inline]
pub fn next_half_edge_idx(half_edge_idx: u32) -> u32 {
    half_edge_idx - half_edge_idx % 3 + (half_edge_idx + 1) % 3
}

#[inline]
pub fn prev_half_edge_idx(half_edge_idx: u32) -> u32 {
    half_edge_idx - half_edge_idx % 3 + (half_edge_idx + 2) % 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_prev_cycle() {
        for idx in 0..30u32 {
            let next = next_half_edge_idx(idx);
            assert_eq!(next_half_edge_idx(next_half_edge_idx(next)), idx);
            assert_eq!(prev_half_edge_idx(next), idx);
            assert_eq!(half_edge_idx_to_triangle_idx(next), half_edge_idx_to_triangle_idx(idx));
        }
        assert_eq!(next_half_edge_idx(5), 3);
        assert_eq!(prev_half_edge_idx(3), 5);
        assert_eq!(triangle_idx_to_half_edge_idx(4, 2), 14);
    }

    #[test]
    fn test_packing() {
        let kinds = [
            HalfEdgeKind::Paired(12),
            HalfEdgeKind::Obstacle(0),
            HalfEdgeKind::FloorBoundary(MAX_HALF_EDGE_PAYLOAD),
            HalfEdgeKind::CellBoundary {
                dir: CardinalDir::South,
                idx: 7,
            },
        ];
        for kind in kinds {
            assert_eq!(HalfEdgeKind::decode(kind.encode()), kind);
        }

        // Type in the top two bits, direction right below
        let cell_boundary = HalfEdgeKind::CellBoundary {
            dir: CardinalDir::West,
            idx: 3,
        };
        assert_eq!(cell_boundary.encode(), 0xE000_0003);
        assert_eq!(HalfEdgeKind::Obstacle(5).encode(), 0x4000_0005);
        assert_eq!(HalfEdgeKind::decode(0x8000_0002), HalfEdgeKind::FloorBoundary(2));
    }
}
