//! Cells: the streaming unit of a NavMesh
//!
//! A cell covers one square of the cell grid. Its area is half-open: a position belongs to
//! the cell when `min.x < x <= max.x` and `min.y <= y < max.y`, which matches the rounding
//! used by the grid to turn a position into a cell coordinate.

use navmesh_common::{Box2f, CellPos, Error, Result, Vec2};

use crate::nav_floor::NavFloor;
use crate::nav_half_edge::HalfEdgeKind;
use crate::nav_mesh_types::{CardinalDir, CellBoundaryEdge};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavCell {
    pub cell_pos: CellPos,
    pub aabb: Box2f,
    pub floors: Vec<NavFloor>,
    /// Half-edges lying on each side of the cell, indexed by [`CardinalDir`]
    pub boundary_edges: [Vec<CellBoundaryEdge>; 4],
}

impl NavCell {
    pub fn new(cell_pos: CellPos, aabb: Box2f) -> Self {
        Self {
            cell_pos,
            aabb,
            floors: Vec::new(),
            boundary_edges: Default::default(),
        }
    }

    pub fn floor_count(&self) -> u32 {
        self.floors.len() as u32
    }

    pub fn floor(&self, floor_idx: u32) -> &NavFloor {
        &self.floors[floor_idx as usize]
    }

    pub fn boundary_edges(&self, dir: CardinalDir) -> &[CellBoundaryEdge] {
        &self.boundary_edges[dir.index()]
    }

    pub fn triangle_count(&self) -> u32 {
        self.floors.iter().map(NavFloor::triangle_count).sum()
    }

    /// Half-open containment test, see the module documentation
    pub fn is_point_inside_cell_aabb(&self, p: Vec2) -> bool {
        p.x > self.aabb.min.x && p.x <= self.aabb.max.x && p.y >= self.aabb.min.y && p.y < self.aabb.max.y
    }

    /// Side of the cell a position lying on its border belongs to
    pub fn boundary_dir_from_pos(&self, p: Vec2, tolerance: f32) -> Option<CardinalDir> {
        if (p.x - self.aabb.max.x).abs() <= tolerance {
            Some(CardinalDir::East)
        } else if (p.y - self.aabb.max.y).abs() <= tolerance {
            Some(CardinalDir::North)
        } else if (p.x - self.aabb.min.x).abs() <= tolerance {
            Some(CardinalDir::West)
        } else if (p.y - self.aabb.min.y).abs() <= tolerance {
            Some(CardinalDir::South)
        } else {
            None
        }
    }

    /// Validates every floor and the cross references between floors and boundary lists
    pub fn validate(&self) -> Result<()> {
        for (floor_idx, floor) in self.floors.iter().enumerate() {
            floor.validate()?;

            for link in &floor.floor_links {
                let target = self.floors.get(link.floor_idx as usize).ok_or_else(|| {
                    Error::InvalidMesh(format!(
                        "floor {} links to missing floor {}",
                        floor_idx, link.floor_idx
                    ))
                })?;
                if link.half_edge_idx >= target.half_edge_count() {
                    return Err(Error::InvalidMesh(format!(
                        "floor {} links to half-edge {} of floor {} which has {}",
                        floor_idx,
                        link.half_edge_idx,
                        link.floor_idx,
                        target.half_edge_count()
                    )));
                }
            }

            for half_edge in &floor.half_edges {
                if let HalfEdgeKind::CellBoundary { dir, idx } = half_edge.kind() {
                    if idx as usize >= self.boundary_edges(dir).len() {
                        return Err(Error::InvalidMesh(format!(
                            "floor {} uses boundary edge {} of direction {:?} out of {}",
                            floor_idx,
                            idx,
                            dir,
                            self.boundary_edges(dir).len()
                        )));
                    }
                }
            }
        }

        for dir in CardinalDir::ALL {
            for (idx, edge) in self.boundary_edges(dir).iter().enumerate() {
                let floor = self.floors.get(edge.floor_idx as usize).ok_or_else(|| {
                    Error::InvalidMesh(format!("boundary edge {} references missing floor", idx))
                })?;
                if edge.half_edge_idx >= floor.half_edge_count() {
                    return Err(Error::InvalidMesh(format!(
                        "boundary edge {} references missing half-edge {}",
                        idx, edge.half_edge_idx
                    )));
                }
                let expected = HalfEdgeKind::CellBoundary {
                    dir,
                    idx: idx as u32,
                };
                if floor.half_edge(edge.half_edge_idx).kind() != expected {
                    return Err(Error::InvalidMesh(format!(
                        "boundary edge {} of direction {:?} does not point back to its half-edge",
                        idx, dir
                    )));
                }
            }
        }
        Ok(())
    }
}
