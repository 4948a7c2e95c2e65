//! Fast handles on loaded data
//!
//! These pointers borrow the [`NavMeshManager`] and stay valid as long as the borrow does.
//! They are cheap to copy and are what the traversals and visitors work with. To keep a
//! reference across insertions and removals, convert them to safe pointers
//! (see [`crate::nav_safe_ptr`]).

use navmesh_common::Vec3;

use crate::intersections::{compute_altitude_of_point_in_triangle, is_point_inside_triangle_2d};
use crate::nav_cell::NavCell;
use crate::nav_floor::NavFloor;
use crate::nav_half_edge::{
    half_edge_idx_to_triangle_idx, next_half_edge_idx, prev_half_edge_idx,
    triangle_idx_to_half_edge_idx, HalfEdgeKind, HalfEdgeType,
};
use crate::nav_mesh_manager::NavMeshManager;
use crate::nav_mesh_types::{
    is_terrain_type_compliant, NavFloorKey, NavTerrainType, NavTerrainTypeMask, NavTriangleKey,
    StitchedCellIdx,
};
use crate::nav_safe_ptr::{
    NavCellSafePtr, NavFloorSafePtr, NavHalfEdgeSafePtr, NavTriangleSafePtr, NavVertexSafePtr,
};
use crate::stitched::StitchedNavCell;

/// Upper bound of the half-edges turned around one vertex while walking along an obstacle
const MAX_OBSTACLE_WALK_STEPS: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct NavCellPtr<'m> {
    manager: &'m NavMeshManager,
    cell: &'m StitchedNavCell,
}

impl<'m> NavCellPtr<'m> {
    pub(crate) fn new(manager: &'m NavMeshManager, cell: &'m StitchedNavCell) -> Self {
        Self { manager, cell }
    }

    pub fn manager(&self) -> &'m NavMeshManager {
        self.manager
    }

    pub fn stitched_cell(&self) -> &'m StitchedNavCell {
        self.cell
    }

    pub fn nav_cell(&self) -> &'m NavCell {
        self.cell.nav_cell()
    }

    pub fn idx(&self) -> StitchedCellIdx {
        self.cell.idx()
    }

    pub fn floor_count(&self) -> u32 {
        self.nav_cell().floor_count()
    }

    pub fn floor(&self, floor_idx: u32) -> Option<NavFloorPtr<'m>> {
        (floor_idx < self.floor_count()).then_some(NavFloorPtr {
            cell: *self,
            floor_idx,
        })
    }

    pub fn floors(&self) -> impl Iterator<Item = NavFloorPtr<'m>> + 'm {
        let cell = *self;
        (0..cell.floor_count()).map(move |floor_idx| NavFloorPtr { cell, floor_idx })
    }

    pub fn to_safe_ptr(&self) -> NavCellSafePtr {
        NavCellSafePtr::new(
            self.cell.mesh().clone(),
            self.cell.mesh_id(),
            self.cell.cell_idx(),
        )
    }
}

impl PartialEq for NavCellPtr<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.cell, other.cell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavFloorPtr<'m> {
    cell: NavCellPtr<'m>,
    floor_idx: u32,
}

impl<'m> NavFloorPtr<'m> {
    pub fn cell(&self) -> NavCellPtr<'m> {
        self.cell
    }

    pub fn floor_idx(&self) -> u32 {
        self.floor_idx
    }

    pub fn key(&self) -> NavFloorKey {
        NavFloorKey {
            cell: self.cell.idx(),
            floor: self.floor_idx,
        }
    }

    pub fn nav_floor(&self) -> &'m NavFloor {
        self.cell.nav_cell().floor(self.floor_idx)
    }

    pub fn terrain_type(&self) -> NavTerrainType {
        self.nav_floor().terrain_type
    }

    pub fn triangle_count(&self) -> u32 {
        self.nav_floor().triangle_count()
    }

    pub fn triangle(&self, triangle_idx: u32) -> Option<NavTrianglePtr<'m>> {
        (triangle_idx < self.triangle_count()).then_some(NavTrianglePtr {
            floor: *self,
            triangle_idx,
        })
    }

    pub fn triangles(&self) -> impl Iterator<Item = NavTrianglePtr<'m>> + 'm {
        let floor = *self;
        (0..floor.triangle_count()).map(move |triangle_idx| NavTrianglePtr {
            floor,
            triangle_idx,
        })
    }

    pub fn half_edge(&self, half_edge_idx: u32) -> Option<NavHalfEdgePtr<'m>> {
        (half_edge_idx < self.nav_floor().half_edge_count()).then_some(NavHalfEdgePtr {
            floor: *self,
            half_edge_idx,
        })
    }

    pub fn half_edges(&self) -> impl Iterator<Item = NavHalfEdgePtr<'m>> + 'm {
        let floor = *self;
        (0..floor.nav_floor().half_edge_count()).map(move |half_edge_idx| NavHalfEdgePtr {
            floor,
            half_edge_idx,
        })
    }

    pub fn vertex(&self, vertex_idx: u32) -> Option<NavVertexPtr<'m>> {
        (vertex_idx < self.nav_floor().vertex_count()).then_some(NavVertexPtr {
            floor: *self,
            vertex_idx,
        })
    }

    pub fn connected_component(&self) -> u32 {
        self.cell.manager().connected_component(self.key())
    }

    /// Floors reachable in one step: through floor links or stitched cell boundaries
    pub fn neighbour_floors(&self) -> impl Iterator<Item = NavFloorKey> + 'm {
        let cell = self.cell;
        let floor_idx = self.floor_idx;
        let stitched = cell.stitched_cell();
        let by_floor_link = self.nav_floor().floor_links.iter().map(move |link| NavFloorKey {
            cell: cell.idx(),
            floor: link.floor_idx,
        });
        let by_cell_boundary = crate::nav_mesh_types::CardinalDir::ALL
            .into_iter()
            .flat_map(move |dir| {
                cell.nav_cell()
                    .boundary_edges(dir)
                    .iter()
                    .enumerate()
                    .filter(move |(_, edge)| edge.floor_idx == floor_idx)
                    .filter_map(move |(i, _)| stitched.link(dir, i as u32))
            })
            .map(|link| NavFloorKey {
                cell: link.cell,
                floor: link.floor_idx,
            });
        by_floor_link.chain(by_cell_boundary)
    }

    pub fn to_safe_ptr(&self) -> NavFloorSafePtr {
        NavFloorSafePtr::new(self.cell.to_safe_ptr(), self.floor_idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavTrianglePtr<'m> {
    floor: NavFloorPtr<'m>,
    triangle_idx: u32,
}

impl<'m> NavTrianglePtr<'m> {
    pub fn floor(&self) -> NavFloorPtr<'m> {
        self.floor
    }

    pub fn triangle_idx(&self) -> u32 {
        self.triangle_idx
    }

    pub fn key(&self) -> NavTriangleKey {
        NavTriangleKey {
            cell: self.floor.cell.idx(),
            floor: self.floor.floor_idx,
            triangle: self.triangle_idx,
        }
    }

    pub fn terrain_type(&self) -> NavTerrainType {
        self.floor.terrain_type()
    }

    /// The `n`-th half-edge of the triangle, `n` in `0..3`
    pub fn half_edge(&self, n: u32) -> NavHalfEdgePtr<'m> {
        NavHalfEdgePtr {
            floor: self.floor,
            half_edge_idx: triangle_idx_to_half_edge_idx(self.triangle_idx, n % 3),
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.floor.nav_floor().triangle_vertices(self.triangle_idx)
    }

    /// On-edge positions count as inside
    pub fn is_inside_2d(&self, pos: Vec3) -> bool {
        let [v0, v1, v2] = self.vertices();
        is_point_inside_triangle_2d(pos, v0, v1, v2)
    }

    /// Altitude of the triangle plane at the X,Y of `pos`
    pub fn altitude_at(&self, pos: Vec3) -> f32 {
        let [v0, v1, v2] = self.vertices();
        compute_altitude_of_point_in_triangle(pos, v0, v1, v2)
    }

    pub fn to_safe_ptr(&self) -> NavTriangleSafePtr {
        NavTriangleSafePtr::new(self.floor.to_safe_ptr(), self.triangle_idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavHalfEdgePtr<'m> {
    floor: NavFloorPtr<'m>,
    half_edge_idx: u32,
}

impl<'m> NavHalfEdgePtr<'m> {
    pub fn floor(&self) -> NavFloorPtr<'m> {
        self.floor
    }

    pub fn half_edge_idx(&self) -> u32 {
        self.half_edge_idx
    }

    pub fn kind(&self) -> HalfEdgeKind {
        self.floor.nav_floor().half_edge(self.half_edge_idx).kind()
    }

    pub fn edge_type(&self) -> HalfEdgeType {
        self.kind().edge_type()
    }

    pub fn start_vertex(&self) -> Vec3 {
        self.floor.nav_floor().start_vertex(self.half_edge_idx)
    }

    pub fn end_vertex(&self) -> Vec3 {
        self.floor.nav_floor().end_vertex(self.half_edge_idx)
    }

    pub fn third_vertex(&self) -> Vec3 {
        let floor = self.floor.nav_floor();
        floor.vertex(floor.third_vertex_idx(self.half_edge_idx))
    }

    pub fn start_vertex_ptr(&self) -> NavVertexPtr<'m> {
        NavVertexPtr {
            floor: self.floor,
            vertex_idx: self.floor.nav_floor().start_vertex_idx(self.half_edge_idx),
        }
    }

    pub fn end_vertex_ptr(&self) -> NavVertexPtr<'m> {
        NavVertexPtr {
            floor: self.floor,
            vertex_idx: self.floor.nav_floor().end_vertex_idx(self.half_edge_idx),
        }
    }

    pub fn next(&self) -> NavHalfEdgePtr<'m> {
        NavHalfEdgePtr {
            floor: self.floor,
            half_edge_idx: next_half_edge_idx(self.half_edge_idx),
        }
    }

    pub fn prev(&self) -> NavHalfEdgePtr<'m> {
        NavHalfEdgePtr {
            floor: self.floor,
            half_edge_idx: prev_half_edge_idx(self.half_edge_idx),
        }
    }

    pub fn triangle(&self) -> NavTrianglePtr<'m> {
        NavTrianglePtr {
            floor: self.floor,
            triangle_idx: half_edge_idx_to_triangle_idx(self.half_edge_idx),
        }
    }

    /// Half-edge on the other side, whatever its terrain type.
    ///
    /// `None` for obstacles and for cell boundaries not stitched to a loaded neighbour.
    pub fn pair_half_edge(&self) -> Option<NavHalfEdgePtr<'m>> {
        match self.kind() {
            HalfEdgeKind::Paired(pair_idx) => Some(NavHalfEdgePtr {
                floor: self.floor,
                half_edge_idx: pair_idx,
            }),
            HalfEdgeKind::Obstacle(_) => None,
            HalfEdgeKind::FloorBoundary(link_idx) => {
                let link = self.floor.nav_floor().floor_links.get(link_idx as usize)?;
                self.floor
                    .cell
                    .floor(link.floor_idx)?
                    .half_edge(link.half_edge_idx)
            }
            HalfEdgeKind::CellBoundary { dir, idx } => {
                let link = self.floor.cell.stitched_cell().link(dir, idx)?;
                self.floor
                    .cell
                    .manager()
                    .cell_ptr(link.cell)?
                    .floor(link.floor_idx)?
                    .half_edge(link.half_edge_idx)
            }
        }
    }

    /// Pair half-edge if an entity allowed on `mask` can cross this one
    pub fn is_half_edge_crossable_with_pair(
        &self,
        mask: NavTerrainTypeMask,
    ) -> Option<NavHalfEdgePtr<'m>> {
        match self.kind() {
            HalfEdgeKind::Obstacle(_) => None,
            HalfEdgeKind::Paired(_) => self.pair_half_edge(),
            HalfEdgeKind::FloorBoundary(_) | HalfEdgeKind::CellBoundary { .. } => self
                .pair_half_edge()
                .filter(|pair| is_terrain_type_compliant(mask, pair.floor.terrain_type())),
        }
    }

    pub fn is_half_edge_crossable(&self, mask: NavTerrainTypeMask) -> bool {
        self.is_half_edge_crossable_with_pair(mask).is_some()
    }

    /// Next uncrossable half-edge along the contour, turning around the end vertex
    pub fn next_half_edge_along_obstacle(&self, mask: NavTerrainTypeMask) -> NavHalfEdgePtr<'m> {
        let mut candidate = self.next();
        for _ in 0..MAX_OBSTACLE_WALK_STEPS {
            match candidate.is_half_edge_crossable_with_pair(mask) {
                Some(pair) => candidate = pair.next(),
                None => return candidate,
            }
        }
        log::debug!("Obstacle walk stopped after {} steps", MAX_OBSTACLE_WALK_STEPS);
        candidate
    }

    /// Previous uncrossable half-edge along the contour, turning around the start vertex
    pub fn prev_half_edge_along_obstacle(&self, mask: NavTerrainTypeMask) -> NavHalfEdgePtr<'m> {
        let mut candidate = self.prev();
        for _ in 0..MAX_OBSTACLE_WALK_STEPS {
            match candidate.is_half_edge_crossable_with_pair(mask) {
                Some(pair) => candidate = pair.prev(),
                None => return candidate,
            }
        }
        log::debug!("Obstacle walk stopped after {} steps", MAX_OBSTACLE_WALK_STEPS);
        candidate
    }

    pub fn to_safe_ptr(&self) -> NavHalfEdgeSafePtr {
        NavHalfEdgeSafePtr::new(self.floor.to_safe_ptr(), self.half_edge_idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavVertexPtr<'m> {
    floor: NavFloorPtr<'m>,
    vertex_idx: u32,
}

impl<'m> NavVertexPtr<'m> {
    pub fn floor(&self) -> NavFloorPtr<'m> {
        self.floor
    }

    pub fn vertex_idx(&self) -> u32 {
        self.vertex_idx
    }

    pub fn position(&self) -> Vec3 {
        self.floor.nav_floor().vertex(self.vertex_idx)
    }

    pub fn to_safe_ptr(&self) -> NavVertexSafePtr {
        NavVertexSafePtr::new(self.floor.to_safe_ptr(), self.vertex_idx)
    }
}
