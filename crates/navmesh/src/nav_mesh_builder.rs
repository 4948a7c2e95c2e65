//! NavMesh builder assembling cells and floors from triangles
//!
//! The builder does not generate walkable surfaces: it takes triangles that already lie
//! inside their cell and computes the half-edge topology (pairs, floor links, cell boundary
//! edges and obstacle chains) expected by the runtime.

use std::collections::HashMap;

use navmesh_common::{
    tri_area_2d, Box2f, CellBox, CellPos, CoordSystemConfig, Error, Result, Vec2, Vec3,
};

use crate::nav_cell::NavCell;
use crate::nav_floor::NavFloor;
use crate::nav_half_edge::{next_half_edge_idx, HalfEdgeKind, NavHalfEdge};
use crate::nav_mesh::NavMesh;
use crate::nav_mesh_types::{
    CardinalDir, CellBoundaryEdge, FloorLink, GuidCompound, NavMeshFlags, NavMeshGenerationParams,
    NavTerrainType,
};

/// Triangles smaller than this (twice the area, in square meters) are rejected
const MIN_DOUBLE_AREA: f32 = 1e-8;

/// Square of a cell in the X,Y plane
pub fn cell_aabb(cell_pos: CellPos, cell_size: f32) -> Box2f {
    // Both borders are computed from integers so neighbours share them bit for bit
    let min = Vec2::new(cell_pos.x as f32, cell_pos.y as f32) * cell_size;
    let max = Vec2::new((cell_pos.x + 1) as f32, (cell_pos.y + 1) as f32) * cell_size;
    Box2f::new(min, max)
}

/// Cell containing `pos`, using the same rounding as the runtime grid
pub fn compute_cell_pos(pos: Vec2, cell_size: f32) -> CellPos {
    let inv = 1.0 / cell_size;
    CellPos::new(
        (pos.x * inv).ceil() as i32 - 1,
        (pos.y * inv).floor() as i32,
    )
}

#[derive(Debug, Clone)]
struct FloorInput {
    cell_pos: CellPos,
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    terrain_type: NavTerrainType,
}

/// Unpaired half-edge waiting to be classified
#[derive(Debug, Clone, Copy)]
struct OpenEdge {
    floor_idx: u32,
    half_edge_idx: u32,
    start: Vec3,
    end: Vec3,
}

/// Builder for NavMesh data
#[derive(Debug, Clone)]
pub struct NavMeshBuilder {
    cell_size: f32,
    generation_params: NavMeshGenerationParams,
    coord_system: CoordSystemConfig,
    guid: GuidCompound,
    flags: NavMeshFlags,
    /// Distance under which two vertices of different floors are considered equal
    vertex_tolerance: f32,
    floors: Vec<FloorInput>,
}

impl NavMeshBuilder {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            generation_params: NavMeshGenerationParams::default(),
            coord_system: CoordSystemConfig::default(),
            guid: GuidCompound::default(),
            flags: NavMeshFlags::empty(),
            vertex_tolerance: 1e-4,
            floors: Vec::new(),
        }
    }

    pub fn with_generation_params(mut self, params: NavMeshGenerationParams) -> Self {
        self.generation_params = params;
        self
    }

    pub fn with_coord_system(mut self, coord_system: CoordSystemConfig) -> Self {
        self.coord_system = coord_system;
        self
    }

    pub fn with_guid(mut self, guid: GuidCompound) -> Self {
        self.guid = guid;
        self
    }

    pub fn with_flags(mut self, flags: NavMeshFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_vertex_tolerance(mut self, tolerance: f32) -> Self {
        self.vertex_tolerance = tolerance;
        self
    }

    /// Adds one floor to the cell at `cell_pos`.
    ///
    /// Triangles reference `vertices` and may use either winding; they are stored
    /// counter-clockwise.
    pub fn add_floor(
        &mut self,
        cell_pos: CellPos,
        vertices: &[Vec3],
        triangles: &[[u32; 3]],
        terrain_type: NavTerrainType,
    ) -> &mut Self {
        self.floors.push(FloorInput {
            cell_pos,
            vertices: vertices.to_vec(),
            triangles: triangles.to_vec(),
            terrain_type,
        });
        self
    }

    /// Adds a triangle soup.
    ///
    /// Each triangle goes to the cell containing its centroid, vertices closer than the
    /// vertex tolerance are welded, and every connected group of triangles of one cell
    /// becomes a floor.
    pub fn add_triangles(&mut self, triangles: &[[Vec3; 3]], terrain_type: NavTerrainType) -> &mut Self {
        let mut per_cell: Vec<(CellPos, Vec<[Vec3; 3]>)> = Vec::new();
        for tri in triangles {
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            let cell_pos = compute_cell_pos(centroid.truncate(), self.cell_size);
            match per_cell.iter_mut().find(|(pos, _)| *pos == cell_pos) {
                Some((_, tris)) => tris.push(*tri),
                None => per_cell.push((cell_pos, vec![*tri])),
            }
        }

        for (cell_pos, tris) in per_cell {
            let mut vertices: Vec<Vec3> = Vec::new();
            let indexed: Vec<[u32; 3]> = tris
                .iter()
                .map(|tri| tri.map(|v| self.weld(&mut vertices, v)))
                .collect();

            for component in connected_triangle_groups(&indexed) {
                let mut floor_vertices = Vec::new();
                let mut remap: HashMap<u32, u32> = HashMap::new();
                let floor_triangles: Vec<[u32; 3]> = component
                    .iter()
                    .map(|&t| {
                        indexed[t].map(|v| {
                            *remap.entry(v).or_insert_with(|| {
                                floor_vertices.push(vertices[v as usize]);
                                (floor_vertices.len() - 1) as u32
                            })
                        })
                    })
                    .collect();
                self.add_floor(cell_pos, &floor_vertices, &floor_triangles, terrain_type);
            }
        }
        self
    }

    /// Adds a flat grid of cells, each one a single floor of `quads_per_side`² squares
    pub fn add_flat_grid(
        &mut self,
        first_cell: CellPos,
        cells_x: i32,
        cells_y: i32,
        quads_per_side: u32,
        altitude: f32,
        terrain_type: NavTerrainType,
    ) -> &mut Self {
        let n = quads_per_side.max(1);
        let step = self.cell_size / n as f32;
        for cy in 0..cells_y {
            for cx in 0..cells_x {
                let cell_pos = first_cell + CellPos::new(cx, cy);
                let aabb = cell_aabb(cell_pos, self.cell_size);
                // Border vertices must match the neighbour cells exactly
                let coord = |min: f32, max: f32, i: u32| {
                    if i == n {
                        max
                    } else {
                        min + i as f32 * step
                    }
                };

                let mut vertices = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
                for j in 0..=n {
                    for i in 0..=n {
                        vertices.push(Vec3::new(
                            coord(aabb.min.x, aabb.max.x, i),
                            coord(aabb.min.y, aabb.max.y, j),
                            altitude,
                        ));
                    }
                }

                let mut triangles = Vec::with_capacity((2 * n * n) as usize);
                for j in 0..n {
                    for i in 0..n {
                        let v0 = j * (n + 1) + i;
                        let v1 = v0 + 1;
                        let v2 = v1 + n + 1;
                        let v3 = v0 + n + 1;
                        triangles.push([v0, v1, v2]);
                        triangles.push([v0, v2, v3]);
                    }
                }
                self.add_floor(cell_pos, &vertices, &triangles, terrain_type);
            }
        }
        self
    }

    fn weld(&self, vertices: &mut Vec<Vec3>, v: Vec3) -> u32 {
        let tolerance_sq = self.vertex_tolerance * self.vertex_tolerance;
        if let Some(idx) = vertices.iter().position(|w| w.distance_squared(v) <= tolerance_sq) {
            return idx as u32;
        }
        vertices.push(v);
        (vertices.len() - 1) as u32
    }

    /// Builds the NavMesh and validates it
    pub fn build(&self) -> Result<NavMesh> {
        self.validate_inputs()?;

        let mut cell_positions: Vec<CellPos> = Vec::new();
        for input in &self.floors {
            if !cell_positions.contains(&input.cell_pos) {
                cell_positions.push(input.cell_pos);
            }
        }

        let mut cell_box = CellBox::empty();
        let mut cells = Vec::with_capacity(cell_positions.len());
        for cell_pos in cell_positions {
            cell_box.expand(cell_pos);
            let inputs: Vec<&FloorInput> = self
                .floors
                .iter()
                .filter(|input| input.cell_pos == cell_pos)
                .collect();
            cells.push(self.build_cell(cell_pos, &inputs)?);
        }

        let mut mesh = NavMesh {
            coord_system: self.coord_system,
            aabb: Default::default(),
            cell_box,
            cell_size: self.cell_size,
            guid: self.guid,
            generation_params: self.generation_params,
            cells,
            flags: self.flags,
        };
        mesh.compute_aabb();
        mesh.validate()?;
        Ok(mesh)
    }

    fn validate_inputs(&self) -> Result<()> {
        if !(self.cell_size > 0.0) {
            return Err(Error::InvalidMesh(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }
        self.coord_system.validate()?;

        for input in &self.floors {
            if input.triangles.is_empty() {
                return Err(Error::InvalidMesh(format!(
                    "empty floor in cell {}",
                    input.cell_pos
                )));
            }
            let vertex_count = input.vertices.len() as u32;
            for tri in &input.triangles {
                if tri.iter().any(|&v| v >= vertex_count) {
                    return Err(Error::InvalidMesh(format!(
                        "triangle {:?} references a vertex out of {}",
                        tri, vertex_count
                    )));
                }
                let [a, b, c] = tri.map(|v| input.vertices[v as usize]);
                if tri_area_2d(a, b, c).abs() < MIN_DOUBLE_AREA {
                    return Err(Error::InvalidMesh(format!(
                        "degenerate triangle {:?} in cell {}",
                        tri, input.cell_pos
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_cell(&self, cell_pos: CellPos, inputs: &[&FloorInput]) -> Result<NavCell> {
        let mut cell = NavCell::new(cell_pos, cell_aabb(cell_pos, self.cell_size));

        for input in inputs {
            cell.floors.push(Self::build_floor(input)?);
        }

        let open_edges = Self::collect_open_edges(&cell);
        self.build_boundary_links(&mut cell, &open_edges);

        for floor in &mut cell.floors {
            Self::chain_obstacles(floor);
        }
        Ok(cell)
    }

    /// Creates the half-edges of a floor and pairs the ones sharing an edge
    fn build_floor(input: &FloorInput) -> Result<NavFloor> {
        let mut half_edges = Vec::with_capacity(input.triangles.len() * 3);
        for tri in &input.triangles {
            let [a, b, c] = tri.map(|v| input.vertices[v as usize]);
            let ordered = if tri_area_2d(a, b, c) < 0.0 {
                [tri[0], tri[2], tri[1]]
            } else {
                *tri
            };
            for v in ordered {
                half_edges.push(NavHalfEdge::new(v, HalfEdgeKind::Obstacle(0)));
            }
        }

        let mut floor = NavFloor {
            aabb: Default::default(),
            vertices: input.vertices.clone(),
            half_edges,
            floor_links: Vec::new(),
            terrain_type: input.terrain_type,
        };
        floor.compute_aabb();
        Self::build_internal_links(&mut floor)?;
        Ok(floor)
    }

    fn build_internal_links(floor: &mut NavFloor) -> Result<()> {
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for idx in 0..floor.half_edge_count() {
            let key = (floor.start_vertex_idx(idx), floor.end_vertex_idx(idx));
            if edges.insert(key, idx).is_some() {
                return Err(Error::InvalidMesh(format!(
                    "edge {:?} is used twice with the same orientation",
                    key
                )));
            }
        }

        for idx in 0..floor.half_edge_count() {
            let reversed = (floor.end_vertex_idx(idx), floor.start_vertex_idx(idx));
            if let Some(&pair) = edges.get(&reversed) {
                floor.half_edges[idx as usize].set_kind(HalfEdgeKind::Paired(pair));
            }
        }
        Ok(())
    }

    fn collect_open_edges(cell: &NavCell) -> Vec<OpenEdge> {
        let mut open_edges = Vec::new();
        for (floor_idx, floor) in cell.floors.iter().enumerate() {
            for idx in 0..floor.half_edge_count() {
                if !matches!(floor.half_edge(idx).kind(), HalfEdgeKind::Paired(_)) {
                    open_edges.push(OpenEdge {
                        floor_idx: floor_idx as u32,
                        half_edge_idx: idx,
                        start: floor.start_vertex(idx),
                        end: floor.end_vertex(idx),
                    });
                }
            }
        }
        open_edges
    }

    /// Side of the cell both ends of the edge lie on
    fn boundary_dir(&self, cell: &NavCell, edge: &OpenEdge) -> Option<CardinalDir> {
        let tolerance = self.vertex_tolerance;
        let aabb = &cell.aabb;
        CardinalDir::ALL.into_iter().find(|&dir| {
            let on_side = |p: Vec3| match dir {
                CardinalDir::East => (p.x - aabb.max.x).abs() <= tolerance,
                CardinalDir::North => (p.y - aabb.max.y).abs() <= tolerance,
                CardinalDir::West => (p.x - aabb.min.x).abs() <= tolerance,
                CardinalDir::South => (p.y - aabb.min.y).abs() <= tolerance,
            };
            on_side(edge.start) && on_side(edge.end)
        })
    }

    /// Turns every unpaired half-edge into a cell boundary, a floor boundary or an obstacle
    fn build_boundary_links(&self, cell: &mut NavCell, open_edges: &[OpenEdge]) {
        let tolerance_sq = self.vertex_tolerance * self.vertex_tolerance;

        for edge in open_edges {
            let kind = if let Some(dir) = self.boundary_dir(cell, edge) {
                let list = &mut cell.boundary_edges[dir.index()];
                list.push(CellBoundaryEdge {
                    half_edge_idx: edge.half_edge_idx,
                    floor_idx: edge.floor_idx,
                });
                HalfEdgeKind::CellBoundary {
                    dir,
                    idx: (list.len() - 1) as u32,
                }
            } else if let Some(other) = open_edges.iter().find(|other| {
                other.floor_idx != edge.floor_idx
                    && other.start.distance_squared(edge.end) <= tolerance_sq
                    && other.end.distance_squared(edge.start) <= tolerance_sq
            }) {
                let floor = &mut cell.floors[edge.floor_idx as usize];
                floor.floor_links.push(FloorLink {
                    half_edge_idx: other.half_edge_idx,
                    floor_idx: other.floor_idx,
                });
                HalfEdgeKind::FloorBoundary((floor.floor_links.len() - 1) as u32)
            } else {
                HalfEdgeKind::Obstacle(edge.half_edge_idx)
            };

            cell.floors[edge.floor_idx as usize].half_edges[edge.half_edge_idx as usize]
                .set_kind(kind);
        }
    }

    /// Makes every obstacle half-edge point to the next obstacle half-edge along the floor
    /// contour
    fn chain_obstacles(floor: &mut NavFloor) {
        let count = floor.half_edge_count();
        let next_on_contour = |floor: &NavFloor, idx: u32| -> u32 {
            let mut candidate = next_half_edge_idx(idx);
            for _ in 0..count {
                match floor.half_edge(candidate).kind() {
                    HalfEdgeKind::Paired(pair) => candidate = next_half_edge_idx(pair),
                    _ => break,
                }
            }
            candidate
        };

        for idx in 0..count {
            if !matches!(floor.half_edge(idx).kind(), HalfEdgeKind::Obstacle(_)) {
                continue;
            }
            let mut next = next_on_contour(floor, idx);
            for _ in 0..count {
                if matches!(floor.half_edge(next).kind(), HalfEdgeKind::Obstacle(_)) {
                    break;
                }
                next = next_on_contour(floor, next);
            }
            floor.half_edges[idx as usize].set_kind(HalfEdgeKind::Obstacle(next));
        }
    }
}

/// Groups triangles sharing an edge
fn connected_triangle_groups(triangles: &[[u32; 3]]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..triangles.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut edge_owner: HashMap<(u32, u32), usize> = HashMap::new();
    for (t, tri) in triangles.iter().enumerate() {
        for n in 0..3 {
            let (a, b) = (tri[n], tri[(n + 1) % 3]);
            let key = (a.min(b), a.max(b));
            if let Some(&other) = edge_owner.get(&key) {
                let (ra, rb) = (find(&mut parent, t), find(&mut parent, other));
                parent[ra] = rb;
            } else {
                edge_owner.insert(key, t);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for t in 0..triangles.len() {
        let root = find(&mut parent, t);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, group)) => group.push(t),
            None => groups.push((root, vec![t])),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}
