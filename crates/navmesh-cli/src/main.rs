//! CLI utility for building, inspecting and querying NavMesh blobs

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glam::{Vec2, Vec3};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use navmesh::queries::{
    DiskCanGoQuery, DiskCastQuery, NearestTriangleFromPosQuery, PropagationQueryMemory, RayCastQuery,
};
use navmesh::{
    blob_endianness, swap_endianness, Endianness, NavMesh, NavMeshBuilder, NavMeshManager,
    NavMeshQueryServer, NavTriangleSafePtr, QueryBufferConfig,
};
use navmesh_common::CellPos;

/// A CLI utility for NavMesh blobs
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ByteOrder {
    Little,
    Big,
    Native,
}

impl From<ByteOrder> for Endianness {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::Little => Endianness::Little,
            ByteOrder::Big => Endianness::Big,
            ByteOrder::Native => Endianness::native(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a flat grid NavMesh blob
    Grid {
        /// Output blob file
        #[clap(long, value_parser)]
        output: PathBuf,

        /// Number of cells along X
        #[clap(long, default_value = "2")]
        cells_x: i32,

        /// Number of cells along Y
        #[clap(long, default_value = "2")]
        cells_y: i32,

        /// Side of a cell in meters
        #[clap(long, default_value = "10.0")]
        cell_size: f32,

        /// Number of quads along a cell side, each split in two triangles
        #[clap(long, default_value = "4")]
        quads: u32,

        /// Altitude of the grid
        #[clap(long, default_value = "0.0")]
        altitude: f32,

        /// Terrain type of every floor
        #[clap(long, default_value = "1")]
        terrain_type: u32,

        /// Byte order of the written blob
        #[clap(long, value_enum, default_value = "native")]
        byte_order: ByteOrder,
    },

    /// Print statistics about a blob
    Info {
        /// Input blob file
        #[clap(long, value_parser)]
        mesh: PathBuf,
    },

    /// Convert a blob to the other byte order
    Swap {
        /// Input blob file
        #[clap(long, value_parser)]
        input: PathBuf,

        /// Output blob file
        #[clap(long, value_parser)]
        output: PathBuf,
    },

    /// Test whether a disk can move in a straight line between two positions
    DiskCanGo {
        #[clap(long, value_parser)]
        mesh: PathBuf,

        /// Start position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        start: Vec3,

        /// Destination position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        dest: Vec3,

        #[clap(long, default_value = "0.4")]
        radius: f32,

        /// Terrain types the disk may walk on
        #[clap(long, default_value = "4294967295")]
        terrain_mask: u32,

        /// Print the triangles crossed by the propagation
        #[clap(long)]
        propagation: bool,
    },

    /// Move a disk along a direction until it hits a border
    DiskCast {
        #[clap(long, value_parser)]
        mesh: PathBuf,

        /// Start position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        start: Vec3,

        /// Direction in the X,Y plane (x,y)
        #[clap(long, value_parser = parse_direction)]
        dir: Vec2,

        #[clap(long, default_value = "10.0")]
        max_dist: f32,

        #[clap(long, default_value = "0.4")]
        radius: f32,

        #[clap(long, default_value = "4294967295")]
        terrain_mask: u32,
    },

    /// Move a point along a direction until it hits a border
    RayCast {
        #[clap(long, value_parser)]
        mesh: PathBuf,

        /// Start position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        start: Vec3,

        /// Direction in the X,Y plane (x,y)
        #[clap(long, value_parser = parse_direction)]
        dir: Vec2,

        #[clap(long, default_value = "10.0")]
        max_dist: f32,

        #[clap(long, default_value = "4294967295")]
        terrain_mask: u32,
    },

    /// Find the triangle nearest to a position
    Nearest {
        #[clap(long, value_parser)]
        mesh: PathBuf,

        /// Position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        pos: Vec3,

        /// Vertical search range in meters
        #[clap(long, default_value = "1.0")]
        range: f32,
    },
}

fn parse_floats(s: &str, expected: usize) -> Result<Vec<f32>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != expected {
        return Err(format!(
            "Vector must have {} components, got {}",
            expected,
            parts.len()
        ));
    }
    parts
        .iter()
        .map(|part| part.trim().parse::<f32>().map_err(|e| e.to_string()))
        .collect()
}

/// Parse a comma-separated position
fn parse_vector(s: &str) -> Result<Vec3, String> {
    let values = parse_floats(s, 3)?;
    Ok(Vec3::new(values[0], values[1], values[2]))
}

/// Parse a comma-separated direction and normalize it
fn parse_direction(s: &str) -> Result<Vec2, String> {
    let values = parse_floats(s, 2)?;
    Vec2::new(values[0], values[1])
        .try_normalize()
        .ok_or_else(|| "Direction must not be null".to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Grid {
            output,
            cells_x,
            cells_y,
            cell_size,
            quads,
            altitude,
            terrain_type,
            byte_order,
        } => build_grid(
            &output,
            cells_x,
            cells_y,
            cell_size,
            quads,
            altitude,
            terrain_type,
            byte_order.into(),
        ),
        Commands::Info { mesh } => print_info(&mesh),
        Commands::Swap { input, output } => swap_blob(&input, &output),
        Commands::DiskCanGo {
            mesh,
            start,
            dest,
            radius,
            terrain_mask,
            propagation,
        } => disk_can_go(&mesh, start, dest, radius, terrain_mask, propagation),
        Commands::DiskCast {
            mesh,
            start,
            dir,
            max_dist,
            radius,
            terrain_mask,
        } => disk_cast(&mesh, start, dir, max_dist, radius, terrain_mask),
        Commands::RayCast {
            mesh,
            start,
            dir,
            max_dist,
            terrain_mask,
        } => ray_cast(&mesh, start, dir, max_dist, terrain_mask),
        Commands::Nearest { mesh, pos, range } => nearest_triangle(&mesh, pos, range),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_grid(
    output: &Path,
    cells_x: i32,
    cells_y: i32,
    cell_size: f32,
    quads: u32,
    altitude: f32,
    terrain_type: u32,
    endianness: Endianness,
) -> Result<()> {
    if cells_x <= 0 || cells_y <= 0 {
        bail!("The grid needs at least one cell along each axis");
    }

    println!(
        "Building a {}x{} grid of {}m cells...",
        cells_x, cells_y, cell_size
    );

    let mut builder = NavMeshBuilder::new(cell_size);
    builder.add_flat_grid(CellPos::ZERO, cells_x, cells_y, quads, altitude, terrain_type);
    let mesh = builder
        .build()
        .map_err(|e| anyhow!("Failed to build the grid: {}", e))?;

    println!(
        "Grid built: {} cells, {} floors, {} triangles",
        mesh.cell_count(),
        mesh.floor_count(),
        mesh.triangle_count()
    );

    mesh.save_to_file_with_endianness(output, endianness)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    println!("Saved {:?} endian blob to {}", endianness, output.display());
    Ok(())
}

fn load_mesh(path: &Path) -> Result<NavMesh> {
    println!("Loading navigation mesh from {}...", path.display());
    NavMesh::load_from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn load_manager(path: &Path) -> Result<NavMeshManager> {
    let mesh = load_mesh(path)?;
    let mut manager = NavMeshManager::default();
    manager
        .add_nav_mesh(Arc::new(mesh))
        .map_err(|e| anyhow!("Failed to insert the navigation mesh: {}", e))?;
    Ok(manager)
}

fn print_info(path: &Path) -> Result<()> {
    let blob = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let endianness = blob_endianness(&blob)?;
    let mesh = NavMesh::from_blob(&blob)?;

    println!("Blob: {} bytes, {:?} endian", blob.len(), endianness);
    println!("Guid: {:?}", mesh.guid);
    println!("Flags: {:?}", mesh.flags);
    println!("Cell size: {}", mesh.cell_size);
    println!(
        "Cell box: ({}, {}) to ({}, {})",
        mesh.cell_box.min.x, mesh.cell_box.min.y, mesh.cell_box.max.x, mesh.cell_box.max.y
    );
    println!("Bounds: min={:?}, max={:?}", mesh.aabb.min, mesh.aabb.max);
    println!(
        "Generation: radius {}, height {}, step {}, slope {}",
        mesh.generation_params.entity_radius,
        mesh.generation_params.entity_height,
        mesh.generation_params.step_max,
        mesh.generation_params.slope_max
    );
    println!(
        "Content: {} cells, {} floors, {} triangles",
        mesh.cell_count(),
        mesh.floor_count(),
        mesh.triangle_count()
    );
    Ok(())
}

fn swap_blob(input: &Path, output: &Path) -> Result<()> {
    let mut blob =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let current = blob_endianness(&blob)?;
    swap_endianness(&mut blob, current)?;
    std::fs::write(output, &blob)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Converted {} from {:?} to {:?} endian",
        input.display(),
        current,
        current.swapped()
    );
    Ok(())
}

fn describe_triangle(triangle: Option<&NavTriangleSafePtr>) -> String {
    match triangle {
        Some(triangle) => format!(
            "cell {} floor {} triangle {}",
            triangle.floor().cell().cell_idx(),
            triangle.floor().floor_idx(),
            triangle.triangle_idx()
        ),
        None => "none".to_string(),
    }
}

fn disk_can_go(
    path: &Path,
    start: Vec3,
    dest: Vec3,
    radius: f32,
    terrain_mask: u32,
    propagation: bool,
) -> Result<()> {
    let manager = load_manager(path)?;
    let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

    let mut query = DiskCanGoQuery::new(start, dest, radius);
    query.terrain_type_mask = terrain_mask;
    if propagation {
        query.memory = PropagationQueryMemory::enabled();
    }
    server.disk_can_go(&mut query)?;

    println!("Result: {:?}", query.get_result());
    println!("Start triangle: {}", describe_triangle(query.start_triangle.as_ref()));
    println!("Dest triangle: {}", describe_triangle(query.dest_triangle.as_ref()));
    if propagation {
        println!("Propagation: {} triangles", query.memory.count);
        for key in server.propagation_triangles() {
            println!(
                "  cell {} floor {} triangle {}",
                key.cell, key.floor, key.triangle
            );
        }
    }
    Ok(())
}

fn disk_cast(
    path: &Path,
    start: Vec3,
    dir: Vec2,
    max_dist: f32,
    radius: f32,
    terrain_mask: u32,
) -> Result<()> {
    let manager = load_manager(path)?;
    let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

    let mut query = DiskCastQuery::new(start, radius, dir, max_dist);
    query.terrain_type_mask = terrain_mask;
    server.disk_cast(&mut query)?;

    println!("Result: {:?}", query.get_result());
    println!("Arrival: {:?}", query.arrival_pos);
    println!("Arrival triangle: {}", describe_triangle(query.arrival_triangle.as_ref()));
    if query.intersected_half_edge.is_some() {
        println!("Collision: {:?}", query.collision_pos);
    }
    Ok(())
}

fn ray_cast(path: &Path, start: Vec3, dir: Vec2, max_dist: f32, terrain_mask: u32) -> Result<()> {
    let manager = load_manager(path)?;
    let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

    let mut query = RayCastQuery::new(start, dir, max_dist);
    query.terrain_type_mask = terrain_mask;
    server.ray_cast(&mut query)?;

    println!("Result: {:?}", query.get_result());
    println!("Arrival: {:?}", query.arrival_pos);
    println!("Arrival triangle: {}", describe_triangle(query.arrival_triangle.as_ref()));
    if query.intersected_half_edge.is_some() {
        println!("Collision: {:?}", query.collision_pos);
    }
    Ok(())
}

fn nearest_triangle(path: &Path, pos: Vec3, range: f32) -> Result<()> {
    let manager = load_manager(path)?;
    let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

    let mut query = NearestTriangleFromPosQuery::new(pos).with_search_range(range);
    server.nearest_triangle_from_pos(&mut query)?;

    println!("Result: {:?}", query.get_result());
    println!("Triangle: {}", describe_triangle(query.triangle.as_ref()));
    if query.triangle.is_some() {
        println!("Relative altitude: {}", query.relative_altitude);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1,2.5,-3"), Ok(Vec3::new(1.0, 2.5, -3.0)));
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("1,a,3").is_err());
    }

    #[test]
    fn test_parse_direction_normalizes() {
        assert_eq!(parse_direction("0,2"), Ok(Vec2::Y));
        assert!(parse_direction("0,0").is_err());
    }
}
