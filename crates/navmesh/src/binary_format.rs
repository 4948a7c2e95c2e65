//! NavMesh blob format
//!
//! A blob starts with an 8-byte type tag (`"NavMesh\0"`), the format version and an
//! endianness marker written in the blob's own byte order. Every field that follows is a
//! 4-byte word and every array is a `u32` count followed by its elements, in this order:
//!
//! ```text
//! mesh  : coord system (5) | aabb (6) | cell box (4) | cell size | guid (4) + timestamp
//!         | generation params (4) | cells | flags
//! cell  : cell pos (2) | aabb (4) | floors | 4 x boundary edges (half-edge, floor)
//! floor : aabb (6) | vertices (3) | half-edges (start vertex, data)
//!         | floor links (half-edge, floor) | terrain type
//! ```
//!
//! Because every scalar is a word, [`swap_endianness`] can convert a blob in place by walking
//! it with the counts, without decoding it.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use navmesh_common::{
    Box2f, Box3f, CellBox, CellPos, CoordSystemConfig, Error, Result, Vec2, Vec3,
};

use crate::nav_cell::NavCell;
use crate::nav_floor::NavFloor;
use crate::nav_half_edge::NavHalfEdge;
use crate::nav_mesh::NavMesh;
use crate::nav_mesh_types::{
    CardinalDir, CellBoundaryEdge, FloorLink, GuidCompound, NavMeshFlags, NavMeshGenerationParams,
};

/// Type tag at the start of every NavMesh blob
pub const NAVMESH_BLOB_TYPE: [u8; 8] = *b"NavMesh\0";

/// Current blob version
pub const NAVMESH_BLOB_VERSION: u32 = 8;

/// Written in the blob byte order, tells readers which order that is
const ENDIANNESS_MARKER: u32 = 0x0102_0304;

const HEADER_SIZE: usize = 16;
const WORD: usize = 4;

/// Byte order of a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    pub fn swapped(self) -> Self {
        match self {
            Endianness::Little => Endianness::Big,
            Endianness::Big => Endianness::Little,
        }
    }
}

/// Reads the header of `blob` and returns its byte order
pub fn blob_endianness(blob: &[u8]) -> Result<Endianness> {
    if blob.len() < HEADER_SIZE || blob[..8] != NAVMESH_BLOB_TYPE {
        return Err(Error::WrongBlobType);
    }
    let marker = &blob[12..16];
    let endianness = if LittleEndian::read_u32(marker) == ENDIANNESS_MARKER {
        Endianness::Little
    } else if BigEndian::read_u32(marker) == ENDIANNESS_MARKER {
        Endianness::Big
    } else {
        return Err(Error::InvalidMesh("unknown endianness marker".to_string()));
    };

    let version = match endianness {
        Endianness::Little => LittleEndian::read_u32(&blob[8..12]),
        Endianness::Big => BigEndian::read_u32(&blob[8..12]),
    };
    if version != NAVMESH_BLOB_VERSION {
        return Err(Error::WrongVersion {
            found: version,
            expected: NAVMESH_BLOB_VERSION,
        });
    }
    Ok(endianness)
}

fn write_count<B: ByteOrder, W: Write>(writer: &mut W, len: usize) -> Result<()> {
    let count = u32::try_from(len)
        .map_err(|_| Error::InvalidMesh(format!("array of {} items is too large", len)))?;
    writer.write_u32::<B>(count)?;
    Ok(())
}

fn write_vec3<B: ByteOrder, W: Write>(writer: &mut W, v: Vec3) -> Result<()> {
    writer.write_f32::<B>(v.x)?;
    writer.write_f32::<B>(v.y)?;
    writer.write_f32::<B>(v.z)?;
    Ok(())
}

fn write_box3<B: ByteOrder, W: Write>(writer: &mut W, aabb: &Box3f) -> Result<()> {
    write_vec3::<B, W>(writer, aabb.min)?;
    write_vec3::<B, W>(writer, aabb.max)
}

/// Blob reader keeping track of the bytes left, so that corrupted counts are rejected
/// before anything gets allocated
struct BlobReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BlobReader<'a> {
    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len();
        len.saturating_sub(self.cursor.position() as usize)
    }

    fn u32<B: ByteOrder>(&mut self) -> Result<u32> {
        Ok(self.cursor.read_u32::<B>()?)
    }

    fn i32<B: ByteOrder>(&mut self) -> Result<i32> {
        Ok(self.cursor.read_i32::<B>()?)
    }

    fn f32<B: ByteOrder>(&mut self) -> Result<f32> {
        Ok(self.cursor.read_f32::<B>()?)
    }

    fn count<B: ByteOrder>(&mut self, words_per_item: usize) -> Result<usize> {
        let count = self.u32::<B>()? as usize;
        if count.saturating_mul(words_per_item * WORD) > self.remaining() {
            return Err(Error::InvalidMesh(format!(
                "array of {} items does not fit in the {} bytes left",
                count,
                self.remaining()
            )));
        }
        Ok(count)
    }

    fn vec3<B: ByteOrder>(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.f32::<B>()?, self.f32::<B>()?, self.f32::<B>()?))
    }

    fn box3<B: ByteOrder>(&mut self) -> Result<Box3f> {
        Ok(Box3f::new(self.vec3::<B>()?, self.vec3::<B>()?))
    }
}

impl NavFloor {
    fn write_to<B: ByteOrder, W: Write>(&self, writer: &mut W) -> Result<()> {
        write_box3::<B, W>(writer, &self.aabb)?;

        write_count::<B, W>(writer, self.vertices.len())?;
        for v in &self.vertices {
            write_vec3::<B, W>(writer, *v)?;
        }

        write_count::<B, W>(writer, self.half_edges.len())?;
        for half_edge in &self.half_edges {
            writer.write_u32::<B>(half_edge.start_vertex_idx)?;
            writer.write_u32::<B>(half_edge.data)?;
        }

        write_count::<B, W>(writer, self.floor_links.len())?;
        for link in &self.floor_links {
            writer.write_u32::<B>(link.half_edge_idx)?;
            writer.write_u32::<B>(link.floor_idx)?;
        }

        writer.write_u32::<B>(self.terrain_type)?;
        Ok(())
    }

    fn read_from<B: ByteOrder>(reader: &mut BlobReader<'_>) -> Result<Self> {
        let aabb = reader.box3::<B>()?;

        let count = reader.count::<B>(3)?;
        let mut vertices = Vec::with_capacity(count);
        for _ in 0..count {
            vertices.push(reader.vec3::<B>()?);
        }

        let count = reader.count::<B>(2)?;
        let mut half_edges = Vec::with_capacity(count);
        for _ in 0..count {
            half_edges.push(NavHalfEdge {
                start_vertex_idx: reader.u32::<B>()?,
                data: reader.u32::<B>()?,
            });
        }

        let count = reader.count::<B>(2)?;
        let mut floor_links = Vec::with_capacity(count);
        for _ in 0..count {
            floor_links.push(FloorLink {
                half_edge_idx: reader.u32::<B>()?,
                floor_idx: reader.u32::<B>()?,
            });
        }

        Ok(Self {
            aabb,
            vertices,
            half_edges,
            floor_links,
            terrain_type: reader.u32::<B>()?,
        })
    }
}

impl NavCell {
    fn write_to<B: ByteOrder, W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<B>(self.cell_pos.x)?;
        writer.write_i32::<B>(self.cell_pos.y)?;
        writer.write_f32::<B>(self.aabb.min.x)?;
        writer.write_f32::<B>(self.aabb.min.y)?;
        writer.write_f32::<B>(self.aabb.max.x)?;
        writer.write_f32::<B>(self.aabb.max.y)?;

        write_count::<B, W>(writer, self.floors.len())?;
        for floor in &self.floors {
            floor.write_to::<B, W>(writer)?;
        }

        for dir in CardinalDir::ALL {
            let edges = self.boundary_edges(dir);
            write_count::<B, W>(writer, edges.len())?;
            for edge in edges {
                writer.write_u32::<B>(edge.half_edge_idx)?;
                writer.write_u32::<B>(edge.floor_idx)?;
            }
        }
        Ok(())
    }

    fn read_from<B: ByteOrder>(reader: &mut BlobReader<'_>) -> Result<Self> {
        let cell_pos = CellPos::new(reader.i32::<B>()?, reader.i32::<B>()?);
        let min = Vec2::new(reader.f32::<B>()?, reader.f32::<B>()?);
        let max = Vec2::new(reader.f32::<B>()?, reader.f32::<B>()?);
        let mut cell = NavCell::new(cell_pos, Box2f::new(min, max));

        // A floor is at least 10 words long
        let count = reader.count::<B>(10)?;
        cell.floors.reserve(count);
        for _ in 0..count {
            cell.floors.push(NavFloor::read_from::<B>(reader)?);
        }

        for dir in CardinalDir::ALL {
            let count = reader.count::<B>(2)?;
            let edges = &mut cell.boundary_edges[dir.index()];
            edges.reserve(count);
            for _ in 0..count {
                edges.push(CellBoundaryEdge {
                    half_edge_idx: reader.u32::<B>()?,
                    floor_idx: reader.u32::<B>()?,
                });
            }
        }
        Ok(cell)
    }
}

impl NavMesh {
    /// Writes the mesh as a blob in the byte order `B`
    pub fn write_to<B: ByteOrder, W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&NAVMESH_BLOB_TYPE)?;
        writer.write_u32::<B>(NAVMESH_BLOB_VERSION)?;
        writer.write_u32::<B>(ENDIANNESS_MARKER)?;

        let cs = &self.coord_system;
        writer.write_f32::<B>(cs.one_meter_in_client_units)?;
        writer.write_u32::<B>(cs.client_axis_for_x)?;
        writer.write_u32::<B>(cs.client_axis_for_y)?;
        writer.write_u32::<B>(cs.client_axis_for_z)?;
        writer.write_f32::<B>(cs.integer_precision)?;

        write_box3::<B, W>(writer, &self.aabb)?;
        writer.write_i32::<B>(self.cell_box.min.x)?;
        writer.write_i32::<B>(self.cell_box.min.y)?;
        writer.write_i32::<B>(self.cell_box.max.x)?;
        writer.write_i32::<B>(self.cell_box.max.y)?;
        writer.write_f32::<B>(self.cell_size)?;

        for word in self.guid.guid {
            writer.write_u32::<B>(word)?;
        }
        writer.write_u32::<B>(self.guid.timestamp)?;

        let params = &self.generation_params;
        writer.write_f32::<B>(params.entity_radius)?;
        writer.write_f32::<B>(params.entity_height)?;
        writer.write_f32::<B>(params.step_max)?;
        writer.write_f32::<B>(params.slope_max)?;

        write_count::<B, W>(writer, self.cells.len())?;
        for cell in &self.cells {
            cell.write_to::<B, W>(writer)?;
        }

        writer.write_u32::<B>(self.flags.bits())?;
        Ok(())
    }

    /// Encodes the mesh as a blob in the given byte order
    pub fn to_blob(&self, endianness: Endianness) -> Result<Vec<u8>> {
        let mut blob = Vec::new();
        match endianness {
            Endianness::Little => self.write_to::<LittleEndian, _>(&mut blob)?,
            Endianness::Big => self.write_to::<BigEndian, _>(&mut blob)?,
        }
        Ok(blob)
    }

    /// Decodes a blob of either byte order
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let endianness = blob_endianness(blob)?;
        let mut reader = BlobReader {
            cursor: Cursor::new(blob),
        };
        reader.cursor.set_position(HEADER_SIZE as u64);

        let mesh = match endianness {
            Endianness::Little => Self::read_body::<LittleEndian>(&mut reader)?,
            Endianness::Big => Self::read_body::<BigEndian>(&mut reader)?,
        };
        mesh.validate()?;

        log::debug!(
            "Loaded NavMesh blob ({:?}, {} bytes): {} cells, {} floors, {} triangles",
            endianness,
            blob.len(),
            mesh.cell_count(),
            mesh.floor_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Reads a whole blob from `reader`
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut blob = Vec::new();
        reader.read_to_end(&mut blob)?;
        Self::from_blob(&blob)
    }

    fn read_body<B: ByteOrder>(reader: &mut BlobReader<'_>) -> Result<Self> {
        let coord_system = CoordSystemConfig {
            one_meter_in_client_units: reader.f32::<B>()?,
            client_axis_for_x: reader.u32::<B>()?,
            client_axis_for_y: reader.u32::<B>()?,
            client_axis_for_z: reader.u32::<B>()?,
            integer_precision: reader.f32::<B>()?,
        };
        coord_system.validate()?;

        let aabb = reader.box3::<B>()?;
        let cell_box = CellBox::new(
            CellPos::new(reader.i32::<B>()?, reader.i32::<B>()?),
            CellPos::new(reader.i32::<B>()?, reader.i32::<B>()?),
        );
        let cell_size = reader.f32::<B>()?;

        let mut guid = GuidCompound::default();
        for word in guid.guid.iter_mut() {
            *word = reader.u32::<B>()?;
        }
        guid.timestamp = reader.u32::<B>()?;

        let generation_params = NavMeshGenerationParams {
            entity_radius: reader.f32::<B>()?,
            entity_height: reader.f32::<B>()?,
            step_max: reader.f32::<B>()?,
            slope_max: reader.f32::<B>()?,
        };

        // A cell is at least 11 words long
        let count = reader.count::<B>(11)?;
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            cells.push(NavCell::read_from::<B>(reader)?);
        }

        let flags = NavMeshFlags::from_bits_truncate(reader.u32::<B>()?);

        Ok(Self {
            coord_system,
            aabb,
            cell_box,
            cell_size,
            guid,
            generation_params,
            cells,
            flags,
        })
    }

    /// Saves the mesh as a blob in the native byte order
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_to_file_with_endianness(path, Endianness::native())
    }

    pub fn save_to_file_with_endianness<P: AsRef<Path>>(
        &self,
        path: P,
        endianness: Endianness,
    ) -> Result<()> {
        let blob = self.to_blob(endianness)?;
        std::fs::write(path, blob)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let blob = std::fs::read(path)?;
        Self::from_blob(&blob)
    }
}

/// Walks a blob word by word, reversing the bytes of each word in place unless `dry_run`
/// is set
struct EndiannessSwapper<'a> {
    blob: &'a mut [u8],
    pos: usize,
    from: Endianness,
    dry_run: bool,
}

impl EndiannessSwapper<'_> {
    /// Swaps one word and returns its value read in the original byte order
    fn word(&mut self) -> Result<u32> {
        let end = self.pos + WORD;
        let bytes = self
            .blob
            .get_mut(self.pos..end)
            .ok_or_else(|| Error::InvalidMesh("truncated blob".to_string()))?;
        let value = match self.from {
            Endianness::Little => LittleEndian::read_u32(bytes),
            Endianness::Big => BigEndian::read_u32(bytes),
        };
        if !self.dry_run {
            bytes.reverse();
        }
        self.pos = end;
        Ok(value)
    }

    fn words(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.word()?;
        }
        Ok(())
    }

    /// Swaps a count and the `words_per_item` words of each of its items
    fn array(&mut self, words_per_item: usize) -> Result<usize> {
        let count = self.word()? as usize;
        let left = (self.blob.len() - self.pos) / WORD;
        if count.saturating_mul(words_per_item) > left {
            return Err(Error::InvalidMesh("truncated blob".to_string()));
        }
        self.words(count * words_per_item)?;
        Ok(count)
    }

    fn floor(&mut self) -> Result<()> {
        self.words(6)?;
        self.array(3)?;
        self.array(2)?;
        self.array(2)?;
        self.word()?;
        Ok(())
    }

    fn cell(&mut self) -> Result<()> {
        self.words(6)?;
        let floor_count = self.word()?;
        for _ in 0..floor_count {
            self.floor()?;
        }
        for _ in CardinalDir::ALL {
            self.array(2)?;
        }
        Ok(())
    }

    /// Walks the version, the marker and the NavMesh data up to the end of the blob
    fn blob(&mut self) -> Result<()> {
        self.words(2)?;
        self.mesh()?;
        if self.pos != self.blob.len() {
            return Err(Error::InvalidMesh(format!(
                "{} trailing bytes after the NavMesh data",
                self.blob.len() - self.pos
            )));
        }
        Ok(())
    }

    fn mesh(&mut self) -> Result<()> {
        // coord system, aabb, cell box, cell size, guid, generation params
        self.words(5 + 6 + 4 + 1 + 5 + 4)?;
        let cell_count = self.word()?;
        for _ in 0..cell_count {
            self.cell()?;
        }
        self.word()?;
        Ok(())
    }
}

/// Converts a blob stored in `current` byte order to the opposite order, in place.
///
/// Applying it twice gives back the original bytes. The blob is left untouched when it
/// is malformed.
pub fn swap_endianness(blob: &mut [u8], current: Endianness) -> Result<()> {
    if blob_endianness(blob)? != current {
        return Err(Error::InvalidMesh(format!(
            "blob is not stored in {:?} byte order",
            current
        )));
    }

    for dry_run in [true, false] {
        EndiannessSwapper {
            blob: &mut *blob,
            pos: 8,
            from: current,
            dry_run,
        }
        .blob()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mesh_helpers::{create_grid_mesh, create_two_floor_mesh};

    #[test]
    fn test_blob_round_trip() -> Result<()> {
        let mesh = create_two_floor_mesh()?;
        for endianness in [Endianness::Little, Endianness::Big] {
            let blob = mesh.to_blob(endianness)?;
            assert_eq!(&blob[..8], b"NavMesh\0");
            assert_eq!(blob_endianness(&blob)?, endianness);
            assert_eq!(NavMesh::from_blob(&blob)?, mesh);
        }
        Ok(())
    }

    #[test]
    fn test_swap_is_its_own_inverse() -> Result<()> {
        let mesh = create_grid_mesh(3, 2, 4.0, CellPos::new(-1, 2))?;
        let original = mesh.to_blob(Endianness::Little)?;

        let mut blob = original.clone();
        swap_endianness(&mut blob, Endianness::Little)?;
        assert_ne!(blob, original);
        assert_eq!(blob, mesh.to_blob(Endianness::Big)?);
        assert_eq!(NavMesh::from_blob(&blob)?, mesh);

        swap_endianness(&mut blob, Endianness::Big)?;
        assert_eq!(blob, original);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_blobs() -> Result<()> {
        let mesh = create_grid_mesh(1, 1, 4.0, CellPos::ZERO)?;
        let blob = mesh.to_blob(Endianness::Little)?;

        let mut wrong_type = blob.clone();
        wrong_type[0] = b'X';
        assert!(matches!(NavMesh::from_blob(&wrong_type), Err(Error::WrongBlobType)));

        let mut wrong_version = blob.clone();
        LittleEndian::write_u32(&mut wrong_version[8..12], 7);
        assert!(matches!(
            NavMesh::from_blob(&wrong_version),
            Err(Error::WrongVersion {
                found: 7,
                expected: NAVMESH_BLOB_VERSION
            })
        ));

        let truncated = &blob[..blob.len() - 9];
        assert!(NavMesh::from_blob(truncated).is_err());

        let mut swapped = blob.clone();
        assert!(swap_endianness(&mut swapped, Endianness::Big).is_err());
        Ok(())
    }

    #[test]
    fn test_failed_swap_leaves_blob_untouched() -> Result<()> {
        let mesh = create_grid_mesh(3, 2, 4.0, CellPos::new(-1, 2))?;
        let blob = mesh.to_blob(Endianness::native())?;

        let original = blob[..blob.len() - 4].to_vec();
        let mut truncated = original.clone();
        assert!(swap_endianness(&mut truncated, Endianness::native()).is_err());
        assert_eq!(truncated, original);
        assert_eq!(blob_endianness(&truncated)?, Endianness::native());

        let mut padded = blob.clone();
        padded.extend_from_slice(&[0; 4]);
        let original = padded.clone();
        assert!(swap_endianness(&mut padded, Endianness::native()).is_err());
        assert_eq!(padded, original);
        Ok(())
    }

    #[test]
    fn test_file_round_trip() -> Result<()> {
        let mesh = create_two_floor_mesh()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("two_floors.navmesh");
        mesh.save_to_file_with_endianness(&path, Endianness::Big)?;
        assert_eq!(NavMesh::load_from_file(&path)?, mesh);
        Ok(())
    }
}
