//! Coordinate spaces: signed voxel lattice, block size, and region shapes.

use serde::{Deserialize, Serialize};

/// A signed 3D point, used for both voxel and block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point3 {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Point3 {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Point3 { x, y, z }
    }

    pub const ZERO: Point3 = Point3::new(0, 0, 0);

    pub fn add(self, other: Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn min(self, other: Point3) -> Point3 {
        Point3::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    pub fn max(self, other: Point3) -> Point3 {
        Point3::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

/// Per-dataset block size in voxels, default 16x16x16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSize {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Default for BlockSize {
    fn default() -> Self {
        BlockSize { x: 16, y: 16, z: 16 }
    }
}

impl BlockSize {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        BlockSize { x, y, z }
    }

    /// `b = floor(v / BlockSize)`, elementwise, using Euclidean division so
    /// negative voxel coordinates floor towards negative infinity rather than
    /// truncating towards zero.
    pub fn voxel_to_block(&self, v: Point3) -> Point3 {
        Point3::new(
            v.x.div_euclid(self.x),
            v.y.div_euclid(self.y),
            v.z.div_euclid(self.z),
        )
    }

    /// In-block offset of a voxel, always in `[0, BlockSize)`.
    pub fn voxel_offset(&self, v: Point3) -> Point3 {
        Point3::new(
            v.x.rem_euclid(self.x),
            v.y.rem_euclid(self.y),
            v.z.rem_euclid(self.z),
        )
    }

    /// Minimum voxel coordinate of block `b` — `OffsetToBlock`.
    pub fn offset_to_block(&self, b: Point3) -> Point3 {
        Point3::new(b.x * self.x, b.y * self.y, b.z * self.z)
    }

    /// One-past-max voxel of block `b` (half-open on the high side).
    pub fn add_size(&self, block_min: Point3) -> Point3 {
        Point3::new(
            block_min.x + self.x,
            block_min.y + self.y,
            block_min.z + self.z,
        )
    }

    pub fn voxel_bytes(&self, bytes_per_voxel: u32, channels: u32) -> u64 {
        (bytes_per_voxel as u64) * (channels as u64)
    }
}

/// Shape of a requested region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Xy,
    Xz,
    Yz,
    Vol,
    /// Arbitrary-oriented plane. The enum variant exists so requests can
    /// name it; the kernel refuses to copy it (see `kernel::copy_chunk`).
    Arb,
}

/// Get reads a block's bytes into the caller's buffer; Put writes the
/// caller's buffer into the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Get,
    Put,
}

/// A client-requested 2D slice or 3D subvolume.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub shape: Shape,
    pub start: Point3,
    /// Width, height, depth in voxels (depth is 1 for slices).
    pub width: i64,
    pub height: i64,
    pub depth: i64,
    /// Bytes per image row in the caller's buffer.
    pub stride: i64,
}

impl Region {
    pub fn new_slice(shape: Shape, start: Point3, width: i64, height: i64, stride: i64) -> Self {
        Region {
            shape,
            start,
            width,
            height,
            depth: 1,
            stride,
        }
    }

    pub fn new_vol(start: Point3, width: i64, height: i64, depth: i64) -> Self {
        Region {
            shape: Shape::Vol,
            start,
            width,
            height,
            depth,
            stride: 0,
        }
    }

    /// One-past-max voxel of the region, projected onto the shape's axes.
    pub fn end_voxel(&self) -> Point3 {
        match self.shape {
            Shape::Xy => Point3::new(
                self.start.x + self.width,
                self.start.y + self.height,
                self.start.z + 1,
            ),
            Shape::Xz => Point3::new(
                self.start.x + self.width,
                self.start.y + 1,
                self.start.z + self.height,
            ),
            Shape::Yz => Point3::new(
                self.start.x + 1,
                self.start.y + self.width,
                self.start.z + self.height,
            ),
            Shape::Vol => Point3::new(
                self.start.x + self.width,
                self.start.y + self.height,
                self.start.z + self.depth,
            ),
            Shape::Arb => self.start,
        }
    }

    /// Last included voxel (inclusive), used for block-range computation.
    pub fn last_voxel(&self) -> Point3 {
        let end = self.end_voxel();
        Point3::new(end.x - 1, end.y - 1, end.z - 1)
    }
}
