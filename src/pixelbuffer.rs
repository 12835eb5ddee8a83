//! Typed 2D view over a raw interleaved-channel byte buffer, for the small
//! set of `(channels, bytes_per_voxel)` combinations an external image codec
//! is expected to support.

use crate::error::{EngineError, Result};

/// Supported `(channels, bytes_per_voxel)` pairs: (1 ch x {1,2,4,8}) and
/// (4 ch x {1,2}).
fn is_supported(channels: u32, bytes_per_voxel: u32) -> bool {
    matches!(
        (channels, bytes_per_voxel),
        (1, 1) | (1, 2) | (1, 4) | (1, 8) | (4, 1) | (4, 2)
    )
}

/// A borrowed view over a raw pixel buffer. Never copies; the caller must
/// not resize the backing buffer while a view is alive.
pub struct PixelView<'a> {
    bytes: &'a [u8],
    width: u32,
    height: u32,
    channels: u32,
    bytes_per_voxel: u32,
    stride: usize,
}

impl<'a> PixelView<'a> {
    pub fn new(bytes: &'a [u8], width: u32, height: u32, channels: u32, bytes_per_voxel: u32, stride: usize) -> Result<Self> {
        if !is_supported(channels, bytes_per_voxel) {
            return Err(EngineError::Unsupported(format!(
                "unsupported pixel format: {channels} channels x {bytes_per_voxel} bytes/voxel"
            )));
        }
        let voxel_bytes = (channels * bytes_per_voxel) as usize;
        let min_stride = width as usize * voxel_bytes;
        if stride < min_stride {
            return Err(EngineError::BadRequest(format!(
                "stride {stride} too small for width {width} ({min_stride} required)"
            )));
        }
        let required = stride * height as usize;
        if bytes.len() < required {
            return Err(EngineError::BadRequest(format!(
                "buffer of {} bytes too small for {height} rows of stride {stride}",
                bytes.len()
            )));
        }
        Ok(PixelView {
            bytes,
            width,
            height,
            channels,
            bytes_per_voxel,
            stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn voxel_bytes(&self) -> usize {
        (self.channels * self.bytes_per_voxel) as usize
    }

    /// Returns the byte slice for one row, including any stride padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.bytes[start..start + self.stride]
    }

    /// Returns the bytes for one voxel at `(x, y)`.
    pub fn voxel(&self, x: u32, y: u32) -> &[u8] {
        let row = self.row(y);
        let vb = self.voxel_bytes();
        let start = x as usize * vb;
        &row[start..start + vb]
    }
}

/// Mutable counterpart of `PixelView`, used when the codec seam writes
/// decoded bytes back into the caller's buffer.
pub struct PixelViewMut<'a> {
    bytes: &'a mut [u8],
    width: u32,
    height: u32,
    channels: u32,
    bytes_per_voxel: u32,
    stride: usize,
}

impl<'a> PixelViewMut<'a> {
    pub fn new(
        bytes: &'a mut [u8],
        width: u32,
        height: u32,
        channels: u32,
        bytes_per_voxel: u32,
        stride: usize,
    ) -> Result<Self> {
        if !is_supported(channels, bytes_per_voxel) {
            return Err(EngineError::Unsupported(format!(
                "unsupported pixel format: {channels} channels x {bytes_per_voxel} bytes/voxel"
            )));
        }
        let voxel_bytes = (channels * bytes_per_voxel) as usize;
        let min_stride = width as usize * voxel_bytes;
        if stride < min_stride {
            return Err(EngineError::BadRequest(format!(
                "stride {stride} too small for width {width} ({min_stride} required)"
            )));
        }
        let required = stride * height as usize;
        if bytes.len() < required {
            return Err(EngineError::BadRequest(format!(
                "buffer of {} bytes too small for {height} rows of stride {stride}",
                bytes.len()
            )));
        }
        Ok(PixelViewMut {
            bytes,
            width,
            height,
            channels,
            bytes_per_voxel,
            stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.bytes[start..start + self.stride]
    }
}
