//! Codec identity and dataset/datatype configuration.
//!
//! `Data` and `Datatype` are kept as two separate records joined by a lookup
//! function, not a trait-object hierarchy — `Data` carries per-dataset
//! configuration (block size, resolution) and holds only a back-reference
//! (by id) to the `Datatype` that carries invariants shared by all data of
//! that type.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::geometry::BlockSize;

/// Identifies the compression codec wrapping a block payload on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecId {
    None,
    Zstd,
}

impl CodecId {
    pub fn as_u16(self) -> u16 {
        match self {
            CodecId::None => 0,
            CodecId::Zstd => 1,
        }
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(CodecId::None),
            1 => Some(CodecId::Zstd),
            _ => None,
        }
    }
}

impl Default for CodecId {
    fn default() -> Self {
        CodecId::Zstd
    }
}

/// Invariants shared by every `Data` of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datatype {
    pub id: u32,
    pub channels_interleaved: u32,
    pub bytes_per_voxel: u32,
}

impl Datatype {
    pub fn new(id: u32, channels_interleaved: u32, bytes_per_voxel: u32) -> Result<Self> {
        if !matches!(channels_interleaved, 1 | 4) {
            return Err(EngineError::BadRequest(format!(
                "channels_interleaved must be 1 or 4, got {channels_interleaved}"
            )));
        }
        if !matches!(bytes_per_voxel, 1 | 2 | 4 | 8) {
            return Err(EngineError::BadRequest(format!(
                "bytes_per_voxel must be one of 1,2,4,8, got {bytes_per_voxel}"
            )));
        }
        Ok(Datatype {
            id,
            channels_interleaved,
            bytes_per_voxel,
        })
    }

    pub fn voxel_bytes(&self) -> u64 {
        (self.channels_interleaved as u64) * (self.bytes_per_voxel as u64)
    }
}

/// Per-dataset configuration. Never inherits from `Datatype`; resolves it
/// through `DatatypeRegistry` by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    pub name: String,
    pub block_size: BlockSize,
    pub voxel_res: (f64, f64, f64),
    pub voxel_res_units: String,
    pub datatype_id: u32,
}

impl Data {
    pub fn new(name: impl Into<String>, datatype_id: u32) -> Self {
        Data {
            name: name.into(),
            block_size: BlockSize::default(),
            voxel_res: (1.0, 1.0, 1.0),
            voxel_res_units: "nanometers".to_string(),
            datatype_id,
        }
    }
}

/// Process-wide registry resolving `Datatype` by id, exactly the way the
/// teacher keeps `CodecId` and `Codec` as two separate concerns joined by a
/// lookup function.
#[derive(Default)]
pub struct DatatypeRegistry {
    inner: RwLock<HashMap<u32, Datatype>>,
}

impl DatatypeRegistry {
    pub fn new() -> Self {
        DatatypeRegistry::default()
    }

    pub fn register(&self, datatype: Datatype) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| EngineError::Invariant("datatype registry lock poisoned".into()))?;
        guard.insert(datatype.id, datatype);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Result<Datatype> {
        let guard = self
            .inner
            .read()
            .map_err(|_| EngineError::Invariant("datatype registry lock poisoned".into()))?;
        guard
            .get(&id)
            .copied()
            .ok_or_else(|| EngineError::NotFound(format!("datatype id {id}")))
    }
}
