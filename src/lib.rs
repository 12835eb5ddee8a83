//! # voxelkv — versioned voxel block store
//!
//! Format guarantees:
//! - Block keys are byte-sortable and sort in exact ZYX order (see
//!   `blockindex`)
//! - Every stored block is self-describing: magic, header version, codec id,
//!   sizes, BLAKE3 content hash, CRC32 header checksum (see `envelope`)
//! - A corrupt header or a content-hash mismatch aborts the read for that
//!   chunk; it never silently returns partial or wrong bytes
//! - Writers on the same `(DataID, VersionID)` are serialized; readers never
//!   block on that lock and may observe a write in progress

pub mod blockindex;
pub mod config;
pub mod envelope;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod orchestrator;
pub mod perf;
pub mod pixelbuffer;
pub mod roi;
pub mod store;
pub mod versionlock;
pub mod workerpool;

pub use blockindex::{BlockIndex, DataId, DatasetId, FullKey, VersionId};
pub use config::{CodecId, Data, Datatype, DatatypeRegistry};
pub use envelope::{decode_block, encode_block, EnvelopeHeader};
pub use error::{EngineError, Result};
pub use geometry::{BlockSize, Mode, Point3, Region, Shape};
pub use orchestrator::Engine;
pub use roi::{RoiIterator, RoiSpanStore, Span};
pub use store::{InMemoryStore, OrderedStore};
