//! Block payload envelope — self-describing header wrapping a compressed
//! block body, directly modeled on the teacher's block format: magic,
//! codec id, sizes, BLAKE3 content hash, CRC32 header checksum.
//!
//! # On-disk layout (48-byte header, all numeric fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   magic         = 0x564F_5842  ("VOXB", LE u32)
//!    4      2   header_version = 1
//!    6      2   codec_id      0=None 1=Zstd
//!    8      4   orig_size     uncompressed payload bytes
//!   12      4   comp_size     on-disk bytes
//!   16     32   content_hash  BLAKE3 of uncompressed payload
//!   48      4   header_crc32  CRC32([0..48])  ← LAST
//! ```

use crc32fast::Hasher;
use std::io::{self, Read, Write};

use crate::config::CodecId;
use crate::error::{EngineError, Result};

pub const ENVELOPE_MAGIC: u32 = 0x564F_5842; // "VOXB"
pub const ENVELOPE_HEADER_VERSION: u16 = 1;
pub const ENVELOPE_HEADER_SIZE: usize = 52;

#[derive(Debug, Clone)]
pub struct EnvelopeHeader {
    pub codec_id: CodecId,
    pub orig_size: u32,
    pub comp_size: u32,
    pub content_hash: [u8; 32],
}

impl EnvelopeHeader {
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        let mut buf = [0u8; ENVELOPE_HEADER_SIZE];
        let mut pos = 0;

        macro_rules! put_u32le {
            ($v:expr) => {{
                buf[pos..pos + 4].copy_from_slice(&($v as u32).to_le_bytes());
                pos += 4;
            }};
        }
        macro_rules! put_u16le {
            ($v:expr) => {{
                buf[pos..pos + 2].copy_from_slice(&($v as u16).to_le_bytes());
                pos += 2;
            }};
        }
        macro_rules! put_bytes {
            ($b:expr) => {{
                let b: &[u8] = $b;
                buf[pos..pos + b.len()].copy_from_slice(b);
                pos += b.len();
            }};
        }

        put_u32le!(ENVELOPE_MAGIC);
        put_u16le!(ENVELOPE_HEADER_VERSION);
        put_u16le!(self.codec_id.as_u16());
        put_u32le!(self.orig_size);
        put_u32le!(self.comp_size);
        put_bytes!(&self.content_hash);

        assert_eq!(pos, 48, "header body must be exactly 48 bytes before CRC");

        let mut h = Hasher::new();
        h.update(&buf[..48]);
        buf[48..52].copy_from_slice(&h.finalize().to_le_bytes());

        w.write_all(&buf)
    }

    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = [0u8; ENVELOPE_HEADER_SIZE];
        r.read_exact(&mut buf)?;

        let mut h = Hasher::new();
        h.update(&buf[..48]);
        let expected_crc = h.finalize();
        let stored_crc = u32::from_le_bytes(buf[48..52].try_into().unwrap());
        if stored_crc != expected_crc {
            return Err(EngineError::Codec(format!(
                "envelope header CRC32 mismatch: expected {expected_crc:#010x}, got {stored_crc:#010x}"
            )));
        }

        let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if magic != ENVELOPE_MAGIC {
            return Err(EngineError::Codec(format!(
                "invalid envelope magic: expected {ENVELOPE_MAGIC:#010x}, got {magic:#010x}"
            )));
        }

        let header_version = u16::from_le_bytes(buf[4..6].try_into().unwrap());
        if header_version != ENVELOPE_HEADER_VERSION {
            return Err(EngineError::Codec(format!(
                "unsupported envelope header version {header_version}"
            )));
        }

        let codec_raw = u16::from_le_bytes(buf[6..8].try_into().unwrap());
        let codec_id = CodecId::from_u16(codec_raw)
            .ok_or_else(|| EngineError::Codec(format!("unknown codec id {codec_raw}")))?;
        let orig_size = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let comp_size = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let content_hash: [u8; 32] = buf[16..48].try_into().unwrap();

        Ok(EnvelopeHeader {
            codec_id,
            orig_size,
            comp_size,
            content_hash,
        })
    }
}

/// Compress `data` under `codec_id`, returning a header plus the on-disk
/// payload (header does not include the payload bytes).
pub fn encode_payload(data: &[u8], codec_id: CodecId, level: i32) -> Result<(EnvelopeHeader, Vec<u8>)> {
    let content_hash: [u8; 32] = blake3::hash(data).into();
    let payload = match codec_id {
        CodecId::None => data.to_vec(),
        CodecId::Zstd => {
            zstd::encode_all(data, level).map_err(|e| EngineError::Codec(e.to_string()))?
        }
    };
    let header = EnvelopeHeader {
        codec_id,
        orig_size: data.len() as u32,
        comp_size: payload.len() as u32,
        content_hash,
    };
    Ok((header, payload))
}

/// Decompress and verify `payload` against `header`. A content-hash mismatch
/// is a `Codec` error and is fatal for the chunk that produced it.
pub fn decode_payload(header: &EnvelopeHeader, payload: &[u8]) -> Result<Vec<u8>> {
    let decompressed = match header.codec_id {
        CodecId::None => payload.to_vec(),
        CodecId::Zstd => {
            zstd::decode_all(payload).map_err(|e| EngineError::Codec(e.to_string()))?
        }
    };
    if decompressed.len() != header.orig_size as usize {
        return Err(EngineError::Codec(format!(
            "decompressed size {} does not match header orig_size {}",
            decompressed.len(),
            header.orig_size
        )));
    }
    let actual_hash: [u8; 32] = blake3::hash(&decompressed).into();
    if actual_hash != header.content_hash {
        return Err(EngineError::Codec(format!(
            "BLAKE3 content hash mismatch (got {}, expected {})",
            hex::encode(actual_hash),
            hex::encode(header.content_hash),
        )));
    }
    Ok(decompressed)
}

/// Encodes a full envelope (header + payload) as one contiguous buffer,
/// ready to hand to the `OrderedStore`.
pub fn encode_block(data: &[u8], codec_id: CodecId, level: i32) -> Result<Vec<u8>> {
    let (header, payload) = encode_payload(data, codec_id, level)?;
    let mut buf = Vec::with_capacity(ENVELOPE_HEADER_SIZE + payload.len());
    header.write(&mut buf)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Splits a stored block buffer back into its original bytes.
pub fn decode_block(buf: &[u8]) -> Result<Vec<u8>> {
    if buf.len() < ENVELOPE_HEADER_SIZE {
        return Err(EngineError::Codec("block buffer shorter than envelope header".into()));
    }
    let header = EnvelopeHeader::read(&buf[..ENVELOPE_HEADER_SIZE])?;
    let payload = &buf[ENVELOPE_HEADER_SIZE..];
    decode_payload(&header, payload)
}
