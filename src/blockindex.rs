//! Lexicographic (ZYX) block index and byte-sortable key construction.
//!
//! Keys must sort, byte-lexicographically, in exactly the same order as the
//! signed `(z, y, x)` block coordinate triple. A plain big-endian encoding of
//! a signed integer does not sort correctly (negative numbers have their
//! high bit set, which sorts *after* positive numbers byte-lexicographically)
//! so every coordinate is offset into unsigned space by flipping the sign bit
//! before encoding.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Point3;

/// Block coordinate with `Ord` defined as `(z, y, x)`: x is the innermost,
/// contiguous dimension, matching the orchestrator's per-row scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockIndex {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockIndex {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        BlockIndex { x, y, z }
    }

    pub fn from_point(p: Point3) -> Self {
        BlockIndex::new(p.x, p.y, p.z)
    }

    pub fn to_point(self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

impl PartialOrd for BlockIndex {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlockIndex {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.z, self.y, self.x).cmp(&(other.z, other.y, other.x))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub Uuid);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub Uuid);

/// `(DatasetID, DataID, VersionID, BlockIndex)`. DatasetID/DataID/VersionID
/// prefix the block index so one version's blocks form a contiguous
/// keyspace segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullKey {
    pub dataset: DatasetId,
    pub data: DataId,
    pub version: VersionId,
    pub block: BlockIndex,
}

/// Flips the sign bit so big-endian byte order of the result matches signed
/// numeric order.
fn sortable_i64(v: i64) -> u64 {
    (v as u64) ^ (1u64 << 63)
}

fn write_sortable_i64(buf: &mut Vec<u8>, v: i64) {
    buf.write_u64::<BigEndian>(sortable_i64(v))
        .expect("writing to a Vec<u8> cannot fail");
}

impl FullKey {
    /// Encodes the key so that byte-lexicographic order on the result
    /// exactly matches `(dataset, data, version, z, y, x)` order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + 2 + self.data.0.len() + 16 + 24);
        buf.extend_from_slice(self.dataset.0.as_bytes());
        buf.write_u16::<BigEndian>(self.data.0.len() as u16)
            .expect("writing to a Vec<u8> cannot fail");
        buf.extend_from_slice(self.data.0.as_bytes());
        buf.extend_from_slice(self.version.0.as_bytes());
        write_sortable_i64(&mut buf, self.block.z);
        write_sortable_i64(&mut buf, self.block.y);
        write_sortable_i64(&mut buf, self.block.x);
        buf
    }
}

/// Reverses `sortable_i64`.
fn unsortable_i64(v: u64) -> i64 {
    (v ^ (1u64 << 63)) as i64
}

/// Decodes the trailing `(z, y, x)` block index out of a key produced by
/// `FullKey::encode`. The caller is expected to already know the
/// dataset/data/version prefix; this is used by the orchestrator, which
/// scans one `(data, version, y, z)` row at a time and only needs `x` back.
pub fn decode_trailing_zyx(key: &[u8]) -> BlockIndex {
    let len = key.len();
    let mut tail = &key[len - 24..];
    let z = unsortable_i64(tail.read_u64::<BigEndian>().expect("key too short for trailing zyx"));
    let y = unsortable_i64(tail.read_u64::<BigEndian>().expect("key too short for trailing zyx"));
    let x = unsortable_i64(tail.read_u64::<BigEndian>().expect("key too short for trailing zyx"));
    BlockIndex::new(x, y, z)
}

/// Builds the inclusive `[startKey, endKey]` bounds for the row of blocks
/// `x in [x0, x1]` at fixed `(y, z)` within one `(dataset, data, version)`.
///
/// Guarantee: for fixed `(y, z, version, data)`, the set of keys with `x` in
/// `[x0, x1]` is exactly this closed key interval and no other keys fall
/// inside it — callers may scan `[start, end]` directly without
/// post-filtering.
pub fn key_range_for_line(
    dataset: &DatasetId,
    data: &DataId,
    version: &VersionId,
    y: i64,
    z: i64,
    x0: i64,
    x1: i64,
) -> (Vec<u8>, Vec<u8>) {
    assert!(x0 <= x1, "x0 {} must be <= x1 {}", x0, x1);
    let start = FullKey {
        dataset: *dataset,
        data: data.clone(),
        version: *version,
        block: BlockIndex::new(x0, y, z),
    };
    let end = FullKey {
        dataset: *dataset,
        data: data.clone(),
        version: *version,
        block: BlockIndex::new(x1, y, z),
    };
    (start.encode(), end.encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(dataset: DatasetId, data: &DataId, version: VersionId, x: i64, y: i64, z: i64) -> Vec<u8> {
        FullKey {
            dataset,
            data: data.clone(),
            version,
            block: BlockIndex::new(x, y, z),
        }
        .encode()
    }

    #[test]
    fn zyx_ordering_is_z_major() {
        let a = BlockIndex::new(5, 0, 0);
        let b = BlockIndex::new(0, 1, 0);
        assert!(a < b, "higher y must outrank lower y regardless of x");

        let c = BlockIndex::new(5, 5, 0);
        let d = BlockIndex::new(0, 0, 1);
        assert!(c < d, "higher z must outrank lower y and x");
    }

    #[test]
    fn sortable_i64_preserves_signed_order() {
        let mut values = vec![-1000i64, -1, 0, 1, 1000, i64::MIN, i64::MAX];
        let mut encoded: Vec<(i64, u64)> = values.iter().map(|&v| (v, sortable_i64(v))).collect();
        values.sort();
        encoded.sort_by_key(|(_, e)| *e);
        let sorted_values: Vec<i64> = encoded.into_iter().map(|(v, _)| v).collect();
        assert_eq!(values, sorted_values);
    }

    #[test]
    fn key_bytes_sort_like_zyx() {
        let dataset = DatasetId(Uuid::nil());
        let data = DataId("grayscale".to_string());
        let version = VersionId(Uuid::nil());

        let mut indices = vec![
            BlockIndex::new(5, 0, 0),
            BlockIndex::new(-5, 0, 0),
            BlockIndex::new(0, 1, 0),
            BlockIndex::new(0, 0, 1),
            BlockIndex::new(-1, -1, -1),
            BlockIndex::new(2, 2, 2),
        ];
        let mut keys: Vec<(BlockIndex, Vec<u8>)> = indices
            .iter()
            .map(|&b| (b, key(dataset, &data, version, b.x, b.y, b.z)))
            .collect();

        indices.sort();
        keys.sort_by(|a, b| a.1.cmp(&b.1));
        let sorted_indices: Vec<BlockIndex> = keys.into_iter().map(|(b, _)| b).collect();
        assert_eq!(indices, sorted_indices);
    }

    #[test]
    fn decode_trailing_zyx_roundtrips() {
        let dataset = DatasetId(Uuid::nil());
        let data = DataId("grayscale".to_string());
        let version = VersionId(Uuid::nil());
        for b in [
            BlockIndex::new(5, -3, 100),
            BlockIndex::new(-1, -1, -1),
            BlockIndex::new(0, 0, 0),
        ] {
            let k = key(dataset, &data, version, b.x, b.y, b.z);
            assert_eq!(decode_trailing_zyx(&k), b);
        }
    }

    #[test]
    fn line_range_contains_exactly_its_row() {
        let dataset = DatasetId(Uuid::nil());
        let data = DataId("grayscale".to_string());
        let version = VersionId(Uuid::nil());

        let (start, end) = key_range_for_line(&dataset, &data, &version, 3, 7, -2, 2);

        for x in -2..=2 {
            let k = key(dataset, &data, version, x, 3, 7);
            assert!(k >= start && k <= end, "x={} should be inside the range", x);
        }
        // Neighbors on the same row, just outside [x0,x1].
        let before = key(dataset, &data, version, -3, 3, 7);
        let after = key(dataset, &data, version, 3, 3, 7);
        assert!(before < start);
        assert!(after > end);

        // A different y or z must fall entirely outside the range.
        let other_y = key(dataset, &data, version, 0, 4, 7);
        let other_z = key(dataset, &data, version, 0, 3, 8);
        assert!(other_y > end || other_y < start);
        assert!(other_z > end);
    }
}
