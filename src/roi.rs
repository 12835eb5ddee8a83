//! Region-of-interest span store and the stateful membership iterator that
//! exploits ZYX key order for amortised O(1) membership checks.

use serde::{Deserialize, Serialize};

use crate::blockindex::BlockIndex;

/// One run `(z, y, x0, x1)`: every block `(x, y, z)` with `x0 <= x <= x1` is
/// inside the ROI. Spans on the same `(z, y)` do not overlap and are stored
/// in ascending `x0` order; the whole list is lexicographic in `(z, y, x0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub z: i64,
    pub y: i64,
    pub x0: i64,
    pub x1: i64,
}

/// The persisted span list, serialized as JSON the same way the teacher's
/// file index is persisted as a JSON blob alongside binary blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoiSpanStore {
    pub spans: Vec<Span>,
}

impl RoiSpanStore {
    pub fn new(mut spans: Vec<Span>) -> Self {
        spans.sort_by_key(|s| (s.z, s.y, s.x0));
        RoiSpanStore { spans }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Spans whose z falls within `[min_z, max_z]`, in stored order (which
    /// is already z-ascending).
    pub fn spans_in_z_range(&self, min_z: i64, max_z: i64) -> Vec<Span> {
        self.spans
            .iter()
            .copied()
            .filter(|s| s.z >= min_z && s.z <= max_z)
            .collect()
    }

    pub fn iter(&self) -> RoiIterator<'_> {
        RoiIterator {
            spans: &self.spans,
            cur: 0,
        }
    }
}

/// Stateful cursor answering "is this block key inside the ROI?" in
/// amortised O(1) when keys are fed in non-decreasing ZYX order.
///
/// Correctness precondition: callers feed keys in non-decreasing ZYX order
/// since the last `reset()`. Violating it may produce false negatives; call
/// `reset()` to recover.
pub struct RoiIterator<'a> {
    spans: &'a [Span],
    cur: usize,
}

impl<'a> RoiIterator<'a> {
    pub fn reset(&mut self) {
        self.cur = 0;
    }

    pub fn inside(&mut self, block: BlockIndex) -> bool {
        let (x, y, z) = (block.x, block.y, block.z);
        loop {
            let Some(s) = self.spans.get(self.cur) else {
                return false;
            };
            if s.z > z {
                return false;
            }
            if s.z == z && s.y > y {
                return false;
            }
            if s.z == z && s.y == y && s.x0 > x {
                return false;
            }
            if s.z == z && s.y == y && s.x1 >= x {
                return true;
            }
            self.cur += 1;
        }
    }
}
