//! Bulk ingest helper: encode many independent block payloads concurrently.
//!
//! This is separate from the core worker pool in `workerpool.rs` — it exists
//! for callers (e.g. the CLI's `load local` command) that already have every
//! block's bytes in hand before any of them need to touch the store, and
//! want to pay the compression cost once, in parallel, rather than per
//! dispatched chunk.
//!
//! Rayon is optional; without the `parallel` feature this runs sequentially.

use crate::config::CodecId;
use crate::envelope::encode_block;
use crate::error::Result;

/// Encodes `blocks` concurrently under `codec`, returning one encoded
/// envelope per input block in the same order. If any block fails to
/// encode, the first error is returned and the rest of the batch is still
/// computed (errors do not short-circuit sibling work).
pub fn encode_blocks_parallel(blocks: &[&[u8]], codec: CodecId, level: i32) -> Result<Vec<Vec<u8>>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let results: Vec<Result<Vec<u8>>> = blocks
            .par_iter()
            .map(|data| encode_block(data, codec, level))
            .collect();

        let mut out = Vec::with_capacity(blocks.len());
        for r in results {
            out.push(r?);
        }
        Ok(out)
    }

    #[cfg(not(feature = "parallel"))]
    {
        blocks.iter().map(|data| encode_block(data, codec, level)).collect()
    }
}
