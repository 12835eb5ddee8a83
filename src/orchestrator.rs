//! Request orchestrator: decomposes a region into block-key ranges,
//! dispatches chunks to the worker pool, and gathers completion.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info};

use crate::blockindex::{decode_trailing_zyx, key_range_for_line, BlockIndex, DataId, DatasetId, FullKey, VersionId};
use crate::config::{CodecId, Data, Datatype};
use crate::envelope::{decode_block, encode_block};
use crate::error::{EngineError, Result};
use crate::geometry::{Mode, Region};
use crate::kernel::copy_chunk;
use crate::store::OrderedStore;
use crate::versionlock::VersionLockTable;
use crate::workerpool::{dispatch, CompletionBarrier, DisjointBuf, TokenBucket};

/// Wires together the ordered store, worker pool, and version locks that
/// serve `get_region`/`put_region` requests.
pub struct Engine<S: OrderedStore> {
    store: Arc<S>,
    pool: TokenBucket,
    version_locks: VersionLockTable,
}

impl<S: OrderedStore + 'static> Engine<S> {
    pub fn new(store: S, pool_capacity: usize) -> Self {
        Engine {
            store: Arc::new(store),
            pool: TokenBucket::new(pool_capacity),
            version_locks: VersionLockTable::new(),
        }
    }

    /// Reads `region` into `out_buf`, zero-filling voxels whose block has
    /// never been written.
    ///
    /// Every block returned by one Y-row's ranged scan is handed to the
    /// worker pool; chunks run on disjoint byte ranges of `out_buf` by
    /// construction (every region voxel belongs to exactly one block), so
    /// they share it through a `DisjointBuf` handle rather than a mutex.
    /// Parallelism here comes from the pool, not the store: the reference
    /// `InMemoryStore` materialises the whole range before any chunk runs.
    pub fn get_region(
        &self,
        dataset: &DatasetId,
        data: &Data,
        datatype: &Datatype,
        version: &VersionId,
        region: &Region,
        out_buf: &mut [u8],
    ) -> Result<()> {
        let started = Instant::now();
        let bs = data.block_size;
        let voxel_bytes = datatype.voxel_bytes();
        let region_copy = *region;

        let s_block = bs.voxel_to_block(region.start);
        let e_block = bs.voxel_to_block(region.last_voxel());

        let mut block_count = 0usize;
        let shared_out = DisjointBuf::new(out_buf);

        for z in s_block.z..=e_block.z {
            for y in s_block.y..=e_block.y {
                let (start_key, end_key) =
                    key_range_for_line(dataset, &DataId(data.name.clone()), version, y, z, s_block.x, e_block.x);

                let rows = self.store.get_range(&start_key, &end_key)?;
                block_count += rows.len();

                let barrier = CompletionBarrier::new();
                barrier.add(rows.len());
                let first_err: Arc<Mutex<Option<EngineError>>> = Arc::new(Mutex::new(None));

                for (key, value) in rows {
                    let first_err = first_err.clone();
                    dispatch(&self.pool, &barrier, move || {
                        let block = decode_trailing_zyx(&key);
                        let outcome = decode_block(&value).and_then(|mut payload| {
                            debug!("dispatch chunk block={:?} mode=Get", block);
                            copy_chunk(
                                block,
                                bs,
                                voxel_bytes,
                                &mut payload,
                                &region_copy,
                                unsafe { shared_out.as_mut_slice() },
                                Mode::Get,
                            )
                        });
                        if let Err(e) = outcome {
                            let mut guard = first_err.lock().expect("first_err lock poisoned");
                            if guard.is_none() {
                                *guard = Some(e);
                            }
                        }
                    });
                }

                barrier.wait();
                if let Some(e) = first_err.lock().expect("first_err lock poisoned").take() {
                    return Err(e);
                }
            }
        }

        info!(
            "get_region shape={:?} blocks={} elapsed={:?}",
            region.shape,
            block_count,
            started.elapsed()
        );
        Ok(())
    }

    /// Writes `in_buf` into `region`, read-modify-writing each overlapping
    /// block. Serialized against other writers on the same `(data,
    /// version)`; readers never take this lock, so dirty reads during a
    /// write are possible by design.
    ///
    /// Dispatches one worker-pool submission per Y-row's worth of X-steps
    /// and waits for that row's chunks before moving to the next row, so
    /// parallelism lives between Y-rows rather than within one.
    pub fn put_region(
        &self,
        dataset: &DatasetId,
        data: &Data,
        datatype: &Datatype,
        version: &VersionId,
        region: &Region,
        in_buf: &[u8],
        codec: CodecId,
    ) -> Result<()> {
        let started = Instant::now();
        let data_id = DataId(data.name.clone());
        let guard = self.version_locks.acquire_writer(&data_id, version);

        let bs = data.block_size;
        let voxel_bytes = datatype.voxel_bytes();
        let voxel_count = (bs.x * bs.y * bs.z) as usize * voxel_bytes as usize;
        let region_copy = *region;

        let s_block = bs.voxel_to_block(region.start);
        let e_block = bs.voxel_to_block(region.last_voxel());

        // Put never mutates the region buffer, only reads it; shared through
        // the same disjoint-handle mechanism as the read path purely so the
        // kernel can use one signature for both directions.
        let mut scratch = in_buf.to_vec();
        let shared_in = DisjointBuf::new(&mut scratch);

        let result = guard.with_lock(|| -> Result<usize> {
            let mut written = 0usize;

            for z in s_block.z..=e_block.z {
                for y in s_block.y..=e_block.y {
                    let (start_key, end_key) =
                        key_range_for_line(dataset, &data_id, version, y, z, s_block.x, e_block.x);

                    let existing = self.store.get_range(&start_key, &end_key)?;
                    let mut existing_iter = existing.into_iter().peekable();

                    let row_len = (e_block.x - s_block.x + 1) as usize;
                    let barrier = CompletionBarrier::new();
                    barrier.add(row_len);
                    let first_err: Arc<Mutex<Option<EngineError>>> = Arc::new(Mutex::new(None));
                    let written_count = Arc::new(Mutex::new(0usize));

                    for x in s_block.x..=e_block.x {
                        let block = BlockIndex::new(x, y, z);
                        let key = FullKey {
                            dataset: *dataset,
                            data: data_id.clone(),
                            version: *version,
                            block,
                        }
                        .encode();
                        let existing_bytes = match existing_iter.peek() {
                            Some((k, _)) if *k == key => Some(existing_iter.next().unwrap().1),
                            _ => None,
                        };

                        let store = self.store.clone();
                        let first_err = first_err.clone();
                        let written_count = written_count.clone();

                        dispatch(&self.pool, &barrier, move || {
                            let outcome: Result<()> = (|| {
                                let mut block_bytes = match existing_bytes {
                                    Some(bytes) => decode_block(&bytes)?,
                                    None => vec![0u8; voxel_count],
                                };
                                if block_bytes.len() != voxel_count {
                                    // A decoded block of the wrong size is a programmer
                                    // bug (datatype/codec mismatch), not a recoverable
                                    // per-chunk error: crash the worker rather than
                                    // silently returning corrupt data.
                                    panic!(
                                        "decoded block has {} bytes, expected {voxel_count}",
                                        block_bytes.len()
                                    );
                                }
                                debug!("dispatch chunk block={:?} mode=Put", block);
                                copy_chunk(
                                    block,
                                    bs,
                                    voxel_bytes,
                                    &mut block_bytes,
                                    &region_copy,
                                    unsafe { shared_in.as_mut_slice() },
                                    Mode::Put,
                                )?;
                                let encoded = encode_block(&block_bytes, codec, 3)?;
                                store.put(&key, &encoded)
                            })();
                            match outcome {
                                Ok(()) => *written_count.lock().expect("written_count lock poisoned") += 1,
                                Err(e) => {
                                    let mut guard = first_err.lock().expect("first_err lock poisoned");
                                    if guard.is_none() {
                                        *guard = Some(e);
                                    }
                                }
                            }
                        });
                    }

                    barrier.wait();
                    if let Some(e) = first_err.lock().expect("first_err lock poisoned").take() {
                        return Err(e);
                    }
                    written += *written_count.lock().expect("written_count lock poisoned");
                }
            }
            Ok(written)
        });

        let written = result?;
        info!(
            "put_region shape={:?} blocks={} elapsed={:?}",
            region.shape,
            written,
            started.elapsed()
        );
        Ok(())
    }
}
