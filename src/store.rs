//! Ordered key-value store abstraction and an in-process reference
//! implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{EngineError, Result};

/// A handler invoked once per key-value pair encountered by `process_range`,
/// in ascending key order.
pub type RangeHandler<'a> = dyn FnMut(&[u8], &[u8]) -> Result<()> + 'a;

/// An ordered byte-string keyed store. Keys sort byte-lexicographically in
/// whatever order the caller's key encoding establishes (see
/// `blockindex::FullKey::encode`).
pub trait OrderedStore: Send + Sync {
    /// Streams every key-value pair in `[start, end]` to `handler`, in
    /// ascending key order.
    fn process_range(&self, start: &[u8], end: &[u8], handler: &mut RangeHandler<'_>) -> Result<()>;

    /// Materialised range fetch, equivalent to collecting `process_range`.
    fn get_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        self.process_range(start, end, &mut |k, v| {
            out.push((k.to_vec(), v.to_vec()));
            Ok(())
        })?;
        Ok(out)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// `BTreeMap`-backed reference implementation. Concurrent reads don't block
/// each other; a writer excludes readers only for the duration of its own
/// mutation.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

impl OrderedStore for InMemoryStore {
    fn process_range(&self, start: &[u8], end: &[u8], handler: &mut RangeHandler<'_>) -> Result<()> {
        let guard = self
            .inner
            .read()
            .map_err(|_| EngineError::Store("poisoned lock".into()))?;
        // The reference store has no background I/O to overlap, so the
        // handler runs synchronously on the calling thread; a real store
        // would dispatch each delivered range to its own worker.
        for (k, v) in guard.range(start.to_vec()..=end.to_vec()) {
            handler(k, v)?;
        }
        Ok(())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| EngineError::Store("poisoned lock".into()))?;
        guard.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| EngineError::Store("poisoned lock".into()))?;
        Ok(guard.get(key).cloned())
    }
}
