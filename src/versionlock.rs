//! Process-wide mapping from `(DataID, VersionID)` to a mutex, serializing
//! writers on one version while leaving readers lock-free.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::blockindex::{DataId, VersionId};

#[derive(Default)]
pub struct VersionLockTable {
    locks: Mutex<HashMap<(DataId, VersionId), Arc<Mutex<()>>>>,
}

impl VersionLockTable {
    pub fn new() -> Self {
        VersionLockTable::default()
    }

    fn get_or_create(&self, data: &DataId, version: &VersionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("version lock table poisoned");
        locks
            .entry((data.clone(), *version))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the writer lock for `(data, version)` for the duration of
    /// the returned guard. Readers never call this.
    pub fn acquire_writer(&self, data: &DataId, version: &VersionId) -> VersionWriteGuard {
        let mutex = self.get_or_create(data, version);
        VersionWriteGuard::new(mutex)
    }
}

/// Holds the per-version mutex for the lifetime of one `Put` region call.
pub struct VersionWriteGuard {
    mutex: Arc<Mutex<()>>,
}

impl VersionWriteGuard {
    fn new(mutex: Arc<Mutex<()>>) -> Self {
        VersionWriteGuard { mutex }
    }

    /// Blocks until the version's writer lock is held, then runs `f` while
    /// holding it.
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard: MutexGuard<'_, ()> = self.mutex.lock().expect("version mutex poisoned");
        f()
    }
}
