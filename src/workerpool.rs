//! Bounded worker pool: a token bucket gating concurrent chunk processing,
//! plus a per-request completion barrier.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// A bounded channel of unit tokens. Acquiring may block the caller;
/// releasing happens automatically when the returned `Token` drops, even if
/// the holder panics.
pub struct TokenBucket {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl TokenBucket {
    pub fn new(capacity: usize) -> Self {
        TokenBucket {
            state: Arc::new((Mutex::new(capacity), Condvar::new())),
        }
    }

    /// Blocks until a token is available, then returns a guard that releases
    /// it on drop.
    pub fn acquire(&self) -> Token {
        let (lock, cvar) = &*self.state;
        let mut available = lock.lock().expect("token bucket lock poisoned");
        while *available == 0 {
            available = cvar.wait(available).expect("token bucket lock poisoned");
        }
        *available -= 1;
        Token {
            state: self.state.clone(),
        }
    }
}

/// RAII token; releases itself back to the bucket on drop (success or
/// panic).
pub struct Token {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl Drop for Token {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.state;
        let mut available = lock.lock().expect("token bucket lock poisoned");
        *available += 1;
        cvar.notify_one();
    }
}

/// A countdown latch: `add(n)` registers work, `done()` counts one unit
/// complete, `wait()` blocks until the count reaches zero.
pub struct CompletionBarrier {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        CompletionBarrier {
            state: Arc::new((Mutex::new(0), Condvar::new())),
        }
    }

    pub fn add(&self, n: usize) {
        let (lock, _) = &*self.state;
        *lock.lock().expect("barrier lock poisoned") += n;
    }

    pub fn done(&self) {
        let (lock, cvar) = &*self.state;
        let mut count = lock.lock().expect("barrier lock poisoned");
        debug_assert!(*count > 0, "done() called more times than add()");
        *count = count.saturating_sub(1);
        if *count == 0 {
            cvar.notify_all();
        }
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.state;
        let mut count = lock.lock().expect("barrier lock poisoned");
        while *count > 0 {
            count = cvar.wait(count).expect("barrier lock poisoned");
        }
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        CompletionBarrier::new()
    }
}

/// Spawns `f` on a new OS thread once a token is available, counting the
/// work against `barrier`. The token and barrier decrement both happen on
/// thread exit regardless of whether `f` panics.
pub fn dispatch<F>(pool: &TokenBucket, barrier: &CompletionBarrier, f: F)
where
    F: FnOnce() + Send + 'static,
{
    let token = pool.acquire();
    let barrier = barrier_handle(barrier);
    thread::spawn(move || {
        let _token = token;
        let _guard = DoneGuard(barrier);
        f();
    });
}

fn barrier_handle(barrier: &CompletionBarrier) -> Arc<(Mutex<usize>, Condvar)> {
    barrier.state.clone()
}

struct DoneGuard(Arc<(Mutex<usize>, Condvar)>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.0;
        let mut count = lock.lock().expect("barrier lock poisoned");
        *count = count.saturating_sub(1);
        if *count == 0 {
            cvar.notify_all();
        }
    }
}

/// Raw-pointer wrapper letting multiple worker threads write disjoint,
/// non-overlapping regions of one buffer concurrently without a `Mutex`.
///
/// Soundness is the caller's responsibility: every thread holding a copy of
/// this handle must touch only the byte ranges its own chunk owns. The
/// orchestrator's block/region intersection math guarantees this by
/// construction (every region voxel belongs to exactly one block), the same
/// way the teacher justifies `unsafe impl Send` for its FFI codec plugin
/// handle rather than for arbitrary shared mutability.
#[derive(Clone, Copy)]
pub struct DisjointBuf {
    ptr: *mut u8,
    len: usize,
}

unsafe impl Send for DisjointBuf {}
unsafe impl Sync for DisjointBuf {}

impl DisjointBuf {
    pub fn new(buf: &mut [u8]) -> Self {
        DisjointBuf {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
        }
    }

    /// # Safety
    /// The caller must ensure no two live callers of `as_mut_slice` on
    /// handles derived from the same buffer write overlapping byte ranges.
    pub unsafe fn as_mut_slice(&self) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.ptr, self.len)
    }
}
