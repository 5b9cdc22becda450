//! Worker-pool control for the batch distance operators.
//!
//! The batch and all-pairs operators in [`crate::hamming`] fan work out
//! over a process-global rayon pool. `set_thread_count` rebuilds that pool
//! with the requested width; if a pool cannot be built the operators run
//! sequentially and `get_thread_count` reports 1. No other subsystem
//! consults these knobs.

use std::sync::{Arc, Mutex, OnceLock};

use rayon::{ThreadPool, ThreadPoolBuilder};

static POOL: OnceLock<Mutex<Option<Arc<ThreadPool>>>> = OnceLock::new();

fn pool_slot() -> &'static Mutex<Option<Arc<ThreadPool>>> {
    POOL.get_or_init(|| Mutex::new(build_pool(None)))
}

/// `None` width means rayon's default (one worker per logical CPU).
fn build_pool(threads: Option<usize>) -> Option<Arc<ThreadPool>> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().ok().map(Arc::new)
}

/// Pool handle for the batch operators, if one is available.
pub(crate) fn current_pool() -> Option<Arc<ThreadPool>> {
    let guard = pool_slot().lock().unwrap_or_else(|e| e.into_inner());
    guard.clone()
}

/// Number of worker threads used by batch and all-pairs operators.
///
/// Returns 1 when multi-threading is unavailable.
#[must_use]
pub fn get_thread_count() -> usize {
    current_pool().map_or(1, |p| p.current_num_threads())
}

/// Set the number of worker threads used by batch and all-pairs operators.
///
/// `n = 0` is a no-op, as is a failed pool rebuild (the previous pool is
/// kept). In-flight calls keep the pool they started on.
pub fn set_thread_count(n: usize) {
    if n == 0 {
        return;
    }
    if let Some(pool) = build_pool(Some(n)) {
        let mut guard = pool_slot().lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(pool);
    }
}
