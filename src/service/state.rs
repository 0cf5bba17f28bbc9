// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Service state allocation
//!
//! A loaded service owns exactly one [`ServiceState`], which holds a lease on
//! a bounded [`StatePool`]. The lease goes back to the pool when the state is
//! dropped, so a load/unload pair allocates and frees exactly once.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Allocation counters of a state pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocations_total: u64,
    pub allocations_success: u64,
    pub allocations_failed: u64,
    pub releases_total: u64,
}

struct PoolInner {
    capacity: usize,
    in_use: AtomicUsize,
    allocations_total: AtomicU64,
    allocations_failed: AtomicU64,
    releases_total: AtomicU64,
}

/// Bounded pool of service state slots
#[derive(Clone)]
pub struct StatePool {
    inner: Arc<PoolInner>,
}

impl StatePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                in_use: AtomicUsize::new(0),
                allocations_total: AtomicU64::new(0),
                allocations_failed: AtomicU64::new(0),
                releases_total: AtomicU64::new(0),
            }),
        }
    }

    /// Take one slot, or None if every slot is in use
    pub fn lease(&self) -> Option<StateLease> {
        let inner = &self.inner;
        inner.allocations_total.fetch_add(1, Ordering::Relaxed);

        let mut current = inner.in_use.load(Ordering::Relaxed);
        loop {
            if current >= inner.capacity {
                inner.allocations_failed.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            match inner.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return Some(StateLease {
                        pool: Arc::clone(inner),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.in_use())
    }

    /// Successful allocations so far
    pub fn allocations(&self) -> u64 {
        self.stats().allocations_success
    }

    pub fn releases(&self) -> u64 {
        self.inner.releases_total.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> PoolStats {
        let total = self.inner.allocations_total.load(Ordering::Relaxed);
        let failed = self.inner.allocations_failed.load(Ordering::Relaxed);
        PoolStats {
            allocations_total: total,
            allocations_success: total.saturating_sub(failed),
            allocations_failed: failed,
            releases_total: self.releases(),
        }
    }
}

impl fmt::Debug for StatePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatePool")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use())
            .finish()
    }
}

/// One occupied pool slot; released on drop
pub struct StateLease {
    pool: Arc<PoolInner>,
}

impl Drop for StateLease {
    fn drop(&mut self) {
        self.pool.in_use.fetch_sub(1, Ordering::AcqRel);
        self.pool.releases_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for StateLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateLease")
    }
}

/// Framework-owned state of a loaded service
#[derive(Debug)]
pub struct ServiceState {
    pub(crate) started: bool,
    _lease: StateLease,
}

impl ServiceState {
    pub(crate) fn new(lease: StateLease) -> Self {
        Self {
            started: false,
            _lease: lease,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}
