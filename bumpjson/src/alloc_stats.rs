// SPDX-License-Identifier: Apache-2.0

//! Allocation accounting hooks for arenas.
//!
//! An [`AllocObserver`] is handed to an [`Arena`](crate::Arena) through
//! [`ArenaConfig`](crate::ArenaConfig) and is told about every block the arena
//! obtains from, or returns to, the global allocator. Nothing in the crate
//! keeps process-wide state: a harness that wants numbers creates its own
//! [`AllocCounters`] and shares it through an `Arc`.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Receives block-level allocation notifications from an arena.
pub trait AllocObserver: Send + Sync {
    /// A block of `bytes` bytes was obtained from the global allocator.
    fn block_allocated(&self, bytes: usize);
    /// A block of `bytes` bytes was returned to the global allocator.
    fn block_released(&self, bytes: usize);
}

/// Snapshot of the values held by [`AllocCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Number of blocks allocated.
    pub allocations: usize,
    /// Number of blocks released.
    pub releases: usize,
    /// Bytes currently held.
    pub current_bytes: usize,
    /// Highest value `current_bytes` reached.
    pub peak_bytes: usize,
    /// Bytes allocated over the counters' lifetime.
    pub total_bytes: usize,
}

/// Thread-safe counters implementing [`AllocObserver`].
#[derive(Debug, Default)]
pub struct AllocCounters {
    allocations: AtomicUsize,
    releases: AtomicUsize,
    current_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
    total_bytes: AtomicUsize,
}

impl AllocCounters {
    pub const fn new() -> Self {
        Self {
            allocations: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            current_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
            total_bytes: AtomicUsize::new(0),
        }
    }

    /// Reads all counters.
    pub fn stats(&self) -> AllocStats {
        AllocStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            current_bytes: self.current_bytes.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter, e.g. between benchmark iterations.
    pub fn reset(&self) {
        self.allocations.store(0, Ordering::Relaxed);
        self.releases.store(0, Ordering::Relaxed);
        self.current_bytes.store(0, Ordering::Relaxed);
        self.peak_bytes.store(0, Ordering::Relaxed);
        self.total_bytes.store(0, Ordering::Relaxed);
    }
}

impl AllocObserver for AllocCounters {
    fn block_allocated(&self, bytes: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
        let current = self
            .current_bytes
            .fetch_add(bytes, Ordering::Relaxed)
            .saturating_add(bytes);
        self.peak_bytes.fetch_max(current, Ordering::Relaxed);
    }

    fn block_released(&self, bytes: usize) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        // Saturate instead of wrapping if a reset happened while blocks were live
        let _ = self
            .current_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(bytes))
            });
    }
}
