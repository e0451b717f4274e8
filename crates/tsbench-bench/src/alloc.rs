//! Allocation counting through a wrapping global allocator.
//!
//! Install in a binary with
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: tsbench_bench::CountingAllocator = tsbench_bench::CountingAllocator;
//! ```
//!
//! Counters are process-wide, so deltas include allocations made by every
//! thread between two snapshots.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static BYTES: AtomicU64 = AtomicU64::new(0);

/// The system allocator, counting every allocation and reallocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

// SAFETY: every method forwards to `System` with the caller's arguments
// unchanged; the counters are plain atomics and never allocate.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        // SAFETY: forwarded from the caller's contract.
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        // SAFETY: forwarded from the caller's contract.
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        BYTES.fetch_add(new_size as u64, Ordering::Relaxed);
        // SAFETY: forwarded from the caller's contract.
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

/// Counter values at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocSnapshot {
    allocations: u64,
    bytes: u64,
}

impl AllocSnapshot {
    /// Read the counters.
    #[must_use]
    pub fn now() -> Self {
        Self {
            allocations: ALLOCATIONS.load(Ordering::Relaxed),
            bytes: BYTES.load(Ordering::Relaxed),
        }
    }

    /// Activity between `self` and the later snapshot `later`.
    #[must_use]
    pub fn until(&self, later: &Self) -> AllocDelta {
        AllocDelta {
            allocations: later.allocations.saturating_sub(self.allocations),
            bytes: later.bytes.saturating_sub(self.bytes),
        }
    }
}

/// Allocation activity between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocDelta {
    /// Number of allocation and reallocation calls.
    pub allocations: u64,
    /// Bytes requested by those calls.
    pub bytes: u64,
}

impl CountingAllocator {
    /// True if this allocator serves the process's allocations.
    #[must_use]
    pub fn is_installed() -> bool {
        let before = AllocSnapshot::now();
        let probe = std::hint::black_box(Box::new(0u64));
        drop(probe);
        before.until(&AllocSnapshot::now()).allocations > 0
    }
}
