//! Heap accounting for per-trial peak memory.
//!
//! The binary installs [`TrackingAllocator`] as the global allocator. Until it
//! serves its first allocation the tracker reports nothing, so library users
//! and unit tests see `None` peaks.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Forwards to [`System`] while counting live bytes.
pub struct TrackingAllocator;

static ACTIVE: AtomicBool = AtomicBool::new(false);
static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);
static BASELINE: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            ACTIVE.store(true, Ordering::Relaxed);
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            ACTIVE.store(true, Ordering::Relaxed);
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, old_layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, old_layout, new_size) };
        if !new_ptr.is_null() {
            let old = old_layout.size();
            if new_size > old {
                record_alloc(new_size - old);
            } else {
                record_dealloc(old - new_size);
            }
        }
        new_ptr
    }
}

fn record_alloc(size: usize) {
    let current = CURRENT.fetch_add(size, Ordering::Relaxed).saturating_add(size);
    PEAK.fetch_max(current, Ordering::Relaxed);
}

fn record_dealloc(size: usize) {
    CURRENT.fetch_sub(size, Ordering::Relaxed);
}

/// Whether the tracking allocator is serving allocations in this process.
pub fn is_tracking() -> bool {
    ACTIVE.load(Ordering::Relaxed)
}

/// Start a new peak window at the current live-byte level.
pub fn reset_peak() {
    let current = CURRENT.load(Ordering::Relaxed);
    BASELINE.store(current, Ordering::Relaxed);
    PEAK.store(current, Ordering::Relaxed);
}

/// Peak bytes allocated above the baseline since [`reset_peak`].
pub fn peak_since_reset() -> Option<u64> {
    if !is_tracking() {
        return None;
    }
    let peak = PEAK.load(Ordering::Relaxed);
    let baseline = BASELINE.load(Ordering::Relaxed);
    Some(peak.saturating_sub(baseline) as u64)
}
