//! Fixed-share parallel execution of one unit of work.
//!
//! `total_units` is split into `worker_count` equal shares of
//! `total_units / worker_count`. The remainder is not assigned to anyone and
//! is excluded from the throughput numerator; reports carry it as
//! `unassigned_units` so the under-count stays visible.
//!
//! Each worker owns exactly one [`WorkerShare`] slot for the duration of the
//! scope. Slots are only read after every worker has joined.

use std::hint::black_box;
use std::thread;

use crate::stats;
use crate::sys::Clock;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerShare {
    pub worker_index: usize,
    pub unit_count: u64,
    pub elapsed_seconds: f64,
}

/// Units assigned to each worker; an empty pool gets nothing.
pub fn partition(total_units: u64, worker_count: usize) -> Vec<u64> {
    if worker_count == 0 {
        return Vec::new();
    }
    vec![total_units / worker_count as u64; worker_count]
}

#[derive(Debug, Clone)]
pub struct PartitionedRun {
    pub shares: Vec<WorkerShare>,
    pub total_units: u64,
    pub assigned_units: u64,
    /// From first dispatch to last join.
    pub total_time_seconds: f64,
}

impl PartitionedRun {
    pub fn unassigned_units(&self) -> u64 {
        self.total_units - self.assigned_units
    }

    /// Assigned units per second of wall time.
    pub fn throughput(&self) -> f64 {
        stats::throughput(self.assigned_units as f64, self.total_time_seconds)
    }

    /// Mean of per-worker elapsed times; workers overlap, so this is not wall time.
    pub fn average_worker_time_seconds(&self) -> f64 {
        if self.shares.is_empty() {
            return 0.0;
        }
        self.shares.iter().map(|s| s.elapsed_seconds).sum::<f64>() / self.shares.len() as f64
    }

    pub fn worker_times(&self) -> Vec<f64> {
        self.shares.iter().map(|s| s.elapsed_seconds).collect()
    }
}

/// Run `work(unit_count)` on `worker_count` scoped threads and join them all.
///
/// A panicking worker propagates its panic once every worker has joined.
pub fn run_partitioned<F, R>(
    clock: &dyn Clock,
    total_units: u64,
    worker_count: usize,
    work: F,
) -> PartitionedRun
where
    F: Fn(u64) -> R + Sync,
{
    let mut shares: Vec<WorkerShare> = partition(total_units, worker_count)
        .into_iter()
        .enumerate()
        .map(|(worker_index, unit_count)| WorkerShare {
            worker_index,
            unit_count,
            elapsed_seconds: 0.0,
        })
        .collect();
    let assigned_units = shares.iter().map(|s| s.unit_count).sum();

    let work = &work;
    let start = clock.now();
    thread::scope(|scope| {
        for share in shares.iter_mut() {
            scope.spawn(move || {
                let t0 = clock.now();
                black_box(work(share.unit_count));
                share.elapsed_seconds = clock.now() - t0;
            });
        }
    });
    let total_time_seconds = clock.now() - start;

    PartitionedRun {
        shares,
        total_units,
        assigned_units,
        total_time_seconds,
    }
}
