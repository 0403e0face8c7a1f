//! Harness overhead benchmark suite
//!
//! Benchmarks for the measurement machinery itself:
//! - Median aggregation over growing trial counts
//! - Partitioned execution across worker pool sizes
//! - Trial runner overhead on an empty workload

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use microbench_harness::harness::{TrialContext, TrialOutput, TrialRunner, Workload, WorkloadSpec};
use microbench_harness::partition::run_partitioned;
use microbench_harness::schema::{TrialMetrics, TrialResult};
use microbench_harness::stats::{aggregate, throughput};
use microbench_harness::sys::MonotonicClock;
use microbench_harness::TrialError;

/// Deterministic trial set with every tenth trial failed
fn synthetic_trials(n: usize) -> Vec<TrialResult> {
    (0..n)
        .map(|i| {
            if i % 10 == 9 {
                return TrialResult::failed("synthetic");
            }
            let duration = 0.001 + ((i * 7919) % 1000) as f64 * 1e-6;
            TrialResult::Completed(TrialMetrics {
                duration_seconds: duration,
                ops_done: 1_000.0,
                ops_per_second: throughput(1_000.0, duration),
                aux: Default::default(),
            })
        })
        .collect()
}

/// Benchmark median aggregation
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n in [5usize, 50, 500, 5_000] {
        let trials = synthetic_trials(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &trials, |bencher, trials| {
            bencher.iter(|| black_box(aggregate(black_box(trials))))
        });
    }

    group.finish();
}

/// Benchmark partitioned execution
fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    group.sample_size(20);
    let clock = MonotonicClock::new();

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |bencher, &w| {
            bencher.iter(|| {
                let run = run_partitioned(&clock, 200_000, w, |units| {
                    (0..units).fold(0u64, |s, i| s.wrapping_add((i * i) % 97))
                });
                black_box(run.throughput())
            })
        });
    }

    group.finish();
}

struct Noop;

impl Workload for Noop {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "noop",
            default_iteration_hint: 1,
            quick_iteration_hint: 1,
            median_fields: &[],
        }
    }

    fn run_once(&self, _ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        Ok(TrialOutput::new(1.0))
    }
}

/// Benchmark runner overhead per run
fn bench_runner_overhead(c: &mut Criterion) {
    let clock = MonotonicClock::new();
    let runner = TrialRunner::new(&clock).with_reclaim(false);

    c.bench_function("runner/noop_5_trials", |bencher| {
        bencher.iter(|| black_box(runner.run(&Noop, 5, 1)))
    });
}

criterion_group!(benches, bench_aggregate, bench_partition, bench_runner_overhead);
criterion_main!(benches);
