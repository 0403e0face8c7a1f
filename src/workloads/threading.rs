use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};
use crate::partition::run_partitioned;

/// CPU-bound loop split across `workers` parallel threads.
///
/// `iteration_hint` is the total unit count. One partitioned execution is one
/// trial; throughput counts only the units actually assigned.
pub struct Threading {
    pub workers: usize,
}

/// `i^2 mod 97`, exact for every `u64`.
fn square_mod(i: u64) -> u64 {
    ((i as u128 * i as u128) % 97) as u64
}

fn cpu_bound_work(units: u64) -> u64 {
    (0..units).fold(0u64, |s, i| s.wrapping_add(square_mod(i)))
}

impl Workload for Threading {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "threading",
            default_iteration_hint: 2_000_000,
            quick_iteration_hint: 200_000,
            median_fields: &["avg_worker_time_s"],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let workers = self.workers.max(1);
        let run = run_partitioned(ctx.clock(), ctx.iteration_hint, workers, cpu_bound_work);

        Ok(TrialOutput::new(run.assigned_units as f64)
            .measured(run.total_time_seconds)
            .with("workers", workers)
            .with("assigned_units", run.assigned_units)
            .with("unassigned_units", run.unassigned_units())
            .with("avg_worker_time_s", run.average_worker_time_seconds())
            .with("worker_times_s", run.worker_times()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TrialRunner;
    use crate::stats;
    use crate::sys::MonotonicClock;

    #[test]
    fn test_remainder_is_not_counted() {
        let clock = MonotonicClock::new();
        let report = TrialRunner::new(&clock)
            .run(&Threading { workers: 3 }, 3, 10)
            .unwrap();

        assert_eq!(report.raw_trials.len(), 3);
        for trial in &report.raw_trials {
            let m = trial.metrics().unwrap();
            assert_eq!(m.ops_done, 9.0);
            assert_eq!(m.aux["unassigned_units"], 1);
            assert_eq!(m.ops_per_second, stats::throughput(9.0, m.duration_seconds));
        }
        assert!(report.medians.contains_key("avg_worker_time_s"));
    }

    #[test]
    fn test_even_split_reports_every_worker() {
        let clock = MonotonicClock::new();
        let mut ctx = TrialContext::new(0, 2_000_000, 1, &clock);
        let out = Threading { workers: 8 }.run_once(&mut ctx).unwrap();

        assert_eq!(out.ops_done, 2_000_000.0);
        assert_eq!(out.aux["worker_times_s"].as_array().map(Vec::len), Some(8));
        assert_eq!(out.aux["unassigned_units"], 0);
    }

    #[test]
    fn test_cpu_bound_work_is_deterministic() {
        assert_eq!(cpu_bound_work(0), 0);
        assert_eq!(cpu_bound_work(4), 14);
        // the last term is 100 % 97 = 3
        assert_eq!(cpu_bound_work(11), 288);
    }

    #[test]
    fn test_square_does_not_overflow_past_u32() {
        // 2^64 mod 97
        assert_eq!(square_mod(1 << 32), 61);
        // u64::MAX mod 97 = 60
        assert_eq!(square_mod(u64::MAX), 3_600 % 97);
    }
}
