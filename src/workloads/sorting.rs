use rand::Rng;

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};

/// Sort `n = iteration_hint` random integers in `0..=1_000_000`.
pub struct Sorting;

/// Comparison-count estimate `n * bit_length(n)`.
fn estimated_ops(n: u64) -> u64 {
    n * (u64::BITS - n.leading_zeros()) as u64
}

impl Workload for Sorting {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "sorting",
            default_iteration_hint: 10_000,
            quick_iteration_hint: 10_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let n = ctx.iteration_hint;
        let mut data: Vec<u32> = (0..n).map(|_| ctx.rng.gen_range(0..=1_000_000)).collect();

        let (checksum, seconds) = ctx.time(|| {
            data.sort_unstable();
            data.iter().take(100).map(|&v| v as u64).sum::<u64>()
        });

        if !data.windows(2).all(|w| w[0] <= w[1]) {
            return Err(TrialError::Workload("output is not sorted".to_string()));
        }

        Ok(TrialOutput::new(estimated_ops(n) as f64)
            .measured(seconds)
            .with("n", n)
            .with("checksum", checksum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_ops_estimate() {
        assert_eq!(estimated_ops(10_000), 140_000);
        assert_eq!(estimated_ops(1), 1);
        assert_eq!(estimated_ops(0), 0);
    }

    #[test]
    fn test_sorts_and_reports_checksum() {
        let out = run_one(&Sorting, 1_000);
        assert_eq!(out.ops_done, 10_000.0);
        assert!(out.measured_seconds.is_some());
        assert!(out.aux["checksum"].as_u64().is_some());
    }
}
