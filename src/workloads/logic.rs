use std::hint::black_box;

use crate::error::TrialError;
use crate::harness::{effective_repetitions, TrialContext, TrialOutput, Workload, WorkloadSpec};

/// Operations credited per kernel pass.
const UNIT: u64 = 1_000;

/// Branch-heavy modulo dispatch over a short integer range.
pub struct LogicControl;

fn kernel() -> i64 {
    let mut acc: i64 = 0;
    for i in 1..500i64 {
        if i % 15 == 0 {
            acc += i * 2;
        } else if i % 5 == 0 {
            acc -= i;
        } else if i % 3 == 0 {
            acc += i / 2;
        } else {
            acc += i & 1;
        }
    }
    acc
}

impl Workload for LogicControl {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "logic_control",
            default_iteration_hint: 10_000_000,
            quick_iteration_hint: 1_000_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let reps = effective_repetitions(ctx.iteration_hint, UNIT);

        let mut acc: i64 = 0;
        for _ in 0..reps {
            acc = acc.wrapping_add(black_box(kernel()));
        }

        Ok(TrialOutput::new((reps * UNIT) as f64)
            .with("reps", reps)
            .with("acc", acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_kernel_value() {
        assert_eq!(kernel(), 17_180);
    }

    #[test]
    fn test_ops_follow_repetitions() {
        let out = run_one(&LogicControl, 3_999);
        assert_eq!(out.ops_done, 3_000.0);
        assert_eq!(out.aux["reps"], 3);
        assert_eq!(out.aux["acc"], 3 * 17_180);
    }

    #[test]
    fn test_small_hint_still_runs_once() {
        let out = run_one(&LogicControl, 1);
        assert_eq!(out.ops_done, 1_000.0);
    }
}
