use std::hint::black_box;

use crate::error::TrialError;
use crate::harness::{effective_repetitions, TrialContext, TrialOutput, Workload, WorkloadSpec};

/// Operations credited per kernel pass.
const UNIT: u64 = 1_000;

/// Integer and floating-point accumulation loop.
pub struct Arithmetic;

fn kernel() -> (i64, f64) {
    let mut s_int: i64 = 0;
    let mut s_float = 0.0f64;
    for i in 1..UNIT as i64 {
        s_int += i * (i & 1);
        let x = i as f64;
        s_float += x.sin() * x.sqrt();
    }
    (s_int, s_float)
}

impl Workload for Arithmetic {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "arithmetic",
            default_iteration_hint: 10_000_000,
            quick_iteration_hint: 1_000_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let reps = effective_repetitions(ctx.iteration_hint, UNIT);

        let mut acc_int: i64 = 0;
        let mut acc_float = 0.0f64;
        for _ in 0..reps {
            let (i, f) = black_box(kernel());
            acc_int = acc_int.wrapping_add(i);
            acc_float += f;
        }

        Ok(TrialOutput::new((reps * UNIT) as f64)
            .with("reps", reps)
            .with("acc_int", acc_int)
            .with("acc_float", acc_float))
    }
}
