use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::TrialError;
use crate::harness::{effective_repetitions, TrialContext, TrialOutput, Workload, WorkloadSpec};

const LIST_UNIT: u64 = 1_000;
/// Lower bound on list kernel passes per trial.
const LIST_MIN_REPS: u64 = 50;

/// Append, random insert/remove, then random reads on a `Vec`.
pub struct ListOps;

fn list_kernel(rng: &mut ChaCha8Rng) -> i64 {
    let mut list: Vec<i64> = (0..5_000).collect();

    for _ in 0..500 {
        let idx = rng.gen_range(0..=list.len());
        list.insert(idx, rng.gen_range(0..=100));
    }
    for _ in 0..500 {
        if !list.is_empty() {
            let idx = rng.gen_range(0..list.len());
            list.remove(idx);
        }
    }

    (0..LIST_UNIT)
        .map(|_| list[rng.gen_range(0..list.len())])
        .sum()
}

impl Workload for ListOps {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "list_ops",
            default_iteration_hint: 1_000_000,
            quick_iteration_hint: 100_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let reps = effective_repetitions(ctx.iteration_hint, LIST_UNIT).max(LIST_MIN_REPS);
        let acc: i64 = (0..reps).map(|_| list_kernel(&mut ctx.rng)).sum();

        Ok(TrialOutput::new((reps * LIST_UNIT) as f64)
            .with("reps", reps)
            .with("acc", acc))
    }
}

const ARRAY_LEN: u64 = 10_000;

/// Sequential sum then shuffled-order subtraction over the same array.
pub struct MemoryAccess;

fn access_kernel(rng: &mut ChaCha8Rng) -> i64 {
    let arr: Vec<i64> = (0..ARRAY_LEN as i64).collect();
    let mut s: i64 = arr.iter().sum();

    let mut indices: Vec<usize> = (0..arr.len()).collect();
    indices.shuffle(rng);
    for i in indices {
        s -= arr[i];
    }
    s
}

impl Workload for MemoryAccess {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "memory_access",
            default_iteration_hint: 5_000_000,
            quick_iteration_hint: 500_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let reps = effective_repetitions(ctx.iteration_hint, ARRAY_LEN);
        let acc: i64 = (0..reps).map(|_| access_kernel(&mut ctx.rng)).sum();
        if acc != 0 {
            return Err(TrialError::Checksum(format!("expected 0, got {acc}")));
        }

        Ok(TrialOutput::new((reps * ARRAY_LEN) as f64)
            .with("reps", reps)
            .with("acc", acc))
    }
}
