use std::hint::black_box;

use crate::error::TrialError;
use crate::harness::{effective_repetitions, TrialContext, TrialOutput, Workload, WorkloadSpec};
use crate::stats;

/// Mutation steps per kernel pass.
const UNIT: u64 = 100;

/// Append, reverse, replace and search on a growing string.
pub struct StringOps;

fn mutate() -> usize {
    let mut s = String::from("benchmark");
    for i in 0..UNIT {
        s.push_str(&i.to_string());
        s = s.chars().rev().collect();
        s = s.replace('a', "A");
        black_box(s.find('b'));
    }
    s.len()
}

impl Workload for StringOps {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "string_ops",
            default_iteration_hint: 500_000,
            quick_iteration_hint: 50_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let reps = effective_repetitions(ctx.iteration_hint, UNIT);
        let total_len: u64 = (0..reps).map(|_| mutate() as u64).sum();

        Ok(TrialOutput::new((reps * UNIT) as f64)
            .with("reps", reps)
            .with("total_len", total_len))
    }
}

/// Build an `n`-character string by repeated push, then in one shot.
pub struct StringConcat;

impl Workload for StringConcat {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "string_concat",
            default_iteration_hint: 500_000,
            quick_iteration_hint: 50_000,
            median_fields: &["plus_time_s", "join_time_s"],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let n = ctx.iteration_hint as usize;

        let (length_plus, plus_s) = ctx.time(|| {
            let mut s = String::new();
            for _ in 0..n {
                s += "a";
            }
            black_box(s).len()
        });
        let (length_join, join_s) = ctx.time(|| black_box(vec!["a"; n].concat()).len());

        if length_plus != n || length_join != n {
            return Err(TrialError::Workload(format!(
                "expected length {n}, got {length_plus} (push) and {length_join} (join)"
            )));
        }

        let n = n as f64;
        Ok(TrialOutput::new(2.0 * n)
            .measured(plus_s + join_s)
            .with("plus_time_s", plus_s)
            .with("join_time_s", join_s)
            .with("ops_per_sec_plus", stats::throughput(n, plus_s))
            .with("ops_per_sec_join", stats::throughput(n, join_s))
            .with("length", length_plus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_string_ops_counts_steps() {
        let out = run_one(&StringOps, 250);
        assert_eq!(out.ops_done, 200.0);
        assert_eq!(out.aux["total_len"].as_u64(), Some(2 * mutate() as u64));
    }

    #[test]
    fn test_concat_lengths_match() {
        let out = run_one(&StringConcat, 1_000);
        assert_eq!(out.ops_done, 2_000.0);
        assert_eq!(out.aux["length"], 1_000);
        let plus = out.aux["plus_time_s"].as_f64().unwrap();
        let join = out.aux["join_time_s"].as_f64().unwrap();
        assert_eq!(out.measured_seconds, Some(plus + join));
    }
}
