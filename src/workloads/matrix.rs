use rand::Rng;

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};

/// Naive `n x n` multiply with `n = iteration_hint`; only the multiply is timed.
pub struct MatrixMultiply;

/// Row-major `a * b`.
fn multiply(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let mut s = 0.0;
            for k in 0..n {
                s += a[i * n + k] * b[k * n + j];
            }
            out[i * n + j] = s;
        }
    }
    out
}

impl Workload for MatrixMultiply {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "matrix_multiply",
            default_iteration_hint: 100,
            quick_iteration_hint: 60,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let n = ctx.iteration_hint as usize;
        let a: Vec<f64> = (0..n * n).map(|_| ctx.rng.gen::<f64>()).collect();
        let b: Vec<f64> = (0..n * n).map(|_| ctx.rng.gen::<f64>()).collect();

        let (product, seconds) = ctx.time(|| multiply(&a, &b, n));
        let trace: f64 = (0..n).map(|i| product[i * n + i]).sum();

        Ok(TrialOutput::new((n * n * n) as f64)
            .measured(seconds)
            .with("size", n)
            .with("trace", trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_multiply_identity() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let id = vec![1.0, 0.0, 0.0, 1.0];
        assert_eq!(multiply(&a, &id, 2), a);
        assert_eq!(multiply(&a, &a, 2), vec![7.0, 10.0, 15.0, 22.0]);
    }

    #[test]
    fn test_ops_are_cubic() {
        let out = run_one(&MatrixMultiply, 10);
        assert_eq!(out.ops_done, 1_000.0);
        assert_eq!(out.aux["size"], 10);
    }
}
