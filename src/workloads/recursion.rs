use std::collections::HashMap;

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};

/// Above this `n` the naive recursion is replaced by iteration.
const RECURSION_LIMIT: u64 = 40;

/// Fibonacci of `n = iteration_hint`.
///
/// With `memoize` the cache is created per invocation, so every trial pays
/// the same cold-cache cost.
pub struct Fibonacci {
    pub memoize: bool,
}

pub(crate) fn fib_naive(n: u64, calls: &mut u64) -> u64 {
    *calls += 1;
    if n < 2 {
        return n;
    }
    fib_naive(n - 1, calls).wrapping_add(fib_naive(n - 2, calls))
}

fn fib_memo(n: u64, cache: &mut HashMap<u64, u64>, calls: &mut u64) -> u64 {
    *calls += 1;
    if n < 2 {
        return n;
    }
    if let Some(&v) = cache.get(&n) {
        return v;
    }
    let v = fib_memo(n - 1, cache, calls).wrapping_add(fib_memo(n - 2, cache, calls));
    cache.insert(n, v);
    v
}

fn fib_iterative(n: u64) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        (a, b) = (b, a.wrapping_add(b));
    }
    a
}

impl Workload for Fibonacci {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: if self.memoize { "fibonacci_memo" } else { "fibonacci" },
            default_iteration_hint: 24,
            quick_iteration_hint: 20,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let n = ctx.iteration_hint;
        let mut calls = 0u64;

        let result = if n > RECURSION_LIMIT {
            fib_iterative(n)
        } else if self.memoize {
            let mut cache = HashMap::new();
            fib_memo(n, &mut cache, &mut calls)
        } else {
            fib_naive(n, &mut calls)
        };

        Ok(TrialOutput::new(1.0)
            .with("n", n)
            .with("result", result)
            .with("calls", calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_naive_and_memo_agree() {
        let naive = run_one(&Fibonacci { memoize: false }, 20);
        let memo = run_one(&Fibonacci { memoize: true }, 20);
        assert_eq!(naive.aux["result"], 6765);
        assert_eq!(memo.aux["result"], 6765);
        assert_eq!(naive.aux["calls"], 21_891);
        assert_eq!(memo.aux["calls"], 39);
    }

    #[test]
    fn test_memo_cache_does_not_survive_invocations() {
        let wl = Fibonacci { memoize: true };
        let first = run_one(&wl, 25);
        let second = run_one(&wl, 25);
        assert_eq!(first.aux["calls"], second.aux["calls"]);
    }

    #[test]
    fn test_large_n_uses_iteration() {
        let out = run_one(&Fibonacci { memoize: false }, 50);
        assert_eq!(out.aux["result"], 12_586_269_025u64);
        assert_eq!(out.aux["calls"], 0);
    }
}
