//! One composite trial touching several subsystems in sequence.
//!
//! The timed section covers float arithmetic, a small recursive Fibonacci, a
//! sort plus binary search over fresh random integers, and a JSON document
//! written to and read back from a scratch file. Input generation happens
//! before the timed section.

use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::PathBuf;

use rand::Rng;
use serde_json::{json, Value};

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};
use crate::workloads::recursion::fib_naive;

const FIB_N: u64 = 10;
const PERSISTED_NUMBERS: usize = 50;

/// Composite trial over `iteration_hint` random integers; scratch file in `dir`.
pub struct AlgorithmicMix {
    pub dir: PathBuf,
}

fn float_sum() -> f64 {
    (1..500u32)
        .map(|i| f64::from(i).sin() * f64::from(i % 100 + 1).sqrt())
        .sum()
}

/// Sorts `numbers` and returns the first index holding the middle value.
fn sort_and_search(numbers: &mut [u32]) -> usize {
    numbers.sort_unstable();
    let target = numbers[numbers.len() / 2];
    numbers.partition_point(|&x| x < target)
}

impl AlgorithmicMix {
    fn io_cycle(&self, doc: &Value) -> Result<Value, TrialError> {
        let mut scratch = tempfile::Builder::new()
            .prefix("microbench-mix-")
            .tempfile_in(&self.dir)?;

        let mut writer = BufWriter::new(scratch.as_file_mut());
        serde_json::to_writer(&mut writer, doc)?;
        writer.flush()?;
        drop(writer);

        let file = scratch.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl Workload for AlgorithmicMix {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "algorithmic_mix",
            default_iteration_hint: 5_000,
            quick_iteration_hint: 5_000,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let size = ctx.iteration_hint.max(1) as usize;
        let mut numbers: Vec<u32> = (0..size).map(|_| ctx.rng.gen_range(1..=100_000)).collect();

        let (outcome, seconds) = ctx.time(|| -> Result<(usize, u64), TrialError> {
            let sum = float_sum();
            let mut calls = 0;
            let fib = fib_naive(FIB_N, &mut calls);
            let idx = sort_and_search(&mut numbers);

            let head = &numbers[..numbers.len().min(PERSISTED_NUMBERS)];
            let doc = json!({ "sum": sum, "fib": fib, "idx": idx, "nums": head });
            let back = self.io_cycle(&doc)?;
            let unchanged = ["nums", "fib", "idx"].iter().all(|k| back[k] == doc[k]);
            if !unchanged {
                return Err(TrialError::Checksum("JSON document changed on disk".to_string()));
            }
            Ok((idx, fib))
        });
        let (idx, fib) = outcome?;

        Ok(TrialOutput::new(1.0)
            .measured(seconds)
            .with("size", size)
            .with("idx", idx)
            .with("fib", fib))
    }
}
