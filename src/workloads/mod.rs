//! Concrete workloads behind the [`Workload`] contract.

use std::path::PathBuf;

use crate::harness::Workload;
use crate::WorkloadKind;

pub mod arithmetic;
pub mod compression;
pub mod file_io;
pub mod lists;
pub mod logic;
pub mod matrix;
pub mod mix;
pub mod recursion;
pub mod serialization;
pub mod sorting;
pub mod strings;
pub mod threading;

/// Default worker count for the threading workload.
pub const DEFAULT_WORKERS: usize = 8;

/// Instantiate `kind` with its default settings.
///
/// `scratch_dir` is where file-backed workloads place their temporary files.
pub fn build(kind: WorkloadKind, scratch_dir: PathBuf) -> Box<dyn Workload> {
    match kind {
        WorkloadKind::Arithmetic => Box::new(arithmetic::Arithmetic),
        WorkloadKind::LogicControl => Box::new(logic::LogicControl),
        WorkloadKind::Fibonacci => Box::new(recursion::Fibonacci { memoize: false }),
        WorkloadKind::FibonacciMemo => Box::new(recursion::Fibonacci { memoize: true }),
        WorkloadKind::Sorting => Box::new(sorting::Sorting),
        WorkloadKind::StringOps => Box::new(strings::StringOps),
        WorkloadKind::StringConcat => Box::new(strings::StringConcat),
        WorkloadKind::ListOps => Box::new(lists::ListOps),
        WorkloadKind::MemoryAccess => Box::new(lists::MemoryAccess),
        WorkloadKind::MatrixMultiply => Box::new(matrix::MatrixMultiply),
        WorkloadKind::JsonSerialization => Box::new(serialization::JsonRoundTrip::default()),
        WorkloadKind::BinarySerialization => Box::new(serialization::BincodeRoundTrip::default()),
        WorkloadKind::Compression => Box::new(compression::Compression::default()),
        WorkloadKind::FileIo => Box::new(file_io::FileIo::new(scratch_dir)),
        WorkloadKind::AlgorithmicMix => Box::new(mix::AlgorithmicMix { dir: scratch_dir }),
        WorkloadKind::Threading => Box::new(threading::Threading {
            workers: DEFAULT_WORKERS,
        }),
    }
}
