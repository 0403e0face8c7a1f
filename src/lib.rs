use clap::ValueEnum;

pub mod error;
pub mod harness;
pub mod interrupt;
pub mod memory;
pub mod partition;
pub mod schema;
pub mod stats;
pub mod sys;
pub mod workloads;

pub use error::{HarnessError, TrialError};
pub use harness::{
    BenchConfig, Profile, TrialContext, TrialOutput, TrialRunner, Workload, WorkloadSpec,
};
pub use schema::{RunReport, TrialMetrics, TrialResult};

/// Workload to benchmark.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    /// Integer and floating-point loop arithmetic.
    Arithmetic,
    /// Branchy modulo dispatch.
    LogicControl,
    /// Naive recursive Fibonacci.
    Fibonacci,
    /// Fibonacci with a cache scoped to a single invocation.
    FibonacciMemo,
    /// Sort freshly generated random integers.
    Sorting,
    /// Append/reverse/replace/find string mutation.
    StringOps,
    /// Repeated push versus one-shot concatenation.
    StringConcat,
    /// Vec append, random insert/remove and random access.
    ListOps,
    /// Sequential then shuffled array access.
    MemoryAccess,
    /// Naive dense matrix multiply.
    MatrixMultiply,
    /// Nested JSON document encode + decode.
    JsonSerialization,
    /// Record batch bincode round trips.
    BinarySerialization,
    /// zstd compress + decompress of a text block.
    Compression,
    /// Sequential temp-file write then read.
    FileIo,
    /// CPU-bound work partitioned across parallel workers.
    Threading,
    /// Arithmetic, recursion, sort/search and a JSON file cycle in one trial.
    AlgorithmicMix,
}

impl WorkloadKind {
    pub fn all() -> &'static [WorkloadKind] {
        WorkloadKind::value_variants()
    }
}
