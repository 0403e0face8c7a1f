//! Error types for the harness.
//!
//! [`TrialError`] is scoped to one trial and is always absorbed by the trial
//! runner. [`HarnessError`] is what escapes to the caller.

use thiserror::Error;

/// Why a single trial failed.
#[derive(Error, Debug)]
pub enum TrialError {
    /// The workload rejected its own output or input.
    #[error("workload error: {0}")]
    Workload(String),

    /// Read-back data did not match what was written.
    #[error("checksum mismatch: {0}")]
    Checksum(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// The workload panicked; the payload message is kept when it is a string.
    #[error("workload panicked: {0}")]
    Panicked(String),
}

/// Run-level error surfaced to the caller.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A precondition gate failed before any trial executed.
    #[error("precondition failed for {workload}: {reason}")]
    Precondition { workload: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, HarnessError>;
