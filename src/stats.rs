//! Median reduction of per-trial samples.
//!
//! Duration and throughput medians are selected independently: each field is
//! sorted on its own and the element at index `n / 2` is taken, so the two
//! reported medians may come from different trials. Historical reports were
//! produced this way and comparisons against them rely on it.

use crate::schema::TrialResult;
use std::cmp::Ordering;

/// Floor applied to durations before dividing, in seconds.
pub const EPSILON_SECONDS: f64 = 1e-9;

/// Operations per second, finite even for a zero duration.
pub fn throughput(ops_done: f64, duration_seconds: f64) -> f64 {
    ops_done / duration_seconds.max(EPSILON_SECONDS)
}

/// Element at index `n / 2` of an ascending-sorted copy of `samples`.
///
/// On even counts this is the upper of the two middle values.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(sorted[sorted.len() / 2])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub median_duration_seconds: f64,
    pub median_ops_per_second: f64,
    /// Number of non-failed trials the medians were taken over.
    pub samples: usize,
}

/// Reduce a run's trials to its two medians, skipping failed trials.
///
/// Returns `None` when no trial succeeded.
pub fn aggregate(trials: &[TrialResult]) -> Option<Summary> {
    let valid: Vec<_> = trials.iter().filter_map(TrialResult::metrics).collect();

    let durations: Vec<f64> = valid.iter().map(|m| m.duration_seconds).collect();
    let rates: Vec<f64> = valid.iter().map(|m| m.ops_per_second).collect();

    Some(Summary {
        median_duration_seconds: median(&durations)?,
        median_ops_per_second: median(&rates)?,
        samples: valid.len(),
    })
}

/// Median of one numeric auxiliary field over the successful trials that carry it.
pub fn aggregate_field(trials: &[TrialResult], key: &str) -> Option<f64> {
    let values: Vec<f64> = trials
        .iter()
        .filter_map(TrialResult::metrics)
        .filter_map(|m| m.aux_f64(key))
        .collect();
    median(&values)
}
