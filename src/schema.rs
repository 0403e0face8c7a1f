use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Outcome of one successful trial.
///
/// Workload-specific fields (checksums, byte counts, accumulators) live in
/// `aux` and are flattened into the serialized record next to the timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMetrics {
    #[serde(rename = "time_s")]
    pub duration_seconds: f64,
    #[serde(rename = "ops")]
    pub ops_done: f64,
    #[serde(rename = "ops_per_sec")]
    pub ops_per_second: f64,
    #[serde(flatten)]
    pub aux: Map<String, Value>,
}

impl TrialMetrics {
    /// Numeric auxiliary field, if present.
    pub fn aux_f64(&self, key: &str) -> Option<f64> {
        self.aux.get(key).and_then(Value::as_f64)
    }
}

/// A failed trial keeps only its error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTrial {
    pub error: String,
}

/// One invocation's outcome, in execution order inside a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrialResult {
    Completed(TrialMetrics),
    Failed(FailedTrial),
}

impl TrialResult {
    pub fn failed(error: impl ToString) -> Self {
        TrialResult::Failed(FailedTrial {
            error: error.to_string(),
        })
    }

    pub fn metrics(&self) -> Option<&TrialMetrics> {
        match self {
            TrialResult::Completed(m) => Some(m),
            TrialResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TrialResult::Completed(_) => None,
            TrialResult::Failed(f) => Some(&f.error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TrialResult::Failed(_))
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Result of one full run of a workload.
///
/// Exactly one of the two states holds: both medians present and `error`
/// absent, or both medians absent and `error` present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub runs: u32,
    pub iteration_hint: u64,

    #[serde(rename = "median_time_s", default, skip_serializing_if = "Option::is_none")]
    pub median_duration_seconds: Option<f64>,
    #[serde(rename = "median_ops_per_sec", default, skip_serializing_if = "Option::is_none")]
    pub median_ops_per_second: Option<f64>,

    /// Medians of workload-declared auxiliary fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub medians: BTreeMap<String, f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set when the run was cut short by SIGINT/SIGTERM.
    #[serde(default, skip_serializing_if = "is_false")]
    pub interrupted: bool,

    #[serde(rename = "raw")]
    pub raw_trials: Vec<TrialResult>,
}

impl RunReport {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn completed_trials(&self) -> usize {
        self.raw_trials.iter().filter(|t| !t.is_failed()).count()
    }

    pub fn failed_trials(&self) -> usize {
        self.raw_trials.len() - self.completed_trials()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub harness_version: String,
    pub profile: String,
    pub seed: u64,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

/// A workload whose precondition gate refused to run it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRun {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run: RunMeta,
    pub reports: Vec<RunReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRun>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed(time_s: f64, ops: f64, checksum: u64) -> TrialResult {
        let mut aux = Map::new();
        aux.insert("checksum".to_string(), json!(checksum));
        TrialResult::Completed(TrialMetrics {
            duration_seconds: time_s,
            ops_done: ops,
            ops_per_second: ops / time_s,
            aux,
        })
    }

    #[test]
    fn test_report_round_trip_preserves_order_and_values() {
        let report = RunReport {
            name: "sorting".to_string(),
            runs: 4,
            iteration_hint: 10_000,
            median_duration_seconds: Some(0.25),
            median_ops_per_second: Some(400.0),
            medians: BTreeMap::from([("mem_peak_bytes".to_string(), 4096.0)]),
            error: None,
            interrupted: false,
            raw_trials: vec![
                completed(0.3, 100.0, 7),
                TrialResult::failed("boom"),
                completed(0.25, 100.0, 9),
                completed(0.125, 100.0, 11),
            ],
        };

        let text = serde_json::to_string_pretty(&report).unwrap();
        let parsed: RunReport = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.raw_trials.len(), 4);
        assert!(parsed.raw_trials[1].is_failed());
        assert_eq!(parsed.raw_trials[1].error(), Some("boom"));
        for (a, b) in report.raw_trials.iter().zip(parsed.raw_trials.iter()) {
            match (a.metrics(), b.metrics()) {
                (Some(a), Some(b)) => {
                    assert!((a.duration_seconds - b.duration_seconds).abs() < 1e-12);
                    assert!((a.ops_per_second - b.ops_per_second).abs() < 1e-9);
                    assert_eq!(a.aux_f64("checksum"), b.aux_f64("checksum"));
                }
                (None, None) => {}
                _ => panic!("trial kind changed across round trip"),
            }
        }
        assert_eq!(parsed.median_duration_seconds, Some(0.25));
        assert_eq!(parsed.medians.get("mem_peak_bytes"), Some(&4096.0));
    }

    #[test]
    fn test_error_report_omits_medians() {
        let report = RunReport {
            name: "file_io".to_string(),
            runs: 2,
            iteration_hint: 1,
            median_duration_seconds: None,
            median_ops_per_second: None,
            medians: BTreeMap::new(),
            error: Some("all 2 trials failed".to_string()),
            interrupted: false,
            raw_trials: vec![TrialResult::failed("a"), TrialResult::failed("b")],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("median_time_s").is_none());
        assert!(value.get("median_ops_per_sec").is_none());
        assert!(value.get("interrupted").is_none());
        assert_eq!(value["error"], json!("all 2 trials failed"));
        assert_eq!(value["raw"][0], json!({"error": "a"}));
    }

    #[test]
    fn test_trial_record_uses_external_field_names() {
        let value = serde_json::to_value(completed(2.0, 10.0, 3)).unwrap();
        assert_eq!(value["time_s"], json!(2.0));
        assert_eq!(value["ops_per_sec"], json!(5.0));
        assert_eq!(value["checksum"], json!(3));
    }
}
