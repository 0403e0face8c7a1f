use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::{HarnessError, Result, TrialError};
use crate::memory;
use crate::schema::{RunReport, SkippedRun, TrialMetrics, TrialResult};
use crate::stats;
use crate::sys::{self, Clock};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub profile: Profile,
    pub seed: u64,
    /// Overrides the profile's run count.
    pub runs: Option<u32>,
    /// Overrides the workload's default iteration hint.
    pub iterations: Option<u64>,
    /// Call [`sys::reclaim`] between trials.
    pub reclaim: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Quick,
            seed: 0,
            runs: None,
            iterations: None,
            reclaim: true,
        }
    }
}

impl BenchConfig {
    pub fn run_count(&self) -> u32 {
        self.runs.unwrap_or(match self.profile {
            Profile::Quick => 3,
            Profile::Full => 5,
        })
    }

    pub fn iteration_hint(&self, spec: &WorkloadSpec) -> u64 {
        self.iterations.unwrap_or(match self.profile {
            Profile::Quick => spec.quick_iteration_hint,
            Profile::Full => spec.default_iteration_hint,
        })
    }

    pub fn runner<'a>(&self, clock: &'a dyn Clock) -> TrialRunner<'a> {
        TrialRunner::new(clock)
            .with_seed(self.seed)
            .with_reclaim(self.reclaim)
    }
}

/// Identity and defaults of a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: &'static str,
    /// Opaque scale parameter, interpreted only by the workload.
    pub default_iteration_hint: u64,
    pub quick_iteration_hint: u64,
    /// Numeric aux fields reported as medians alongside time and throughput.
    pub median_fields: &'static [&'static str],
}

/// Internal batch count for workloads that amortise clock resolution.
pub fn effective_repetitions(iteration_hint: u64, unit_size: u64) -> u64 {
    (iteration_hint / unit_size.max(1)).max(1)
}

fn per_trial_seed(master_seed: u64, trial_index: u32) -> u64 {
    master_seed
        .wrapping_add(trial_index as u64)
        .wrapping_mul(0x517cc1b727220a95)
}

/// Per-invocation inputs handed to [`Workload::run_once`].
pub struct TrialContext<'a> {
    pub trial_index: u32,
    /// Passed through from the caller unmodified.
    pub iteration_hint: u64,
    /// Fresh for every trial, derived from the run seed and trial index.
    pub rng: ChaCha8Rng,
    clock: &'a dyn Clock,
}

impl<'a> TrialContext<'a> {
    pub fn new(trial_index: u32, iteration_hint: u64, seed: u64, clock: &'a dyn Clock) -> Self {
        Self {
            trial_index,
            iteration_hint,
            rng: ChaCha8Rng::seed_from_u64(per_trial_seed(seed, trial_index)),
            clock,
        }
    }

    pub fn clock(&self) -> &'a dyn Clock {
        self.clock
    }

    /// Run `f` and return its value with the elapsed seconds.
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> (T, f64) {
        let start = self.clock.now();
        let value = f();
        (value, self.clock.now() - start)
    }
}

/// What a workload hands back from one invocation.
#[derive(Debug, Clone, Default)]
pub struct TrialOutput {
    pub ops_done: f64,
    /// Seconds of the workload's own timed section, if it excludes setup.
    pub measured_seconds: Option<f64>,
    pub aux: Map<String, Value>,
}

impl TrialOutput {
    pub fn new(ops_done: f64) -> Self {
        Self {
            ops_done,
            ..Default::default()
        }
    }

    pub fn measured(mut self, seconds: f64) -> Self {
        self.measured_seconds = Some(seconds);
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.aux.insert(key.to_string(), value.into());
        self
    }

    fn into_metrics(self, wall_seconds: f64) -> TrialMetrics {
        let mut aux = self.aux;
        let duration_seconds = match self.measured_seconds {
            Some(measured) => {
                aux.insert("wall_time_s".to_string(), Value::from(wall_seconds));
                measured
            }
            None => wall_seconds,
        };
        if let Some(peak) = memory::peak_since_reset() {
            aux.insert("mem_peak_bytes".to_string(), Value::from(peak));
        }
        TrialMetrics {
            duration_seconds,
            ops_done: self.ops_done,
            ops_per_second: stats::throughput(self.ops_done, duration_seconds),
            aux,
        }
    }
}

/// A unit of measurable work.
///
/// `run_once` takes `&self`: anything a workload caches must be created
/// inside the call so trials stay independent. OS resources acquired during a
/// call must be released before it returns, on error paths too.
pub trait Workload {
    fn spec(&self) -> WorkloadSpec;

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> std::result::Result<TrialOutput, TrialError>;

    /// Gate checked once before any trial; `Err` carries the reason.
    fn check_preconditions(&self, _iteration_hint: u64) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Sequential repeat-and-median executor.
pub struct TrialRunner<'a> {
    clock: &'a dyn Clock,
    stop: Option<&'a AtomicBool>,
    seed: u64,
    reclaim: bool,
}

impl<'a> TrialRunner<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            stop: None,
            seed: 0,
            reclaim: true,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reclaim(mut self, reclaim: bool) -> Self {
        self.reclaim = reclaim;
        self
    }

    /// Stop after the current trial once `flag` is set; that trial is discarded.
    pub fn with_stop_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Execute `run_count` trials of `workload` and reduce them to a report.
    ///
    /// Trial failures (errors and panics) are recorded and the run goes on.
    /// Only a failed precondition escapes as an error; no trial runs then.
    pub fn run(
        &self,
        workload: &dyn Workload,
        run_count: u32,
        iteration_hint: u64,
    ) -> Result<RunReport> {
        let spec = workload.spec();

        if let Err(reason) = workload.check_preconditions(iteration_hint) {
            return Err(HarnessError::Precondition {
                workload: spec.name.to_string(),
                reason,
            });
        }

        info!(workload = spec.name, runs = run_count, iteration_hint, "starting run");

        let mut raw_trials = Vec::with_capacity(run_count as usize);
        let mut interrupted = false;

        for trial_index in 0..run_count {
            if self.stop_requested() {
                interrupted = true;
                break;
            }
            if trial_index > 0 && self.reclaim {
                sys::reclaim();
            }

            let mut ctx = TrialContext::new(trial_index, iteration_hint, self.seed, self.clock);
            memory::reset_peak();

            let start = self.clock.now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| workload.run_once(&mut ctx)));
            let wall_seconds = self.clock.now() - start;

            if self.stop_requested() {
                warn!(workload = spec.name, trial = trial_index, "interrupted, discarding trial");
                interrupted = true;
                break;
            }

            let result = match outcome {
                Ok(Ok(output)) => TrialResult::Completed(output.into_metrics(wall_seconds)),
                Ok(Err(e)) => {
                    warn!(workload = spec.name, trial = trial_index, error = %e, "trial failed");
                    TrialResult::failed(e)
                }
                Err(payload) => {
                    let e = TrialError::Panicked(panic_message(payload.as_ref()));
                    warn!(workload = spec.name, trial = trial_index, error = %e, "trial failed");
                    TrialResult::failed(e)
                }
            };
            if let Some(m) = result.metrics() {
                debug!(
                    workload = spec.name,
                    trial = trial_index,
                    time_s = m.duration_seconds,
                    ops_per_sec = m.ops_per_second,
                    "trial complete"
                );
            }
            raw_trials.push(result);
        }

        let report = assemble_report(&spec, run_count, iteration_hint, raw_trials, interrupted);
        match &report.error {
            Some(e) => warn!(workload = spec.name, error = %e, "run produced no samples"),
            None => info!(
                workload = spec.name,
                median_time_s = report.median_duration_seconds,
                median_ops_per_sec = report.median_ops_per_second,
                "run complete"
            ),
        }
        Ok(report)
    }
}

/// Reports and skips of one suite pass.
#[derive(Debug, Default)]
pub struct SuiteOutcome {
    pub reports: Vec<RunReport>,
    pub skipped: Vec<SkippedRun>,
    /// The stop flag ended the suite before every workload ran.
    pub interrupted: bool,
}

/// Run each workload in turn with `cfg`'s run count and iteration hint.
///
/// A workload whose precondition fails is listed under `skipped` and the
/// suite moves on. Once the runner's stop flag is set, no further workload
/// starts. Workloads are pulled from `workloads` lazily.
pub fn run_suite<'w, I>(
    runner: &TrialRunner<'_>,
    cfg: &BenchConfig,
    workloads: I,
) -> Result<SuiteOutcome>
where
    I: IntoIterator<Item = Box<dyn Workload + 'w>>,
{
    let mut outcome = SuiteOutcome::default();

    for workload in workloads {
        if runner.stop_requested() {
            warn!("interrupted, stopping suite");
            outcome.interrupted = true;
            break;
        }
        let spec = workload.spec();
        match runner.run(workload.as_ref(), cfg.run_count(), cfg.iteration_hint(&spec)) {
            Ok(report) => outcome.reports.push(report),
            Err(HarnessError::Precondition { workload, reason }) => {
                error!(workload = %workload, reason = %reason, "skipping workload");
                outcome.skipped.push(SkippedRun {
                    name: workload,
                    reason,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(outcome)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn assemble_report(
    spec: &WorkloadSpec,
    run_count: u32,
    iteration_hint: u64,
    raw_trials: Vec<TrialResult>,
    interrupted: bool,
) -> RunReport {
    let summary = stats::aggregate(&raw_trials);

    let medians: BTreeMap<String, f64> = spec
        .median_fields
        .iter()
        .copied()
        .chain(std::iter::once("mem_peak_bytes"))
        .filter_map(|field| {
            stats::aggregate_field(&raw_trials, field).map(|m| (field.to_string(), m))
        })
        .collect();

    let error = match summary {
        Some(_) => None,
        None if interrupted && raw_trials.is_empty() => {
            Some("interrupted before any trial completed".to_string())
        }
        None if raw_trials.is_empty() => Some("no trials were run".to_string()),
        None => Some(format!(
            "all {} trials failed; first error: {}",
            raw_trials.len(),
            raw_trials.iter().find_map(TrialResult::error).unwrap_or("unknown"),
        )),
    };

    RunReport {
        name: spec.name.to_string(),
        runs: run_count,
        iteration_hint,
        median_duration_seconds: summary.map(|s| s.median_duration_seconds),
        median_ops_per_second: summary.map(|s| s.median_ops_per_second),
        medians,
        error,
        interrupted,
        raw_trials,
    }
}
