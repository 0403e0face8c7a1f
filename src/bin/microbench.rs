use clap::{Parser, Subcommand, ValueEnum};
use microbench_harness::harness::{run_suite, BenchConfig, Profile, Workload};
use microbench_harness::memory::TrackingAllocator;
use microbench_harness::schema::{RunMeta, SuiteReport};
use microbench_harness::sys::MonotonicClock;
use microbench_harness::{interrupt, workloads, HarnessError, WorkloadKind};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List workloads with their default iteration hints.
    List,

    /// Run one workload and emit its run report.
    Run {
        #[arg(value_enum)]
        workload: WorkloadKind,
    },

    /// Run every workload (or a selection) and emit a suite report.
    Suite {
        /// Restrict the suite to these workloads. Can be provided multiple times.
        #[arg(long, value_enum, num_args = 1.., action = clap::ArgAction::Append)]
        only: Vec<WorkloadKind>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "microbench")]
#[command(about = "Repeat-and-median micro-benchmark runner (JSON output)")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Quick, global = true)]
    profile: ProfileArg,

    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Trials per workload. Defaults to 3 (quick) or 5 (full).
    #[arg(long, global = true)]
    runs: Option<u32>,

    /// Iteration hint passed to every selected workload, overriding its default.
    #[arg(long, global = true)]
    iterations: Option<u64>,

    /// Skip the allocator trim between trials.
    #[arg(long, default_value_t = false, global = true)]
    no_reclaim: bool,

    /// Directory for scratch files of I/O workloads. Defaults to the system temp dir.
    #[arg(long, value_name = "DIR", global = true)]
    scratch_dir: Option<PathBuf>,

    /// Where to write the JSON report. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Debug-level logging on stderr.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "microbench=debug,microbench_harness=debug"
    } else {
        "microbench=info,microbench_harness=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn now_utc_unix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    // Best-effort: read from environment set by CI/build scripts.
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn emit<T: Serialize>(value: &T, out: Option<&PathBuf>) -> Result<(), HarnessError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(out) = out {
        fs::write(out, &json)?;
        info!(path = %out.display(), "report written");
    }
    println!("{json}");
    Ok(())
}

fn main() -> Result<(), HarnessError> {
    let args = Args::parse();
    init_logging(args.verbose);
    interrupt::install_handlers();

    let cfg = BenchConfig {
        profile: args.profile.into(),
        seed: args.seed,
        runs: args.runs,
        iterations: args.iterations,
        reclaim: !args.no_reclaim,
    };
    let scratch_dir = args.scratch_dir.clone().unwrap_or_else(std::env::temp_dir);

    let clock = MonotonicClock::new();
    let runner = cfg.runner(&clock).with_stop_flag(interrupt::flag());

    match &args.cmd {
        Command::List => {
            for &kind in WorkloadKind::all() {
                let spec = workloads::build(kind, scratch_dir.clone()).spec();
                println!(
                    "{:<22} full={:<10} quick={}",
                    spec.name, spec.default_iteration_hint, spec.quick_iteration_hint
                );
            }
        }
        Command::Run { workload } => {
            let workload = workloads::build(*workload, scratch_dir);
            let spec = workload.spec();
            let report = runner.run(workload.as_ref(), cfg.run_count(), cfg.iteration_hint(&spec))?;
            emit(&report, args.out.as_ref())?;
        }
        Command::Suite { only } => {
            let kinds: Vec<WorkloadKind> = if only.is_empty() {
                WorkloadKind::all().to_vec()
            } else {
                only.clone()
            };

            let outcome = run_suite(
                &runner,
                &cfg,
                kinds
                    .into_iter()
                    .map(|kind| workloads::build(kind, scratch_dir.clone())),
            )?;

            let report = SuiteReport {
                run: RunMeta {
                    schema_version: 1,
                    harness_version: env!("CARGO_PKG_VERSION").to_string(),
                    profile: cfg.profile.as_str().to_string(),
                    seed: cfg.seed,
                    timestamp_utc: now_utc_unix(),
                    git_sha: git_sha_short(),
                },
                reports: outcome.reports,
                skipped: outcome.skipped,
            };
            emit(&report, args.out.as_ref())?;
        }
    }

    Ok(())
}
