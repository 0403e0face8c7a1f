//! Sequential write-then-read of a scratch file.
//!
//! The scratch file is a [`tempfile::NamedTempFile`], so it is removed on
//! every exit path. On success it is additionally deleted through
//! [`sys::safe_delete`] so transient deletion failures are retried and
//! reported as `cleanup_ok`.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};
use crate::stats;
use crate::sys;

const BLOCK_BYTES: usize = 1024 * 1024;
const DELETE_ATTEMPTS: u32 = 5;
const DELETE_BACKOFF: Duration = Duration::from_millis(50);

/// Write then read back `iteration_hint` MiB in `dir`.
pub struct FileIo {
    pub dir: PathBuf,
    /// Required free space as a multiple of the file size.
    pub free_space_factor: u64,
    pub free_space_probe: fn(&Path) -> Option<u64>,
}

impl FileIo {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            free_space_factor: 2,
            free_space_probe: sys::free_megabytes,
        }
    }
}

fn write_blocks(file: &mut File, block: &[u8], blocks: u64) -> io::Result<()> {
    for _ in 0..blocks {
        file.write_all(block)?;
    }
    file.flush()?;
    file.sync_all()
}

fn read_all(mut file: File) -> io::Result<u64> {
    let mut buf = vec![0u8; BLOCK_BYTES];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        total += n as u64;
    }
}

fn sha256_reader(mut file: File) -> io::Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BLOCK_BYTES];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(hasher.finalize().into());
        }
        hasher.update(&buf[..n]);
    }
}

impl Workload for FileIo {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "file_io",
            default_iteration_hint: 50,
            quick_iteration_hint: 5,
            median_fields: &["write_mbps", "read_mbps"],
        }
    }

    fn check_preconditions(&self, iteration_hint: u64) -> Result<(), String> {
        let required = iteration_hint.saturating_mul(self.free_space_factor);
        match (self.free_space_probe)(&self.dir) {
            Some(free) if free < required => Err(format!(
                "insufficient disk space in {}: need {required}MB, got {free}MB",
                self.dir.display()
            )),
            _ => Ok(()),
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let size_mb = ctx.iteration_hint.max(1);
        let block = vec![b'X'; BLOCK_BYTES];

        let mut expected = Sha256::new();
        for _ in 0..size_mb {
            expected.update(&block);
        }
        let expected: [u8; 32] = expected.finalize().into();

        let mut scratch = tempfile::Builder::new()
            .prefix("microbench-io-")
            .tempfile_in(&self.dir)?;

        let (written, write_s) = ctx.time(|| write_blocks(scratch.as_file_mut(), &block, size_mb));
        written?;

        let reader = scratch.reopen()?;
        let (read, read_s) = ctx.time(|| read_all(reader));
        let bytes_read = read?;
        if bytes_read != size_mb * BLOCK_BYTES as u64 {
            return Err(TrialError::Checksum(format!(
                "read {bytes_read} bytes, wrote {}",
                size_mb * BLOCK_BYTES as u64
            )));
        }
        if sha256_reader(scratch.reopen()?)? != expected {
            return Err(TrialError::Checksum("read-back digest differs".to_string()));
        }

        let path = scratch.into_temp_path();
        let cleanup_ok = sys::safe_delete(&path, DELETE_ATTEMPTS, DELETE_BACKOFF);
        drop(path);

        let mb = size_mb as f64;
        Ok(TrialOutput::new(2.0 * mb)
            .measured(write_s + read_s)
            .with("size_mb", size_mb)
            .with("write_time_s", write_s)
            .with("read_time_s", read_s)
            .with("write_mbps", stats::throughput(mb, write_s))
            .with("read_mbps", stats::throughput(mb, read_s))
            .with("cleanup_ok", cleanup_ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TrialRunner;
    use crate::sys::MonotonicClock;
    use crate::HarnessError;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_write_read_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let wl = FileIo::new(dir.path().to_path_buf());
        let clock = MonotonicClock::new();

        let report = TrialRunner::new(&clock).run(&wl, 2, 1).unwrap();

        assert!(!report.is_error(), "{:?}", report.error);
        assert_eq!(report.completed_trials(), 2);
        let m = report.raw_trials[0].metrics().unwrap();
        assert_eq!(m.ops_done, 2.0);
        assert_eq!(m.aux["cleanup_ok"], true);
        assert!(report.medians.contains_key("write_mbps"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_insufficient_space_aborts_before_any_trial() {
        let dir = tempdir().unwrap();
        let wl = FileIo {
            free_space_probe: |_| Some(3),
            ..FileIo::new(dir.path().to_path_buf())
        };
        let clock = MonotonicClock::new();

        let err = TrialRunner::new(&clock).run(&wl, 3, 2).unwrap_err();

        assert!(matches!(err, HarnessError::Precondition { .. }));
        assert!(err.to_string().contains("need 4MB, got 3MB"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_unknown_free_space_passes_gate() {
        let wl = FileIo {
            free_space_probe: |_| None,
            ..FileIo::new(std::env::temp_dir())
        };
        assert!(wl.check_preconditions(u64::MAX).is_ok());
    }

    #[test]
    fn test_missing_directory_fails_trials_without_residue() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let wl = FileIo {
            free_space_probe: |_| None,
            ..FileIo::new(missing.clone())
        };
        let clock = MonotonicClock::new();

        let report = TrialRunner::new(&clock).run(&wl, 2, 1).unwrap();

        assert!(report.is_error());
        assert_eq!(report.raw_trials.len(), 2);
        assert!(!missing.exists());
    }
}
