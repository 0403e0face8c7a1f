//! Host collaborators: monotonic clock, allocator trim, free-space probe and
//! retrying file deletion.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Monotonic time source in seconds.
///
/// Successive calls within a process never decrease.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// [`Clock`] backed by [`Instant`], measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Best-effort hint to hand freed heap pages back to the OS between trials.
pub fn reclaim() {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        // SAFETY: malloc_trim only inspects allocator-internal state.
        let released = unsafe { libc::malloc_trim(0) };
        debug!(released, "malloc_trim");
    }
}

/// Free space available to unprivileged users on the filesystem holding `path`.
///
/// `None` when the platform offers no probe or the call fails.
#[cfg(unix)]
pub fn free_megabytes(path: &Path) -> Option<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    // SAFETY: statvfs is plain old data and the path is NUL-terminated.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }

    #[allow(clippy::unnecessary_cast)]
    let bytes = (stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64);
    Some(bytes / (1024 * 1024))
}

#[cfg(not(unix))]
pub fn free_megabytes(_path: &Path) -> Option<u64> {
    None
}

/// Remove `path`, retrying up to `attempts` times with `backoff` between tries.
///
/// A missing file counts as deleted. Returns `false` once retries are exhausted.
pub fn safe_delete(path: &Path, attempts: u32, backoff: Duration) -> bool {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match fs::remove_file(path) {
            Ok(()) => return true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) => {
                warn!(path = %path.display(), attempt, error = %e, "delete failed");
                if attempt < attempts {
                    thread::sleep(backoff);
                }
            }
        }
    }
    false
}
