//! Process-wide interruption flag.
//!
//! On Unix, SIGINT and SIGTERM set [`INTERRUPTED`] instead of killing the
//! process, so the trial in flight can unwind its scoped resources and the
//! runner can return a partial report. On non-Unix no handler is installed.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the signal handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// The flag to hand to [`crate::TrialRunner::with_stop_flag`].
pub fn flag() -> &'static AtomicBool {
    &INTERRUPTED
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Install SIGINT/SIGTERM handlers that only set the flag.
#[cfg(unix)]
pub fn install_handlers() {
    // SAFETY: the handler is async-signal-safe (a single atomic store).
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_signal as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn on_signal(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

#[cfg(not(unix))]
pub fn install_handlers() {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_sigint_sets_flag_instead_of_exiting() {
        install_handlers();
        // SAFETY: the installed handler only stores to an atomic.
        let rc = unsafe { libc::raise(libc::SIGINT) };

        assert_eq!(rc, 0);
        assert!(interrupted());
        assert!(flag().load(Ordering::SeqCst));
    }
}
