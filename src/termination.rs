//! Cooperative termination flag.
//!
//! Set by fatal handlers and by the asynchronous termination signal; read by
//! the main loop once per dispatch cycle.  It cannot be cleared: once a run
//! is ending it stays ending.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::DriverError;

pub struct TerminationFlag(AtomicBool);

impl TerminationFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Request termination.  A single atomic store, so this is safe to call
    /// from a signal handler.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for TerminationFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide flag the signal handler writes to.
pub static TERMINATION: TerminationFlag = TerminationFlag::new();

/// Signal handler body.  Register this for SIGTERM.
/// Touches nothing but [`TERMINATION`].
pub extern "C" fn on_termination_signal(_signal: i32) {
    TERMINATION.request();
}

/// newlib's `SIG_ERR`: the handler address `-1`.
pub const SIG_ERR: usize = usize::MAX;

/// Check the previous-handler address `signal()` returned when installing
/// [`on_termination_signal`].
pub fn check_signal_install(previous: usize) -> Result<(), DriverError> {
    if previous == SIG_ERR {
        Err(DriverError::new(DriverError::EINVAL))
    } else {
        Ok(())
    }
}
