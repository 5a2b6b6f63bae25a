//! Unified error types for the controller.
//!
//! A single `Error` enum that every component converts into, so the
//! lifecycle's fault handling stays uniform.  All variants are `Copy` so they
//! can be handed to the event sink and stored as the run's first fault
//! without allocation.

use core::fmt;

use embedded_hal::digital::ErrorKind;

// ---------------------------------------------------------------------------
// Driver error (what the peripheral ports report)
// ---------------------------------------------------------------------------

/// Failure reported by a peripheral driver or the readiness primitive.
///
/// `code` is an errno-style value (or an `esp_err_t` on the device).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverError {
    pub code: i32,
}

impl DriverError {
    /// I/O error.
    pub const EIO: i32 = 5;
    /// Bad handle.
    pub const EBADF: i32 = 9;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// No space left (registration table full).
    pub const ENOSPC: i32 = 28;

    pub const fn new(code: i32) -> Self {
        Self { code }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver error (rc={})", self.code)
    }
}

impl std::error::Error for DriverError {}

impl embedded_hal::digital::Error for DriverError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
/// Any of them ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A peripheral could not be opened or registered.
    Init(InitError),
    /// A read/write/get/set on an open peripheral failed.
    Io(IoError),
    /// The readiness wait itself failed.
    Wait(DriverError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Wait(e) => write!(f, "wait: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Initialization errors
// ---------------------------------------------------------------------------

/// Which initialization step failed, with the driver's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    SignalHandler(DriverError),
    Poller(DriverError),
    SerialOpen(DriverError),
    SerialRegister(DriverError),
    InputOpen(DriverError),
    TimerCreate(DriverError),
    OutputOpen(DriverError),
    /// `initialize` was called again, or after shutdown.
    AlreadyInitialized,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignalHandler(e) => write!(f, "termination handler install failed: {e}"),
            Self::Poller(e) => write!(f, "poller create failed: {e}"),
            Self::SerialOpen(e) => write!(f, "could not open UART: {e}"),
            Self::SerialRegister(e) => write!(f, "could not register UART event: {e}"),
            Self::InputOpen(e) => write!(f, "could not open button GPIO: {e}"),
            Self::TimerCreate(e) => write!(f, "could not create button poll timer: {e}"),
            Self::OutputOpen(e) => write!(f, "could not open LED GPIO: {e}"),
            Self::AlreadyInitialized => write!(f, "peripherals already acquired once"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Runtime I/O errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// UART read failed.
    SerialRead(DriverError),
    /// UART write failed; `sent` bytes had already gone out.
    SerialWrite { error: DriverError, sent: usize },
    /// Button GPIO read failed.
    InputRead(DriverError),
    /// LED GPIO set failed.
    OutputWrite(DriverError),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialRead(e) => write!(f, "could not read UART: {e}"),
            Self::SerialWrite { error, sent } => {
                write!(f, "could not write to UART after {sent} bytes: {error}")
            }
            Self::InputRead(e) => write!(f, "could not read button GPIO: {e}"),
            Self::OutputWrite(e) => write!(f, "could not set LED output value: {e}"),
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
