//! Port traits: the boundary between the controller core and the board.
//!
//! ```text
//!   Platform adapter ──▶ Port traits ──▶ Lifecycle / Session (core)
//! ```
//!
//! The board adapter implements [`Platform`] and hands out peripheral
//! handles; the core only ever talks to them through [`SerialPort`],
//! `embedded_hal` digital pins and [`Poller`].  Tests substitute a scripted
//! board without touching any of the core.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::config::SerialConfig;
use crate::dispatch::Poller;
use crate::error::DriverError;
use crate::serial::SerialPort;

// ───────────────────────────────────────────────────────────────
// Release
// ───────────────────────────────────────────────────────────────

/// A handle that must be explicitly given back to the platform.
///
/// Release consumes the handle, so it can happen at most once; an error
/// means the platform could not close it cleanly, not that it is still open.
pub trait Release {
    fn release(self) -> Result<(), DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Platform (driven adapter: core → board)
// ───────────────────────────────────────────────────────────────

/// Factory for every peripheral the controller uses.
pub trait Platform: 'static {
    type Serial: SerialPort + Release + 'static;
    type Input: InputPin<Error = DriverError> + Release + 'static;
    type Output: OutputPin<Error = DriverError> + Release + 'static;
    type Poller: Poller + 'static;

    /// Route the platform's termination signal to
    /// [`on_termination_signal`](crate::termination::on_termination_signal).
    fn install_termination_handler(&mut self) -> Result<(), DriverError>;

    /// Create the readiness-notification primitive.
    fn create_poller(&mut self) -> Result<Self::Poller, DriverError>;

    /// Open and configure the UART.
    fn open_serial(&mut self, config: &SerialConfig) -> Result<Self::Serial, DriverError>;

    /// Open a GPIO as input.
    fn open_input(&mut self, pin: i32) -> Result<Self::Input, DriverError>;

    /// Open a GPIO as push-pull output, driven to `initial`.
    fn open_output(&mut self, pin: i32, initial: PinState) -> Result<Self::Output, DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → diagnostics)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, ...).
pub trait EventSink: 'static {
    fn emit(&mut self, event: &super::events::AppEvent);
}
