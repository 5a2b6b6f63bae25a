//! Outbound application events.
//!
//! The [`Session`](super::session::Session) and
//! [`Lifecycle`](super::lifecycle::Lifecycle) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them.

use core::fmt;

use crate::drivers::button::ButtonState;
use crate::error::{DriverError, Error};
use crate::serial::{RX_CHUNK, SendReport};

/// Resources the lifecycle acquires, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Dispatcher,
    Serial,
    Input,
    Timer,
    Output,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatcher => write!(f, "Dispatcher"),
            Self::Serial => write!(f, "Uart"),
            Self::Input => write!(f, "TriggerSendButtonGpio"),
            Self::Timer => write!(f, "ButtonPollTimer"),
            Self::Output => write!(f, "IncomingDataLedGpio"),
        }
    }
}

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// All peripherals are open and registered.
    Started,

    /// The button changed state.
    ButtonChanged(ButtonState),

    /// The fixed command went out in full.
    MessageSent(SendReport),

    /// A non-empty chunk arrived on the UART.
    BytesReceived {
        data: heapless::Vec<u8, RX_CHUNK>,
        total: u64,
    },

    /// A fatal error; the run is ending.
    Fault(Error),

    /// A resource could not be released cleanly during shutdown.
    ReleaseFailed {
        resource: Resource,
        error: DriverError,
    },

    /// Shutdown finished.
    Stopped,
}
