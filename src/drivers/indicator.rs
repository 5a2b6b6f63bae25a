//! Receive-activity LED.
//!
//! Shows the parity of the running received-byte count: lit when the total
//! is odd, dark when it is even.
//!
//! ## Polarity
//!
//! The reference board sinks the LED current, so "lit" means driving the pin
//! LOW.  [`Polarity`] maps logical on/off to pin levels.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::{DriverError, IoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Pin level for the given logical state.
    pub fn level(self, active: bool) -> PinState {
        match (self, active) {
            (Self::ActiveHigh, true) | (Self::ActiveLow, false) => PinState::High,
            (Self::ActiveHigh, false) | (Self::ActiveLow, true) => PinState::Low,
        }
    }
}

pub struct Indicator<O> {
    pin: O,
    polarity: Polarity,
    active: bool,
}

impl<O: OutputPin<Error = DriverError>> Indicator<O> {
    /// Wrap a pin that the platform already drove to the inactive level.
    pub fn new(pin: O, polarity: Polarity) -> Self {
        Self {
            pin,
            polarity,
            active: false,
        }
    }

    /// Active iff `count` is odd.
    pub fn set_from_count(&mut self, count: u64) -> Result<()> {
        self.set_active(count % 2 == 1)
    }

    pub fn set_active(&mut self, active: bool) -> Result<()> {
        self.pin
            .set_state(self.polarity.level(active))
            .map_err(IoError::OutputWrite)?;
        self.active = active;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Give the pin back (for release at shutdown).
    pub fn into_pin(self) -> O {
        self.pin
    }
}
