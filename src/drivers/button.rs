//! Polled push-button driver with edge detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up: LOW = pressed.  The pin is
//! sampled on every poll-timer tick (1 ms) and compared with the previous
//! sample; a change is reported once as an edge.
//!
//! There is no debounce.  A bouncing contact can produce several edges
//! within a few ticks, each of which is reported.

use embedded_hal::digital::InputPin;

use crate::error::{DriverError, IoError, Result};

/// Logical button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Pressed (pin LOW).
    Asserted,
    /// Not pressed (pin HIGH).
    Released,
}

pub struct ButtonPoller<I> {
    pin: I,
    state: ButtonState,
}

impl<I: InputPin<Error = DriverError>> ButtonPoller<I> {
    /// Starts out `Released`: the first sample that reads LOW is an edge.
    pub fn new(pin: I) -> Self {
        Self {
            pin,
            state: ButtonState::Released,
        }
    }

    /// Sample the pin.  Returns the new state if it differs from the last
    /// sample, `None` otherwise.
    pub fn poll(&mut self) -> Result<Option<ButtonState>> {
        let pressed = self.pin.is_low().map_err(IoError::InputRead)?;
        let new_state = if pressed {
            ButtonState::Asserted
        } else {
            ButtonState::Released
        };

        if new_state == self.state {
            return Ok(None);
        }
        self.state = new_state;
        Ok(Some(new_state))
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Give the pin back (for release at shutdown).
    pub fn into_pin(self) -> I {
        self.pin
    }
}
