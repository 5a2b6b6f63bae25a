//! Controller configuration parameters
//!
//! Everything the lifecycle needs to open and wire the peripherals.
//! Defaults match the reference board; a JSON document can override them.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Sigfox modem command sent on every button press: reset the modem, then
/// send one uplink frame with a fixed payload.
pub const DEFAULT_COMMAND: &str = "AT$RC\n\rAT$SF=692665535048455245\n\r";

/// Upper bound on the command length.  `send_message` busy-retries inside a
/// single handler, so the payload must stay small.
pub const MAX_COMMAND_LEN: usize = 64;

/// UART flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    None,
    RtsCts,
}

/// UART parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// UART controller number.
    pub port: i32,
    pub baud_rate: u32,
    pub flow_control: FlowControl,
    pub tx_pin: i32,
    pub rx_pin: i32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: pins::MODEM_UART_PORT,
            baud_rate: 9600,
            flow_control: FlowControl::None,
            tx_pin: pins::MODEM_UART_TX_GPIO,
            rx_pin: pins::MODEM_UART_RX_GPIO,
        }
    }
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Serial ---
    pub serial: SerialConfig,

    // --- Button ---
    /// Button input GPIO (active-low)
    pub button_pin: i32,
    /// Button sampling period (microseconds)
    pub button_poll_interval_us: u32,

    // --- LED ---
    /// LED output GPIO
    pub led_pin: i32,
    /// LED lights when the pin is driven LOW
    pub led_active_low: bool,

    // --- Protocol ---
    /// Literal sent on each button press
    pub command: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            button_pin: pins::BUTTON_GPIO,
            button_poll_interval_us: 1_000, // 1 ms
            led_pin: pins::LED_GPIO,
            led_active_low: true,
            command: DEFAULT_COMMAND.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("baud_rate must be non-zero"));
        }
        if self.button_poll_interval_us == 0 {
            return Err(Error::Config("button_poll_interval_us must be non-zero"));
        }
        let gpios = [
            self.serial.tx_pin,
            self.serial.rx_pin,
            self.button_pin,
            self.led_pin,
        ];
        if gpios.iter().any(|pin| !(0..pins::GPIO_COUNT).contains(pin)) {
            return Err(Error::Config("GPIO number out of range"));
        }
        if self.command.is_empty() {
            return Err(Error::Config("command must not be empty"));
        }
        if self.command.len() > MAX_COMMAND_LEN {
            return Err(Error::Config("command exceeds MAX_COMMAND_LEN"));
        }
        Ok(())
    }

    pub fn button_poll_period(&self) -> Duration {
        Duration::from_micros(u64::from(self.button_poll_interval_us))
    }
}
