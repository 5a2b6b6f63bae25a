//! GPIO / peripheral assignments for the ESP32-S3 dev board.
//!
//! Single source of truth: the default [`ControllerConfig`](crate::config::ControllerConfig)
//! is built from these values rather than hard-coding pin numbers.

/// GPIOs on the ESP32-S3 are numbered 0..=48.
pub const GPIO_COUNT: i32 = 49;

// ---------------------------------------------------------------------------
// UART to the Sigfox modem
// ---------------------------------------------------------------------------

/// UART controller wired to the modem header.
pub const MODEM_UART_PORT: i32 = 1;
/// ESP32 TX → modem RX.
pub const MODEM_UART_TX_GPIO: i32 = 17;
/// Modem TX → ESP32 RX.
pub const MODEM_UART_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// User I/O
// ---------------------------------------------------------------------------

/// Momentary push button, active-low with internal pull-up.
/// LOW = pressed, HIGH = released.
pub const BUTTON_GPIO: i32 = 0;

/// Receive-activity LED, active-low (sinks current when the pin is LOW).
pub const LED_GPIO: i32 = 2;
