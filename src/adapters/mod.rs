//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements | Connects to                      |
//! |------------|------------|----------------------------------|
//! | `esp`      | Platform   | ESP-IDF UART, GPIO, RTOS ticks   |
//! | `log_sink` | EventSink  | Serial log output                |

#[cfg(target_os = "espidf")]
pub mod esp;
pub mod log_sink;
