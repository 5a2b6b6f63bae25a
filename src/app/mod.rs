//! Application core: event handling and lifecycle, zero direct I/O.
//!
//! All interaction with hardware happens through the **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod events;
pub mod lifecycle;
pub mod ports;
pub mod session;
