//! Sigfox UART trigger firmware library.
//!
//! Exposes the controller core for integration testing.  All ESP-IDF
//! specific code is guarded by `#[cfg(target_os = "espidf")]` inside
//! [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod serial;
pub mod termination;
