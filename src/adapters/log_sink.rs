//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (which goes to UART0 / USB-CDC on the device).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | peripherals ready"),
            AppEvent::ButtonChanged(state) => info!("BUTTON | {:?}", state),
            AppEvent::MessageSent(report) => {
                info!("TX | {} bytes in {} calls", report.bytes, report.writes);
            }
            AppEvent::BytesReceived { data, total } => {
                info!(
                    "RX | UART received {} bytes: '{}' (total={})",
                    data.len(),
                    String::from_utf8_lossy(data),
                    total,
                );
            }
            AppEvent::Fault(e) => error!("ERROR: {}", e),
            AppEvent::ReleaseFailed { resource, error } => {
                warn!("ERROR: Could not close {}: {}", resource, error);
            }
            AppEvent::Stopped => info!("STOP | all resources released"),
        }
    }
}
