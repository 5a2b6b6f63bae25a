//! Sigfox UART trigger main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                     │
//! │                                                           │
//! │   EspPlatform                        LogEventSink         │
//! │   (UART · GPIO · poller · SIGTERM)   (EventSink)          │
//! │                                                           │
//! │   ─────────────── Port Trait Boundary ────────────────    │
//! │                                                           │
//! │   ┌───────────────────────────────────────────────────┐   │
//! │   │  Lifecycle ─▶ Dispatcher ─▶ Session handlers      │   │
//! │   │  (init · run · shutdown)    (button · RX · LED)   │   │
//! │   └───────────────────────────────────────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Pressing the button sends the Sigfox AT command to the modem; every
//! chunk the modem sends back is logged and toggles the LED by byte parity.

use anyhow::Result;
use log::info;

use sigfox_uart::adapters::esp::EspPlatform;
use sigfox_uart::adapters::log_sink::LogEventSink;
use sigfox_uart::app::lifecycle::Lifecycle;
use sigfox_uart::config::ControllerConfig;
use sigfox_uart::termination::TERMINATION;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Sigfox UART trigger v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Run until terminated ───────────────────────────────
    let mut lifecycle = Lifecycle::new(
        EspPlatform::new(),
        ControllerConfig::default(),
        &TERMINATION,
        LogEventSink::new(),
    );
    lifecycle.execute()?;
    Ok(())
}
