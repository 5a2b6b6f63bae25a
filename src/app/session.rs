//! Per-run context shared by every event handler.
//!
//! [`Session`] owns the opened peripherals, the receive counter, the event
//! sink and a reference to the termination flag.  The dispatcher hands it to
//! handlers as `&mut Session`, so there is no hidden global state: a test
//! can build a session over fake peripherals and call the handlers directly.
//!
//! Peripherals are `Option`s because initialization fills them in one at a
//! time and shutdown takes them out one at a time.

use log::info;

use crate::drivers::button::{ButtonPoller, ButtonState};
use crate::drivers::indicator::Indicator;
use crate::error::Error;
use crate::serial::{self, RX_CHUNK, SerialReceiver};
use crate::termination::TerminationFlag;

use super::events::AppEvent;
use super::ports::{EventSink, Platform};

pub struct Session<P: Platform, K: EventSink> {
    pub(crate) serial: Option<P::Serial>,
    pub(crate) button: Option<ButtonPoller<P::Input>>,
    pub(crate) indicator: Option<Indicator<P::Output>>,
    receiver: SerialReceiver,
    command: Vec<u8>,
    termination: &'static TerminationFlag,
    first_fault: Option<Error>,
    sink: K,
}

impl<P: Platform, K: EventSink> Session<P, K> {
    pub fn new(command: &[u8], termination: &'static TerminationFlag, sink: K) -> Self {
        Self {
            serial: None,
            button: None,
            indicator: None,
            receiver: SerialReceiver::new(),
            command: command.to_vec(),
            termination,
            first_fault: None,
            sink,
        }
    }

    // ── Handlers ──────────────────────────────────────────────

    /// Poll-timer tick: sample the button and send the command on a press.
    pub fn on_button_tick(&mut self) {
        let Some(button) = self.button.as_mut() else {
            return;
        };
        match button.poll() {
            Ok(None) => {}
            Ok(Some(state)) => {
                self.sink.emit(&AppEvent::ButtonChanged(state));
                if state == ButtonState::Asserted {
                    self.send_command();
                }
            }
            Err(e) => self.fail(e),
        }
    }

    /// Serial readable: take one chunk and update the LED parity.
    pub fn on_serial_readable(&mut self) {
        let Some(port) = self.serial.as_mut() else {
            return;
        };
        let mut buf = [0u8; RX_CHUNK];
        let n = match self.receiver.receive(port, &mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => return self.fail(e),
        };

        let total = self.receiver.total();
        let mut data = heapless::Vec::new();
        // `n <= RX_CHUNK`, so this always fits.
        let _ = data.extend_from_slice(&buf[..n]);
        self.sink.emit(&AppEvent::BytesReceived { data, total });

        if let Some(led) = self.indicator.as_mut() {
            if let Err(e) = led.set_from_count(total) {
                self.fail(e);
            }
        }
    }

    /// Write the configured command out in full.
    pub fn send_command(&mut self) {
        let Some(port) = self.serial.as_mut() else {
            return;
        };
        match serial::send_message(port, &self.command) {
            Ok(report) => self.sink.emit(&AppEvent::MessageSent(report)),
            Err(e) => self.fail(e),
        }
    }

    // ── Faults ────────────────────────────────────────────────

    /// Report a fatal error through the sink and request termination.
    pub fn fail(&mut self, e: Error) {
        self.sink.emit(&AppEvent::Fault(e));
        self.first_fault.get_or_insert(e);
        self.termination.request();
    }

    // ── Accessors ─────────────────────────────────────────────

    /// Total bytes received this run.
    pub fn bytes_received(&self) -> u64 {
        self.receiver.total()
    }

    /// The first fatal error of the run, if any.
    pub fn first_fault(&self) -> Option<Error> {
        self.first_fault
    }

    pub fn termination(&self) -> &'static TerminationFlag {
        self.termination
    }

    pub fn button_state(&self) -> Option<ButtonState> {
        self.button.as_ref().map(ButtonPoller::state)
    }

    pub fn indicator_active(&self) -> Option<bool> {
        self.indicator.as_ref().map(Indicator::is_active)
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub(crate) fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub(crate) fn log_started(&mut self) {
        info!("Peripherals open; entering event loop.");
        self.sink.emit(&AppEvent::Started);
    }
}
