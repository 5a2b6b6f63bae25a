//! Lifecycle controller: acquire, run and release.
//!
//! ```text
//!  initialize()                    run()                   shutdown()
//!  ─────────────                   ─────                   ──────────
//!  termination handler             loop {                  LED → inactive
//!  dispatcher (poller)               wait_and_dispatch     release LED GPIO
//!  UART + readable source          } until flag / error    release poll timer
//!  button GPIO + 1 ms timer                                release button GPIO
//!  LED GPIO (inactive)                                     release UART
//!                                                          release dispatcher
//! ```
//!
//! Initialization is fail-fast: the first failing step stops it, and
//! whatever was acquired before stays owned until shutdown.  Shutdown is
//! best-effort: every release is attempted, failures are reported but never
//! propagated, and nothing is released twice.  Dropping a `Lifecycle` runs
//! shutdown if it has not run yet.

use log::{info, warn};

use crate::config::ControllerConfig;
use crate::dispatch::{Dispatcher, Interest, Token};
use crate::drivers::button::ButtonPoller;
use crate::drivers::indicator::{Indicator, Polarity};
use crate::error::{DriverError, Error, InitError, Result};
use crate::serial::SerialPort;
use crate::termination::TerminationFlag;

use super::events::{AppEvent, Resource};
use super::ports::{EventSink, Platform, Release};
use super::session::Session;

type SessionDispatcher<P, K> = Dispatcher<Session<P, K>, <P as Platform>::Poller>;

pub struct Lifecycle<P: Platform, K: EventSink> {
    platform: P,
    config: ControllerConfig,
    dispatcher: Option<SessionDispatcher<P, K>>,
    timer: Option<Token>,
    session: Session<P, K>,
    shut_down: bool,
}

impl<P: Platform, K: EventSink> Lifecycle<P, K> {
    pub fn new(
        platform: P,
        config: ControllerConfig,
        termination: &'static TerminationFlag,
        sink: K,
    ) -> Self {
        let session = Session::new(config.command.as_bytes(), termination, sink);
        Self {
            platform,
            config,
            dispatcher: None,
            timer: None,
            session,
            shut_down: false,
        }
    }

    /// Initialize, run until terminated, then shut down.
    ///
    /// Returns the first fatal error of the run, or `Ok(())` when the run
    /// ended on an external termination request.
    pub fn execute(&mut self) -> Result<()> {
        info!("UART application starting.");
        if self.initialize().is_ok() {
            self.run();
        }
        self.shutdown();
        info!("Application exiting.");

        match self.session.first_fault() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ── Initialize ────────────────────────────────────────────

    /// Acquire and register every peripheral, in order.  Stops at the first
    /// failure; the error has already been reported to the sink.
    ///
    /// Acquisition happens at most once per `Lifecycle`: a second call, or a
    /// call after shutdown, returns `AlreadyInitialized` and touches nothing.
    pub fn initialize(&mut self) -> Result<()> {
        if self.dispatcher.is_some() || self.shut_down {
            return Err(InitError::AlreadyInitialized.into());
        }
        let result = self.try_initialize();
        match result {
            Ok(()) => self.session.log_started(),
            Err(e) => self.session.fail(e),
        }
        result
    }

    fn try_initialize(&mut self) -> Result<()> {
        self.config.validate()?;

        self.platform
            .install_termination_handler()
            .map_err(InitError::SignalHandler)?;

        let poller = self.platform.create_poller().map_err(InitError::Poller)?;
        let dispatcher = self.dispatcher.insert(Dispatcher::new(poller));

        // UART + readable event
        let serial = self
            .platform
            .open_serial(&self.config.serial)
            .map_err(InitError::SerialOpen)?;
        let handle = serial.raw_handle();
        self.session.serial = Some(serial);
        dispatcher
            .register_io(handle, Interest::Readable, Session::on_serial_readable)
            .map_err(InitError::SerialRegister)?;

        // Button GPIO + poll timer
        info!("Opening button GPIO {} as input.", self.config.button_pin);
        let input = self
            .platform
            .open_input(self.config.button_pin)
            .map_err(InitError::InputOpen)?;
        self.session.button = Some(ButtonPoller::new(input));
        let timer = dispatcher
            .register_timer(self.config.button_poll_period(), Session::on_button_tick)
            .map_err(InitError::TimerCreate)?;
        self.timer = Some(timer);

        // LED GPIO, off
        info!("Opening LED GPIO {}.", self.config.led_pin);
        let polarity = if self.config.led_active_low {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        };
        let output = self
            .platform
            .open_output(self.config.led_pin, polarity.level(false))
            .map_err(InitError::OutputOpen)?;
        self.session.indicator = Some(Indicator::new(output, polarity));

        Ok(())
    }

    // ── Run ───────────────────────────────────────────────────

    /// Dispatch until the termination flag is set or the wait fails.
    /// Returns the number of completed dispatch cycles.
    pub fn run(&mut self) -> u64 {
        let mut cycles = 0;
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            self.session.termination().request();
            return cycles;
        };

        while !self.session.termination().is_requested() {
            match dispatcher.wait_and_dispatch(&mut self.session) {
                Ok(_) => cycles += 1,
                Err(e) => self.session.fail(Error::Wait(e)),
            }
        }
        cycles
    }

    // ── Shutdown ──────────────────────────────────────────────

    /// Leave the LED off and release everything in reverse acquisition
    /// order.  Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(mut indicator) = self.session.indicator.take() {
            if let Err(e) = indicator.set_active(false) {
                warn!("Could not turn LED off: {}", e);
            }
            self.release(Resource::Output, indicator.into_pin().release());
        }

        info!("Closing file descriptors.");
        if let Some(token) = self.timer.take() {
            let result = match self.dispatcher.as_mut() {
                Some(d) => d.deregister(token),
                None => Err(DriverError::new(DriverError::EBADF)),
            };
            self.release(Resource::Timer, result);
        }
        if let Some(button) = self.session.button.take() {
            self.release(Resource::Input, button.into_pin().release());
        }
        if let Some(serial) = self.session.serial.take() {
            self.release(Resource::Serial, serial.release());
        }
        if let Some(dispatcher) = self.dispatcher.take() {
            self.release(Resource::Dispatcher, dispatcher.release());
        }
        self.session.sink_mut().emit(&AppEvent::Stopped);
    }

    fn release(&mut self, resource: Resource, result: core::result::Result<(), DriverError>) {
        if let Err(error) = result {
            self.session
                .sink_mut()
                .emit(&AppEvent::ReleaseFailed { resource, error });
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn session(&self) -> &Session<P, K> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<P, K> {
        &mut self.session
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Live dispatcher registrations (0 before init and after shutdown).
    pub fn registered_sources(&self) -> usize {
        self.dispatcher.as_ref().map_or(0, Dispatcher::len)
    }
}

impl<P: Platform, K: EventSink> Drop for Lifecycle<P, K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
