//! Scripted board for integration tests.
//!
//! `MockBoard` implements `Platform` over a shared `BoardState`, so a test
//! keeps a handle to the state while the lifecycle owns the board.  The
//! poller replays a script of `Wait` steps; when the script runs out it
//! requests termination, so a run always ends.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use sigfox_uart::app::events::{AppEvent, Resource};
use sigfox_uart::app::ports::{EventSink, Platform, Release};
use sigfox_uart::config::SerialConfig;
use sigfox_uart::dispatch::{Interest, Poller, RawHandle, ReadyList, Token};
use sigfox_uart::error::DriverError;
use sigfox_uart::serial::SerialPort;
use sigfox_uart::termination::TerminationFlag;

pub const SERIAL_HANDLE: RawHandle = 7;

pub fn eio() -> DriverError {
    DriverError::new(DriverError::EIO)
}

/// A fresh flag per test; the lifecycle needs `'static`.
pub fn leak_flag() -> &'static TerminationFlag {
    Box::leak(Box::new(TerminationFlag::new()))
}

// ── Script ────────────────────────────────────────────────────

/// One poller wake-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    /// UART has data.
    Readable,
    /// Button poll timer fired, pin unchanged.
    Tick,
    /// Set the button pin (`true` = held low) then fire the poll timer.
    Button(bool),
    /// UART readable and timer due in the same wake-up.
    Both,
    /// The wait itself fails.
    Fail(DriverError),
    /// An external termination request arrives during the wait.
    Terminate,
}

/// Platform step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SignalHandler,
    Poller,
    Serial,
    Watch,
    Input,
    Timer,
    Output,
}

// ── Shared state ──────────────────────────────────────────────

#[derive(Default)]
pub struct BoardState {
    pub waits: VecDeque<Wait>,
    pub reads: VecDeque<Result<Vec<u8>, DriverError>>,
    /// Per-call write outcomes; an empty queue accepts everything.
    pub write_script: VecDeque<Result<usize, DriverError>>,
    pub wire: Vec<u8>,
    pub write_calls: usize,
    pub button_low: bool,
    pub button_error: Option<DriverError>,
    pub led_levels: Vec<PinState>,
    pub led_error: Option<DriverError>,
    pub fail_step: Option<Step>,
    pub fail_release: Vec<Resource>,
    pub released: Vec<Resource>,
    pub handler_installed: bool,
    pub pollers_created: usize,
    pub timer_period: Option<Duration>,
    pub watched: Option<Token>,
    pub timer: Option<Token>,
}

impl BoardState {
    pub fn led_level(&self) -> Option<PinState> {
        self.led_levels.last().copied()
    }

    fn fail(&self, step: Step) -> Result<(), DriverError> {
        if self.fail_step == Some(step) {
            Err(eio())
        } else {
            Ok(())
        }
    }

    fn release(&mut self, resource: Resource) -> Result<(), DriverError> {
        self.released.push(resource);
        if self.fail_release.contains(&resource) {
            Err(eio())
        } else {
            Ok(())
        }
    }
}

pub type Shared = Rc<RefCell<BoardState>>;

// ── Platform ──────────────────────────────────────────────────

pub struct MockBoard {
    state: Shared,
    termination: &'static TerminationFlag,
}

impl MockBoard {
    pub fn new(termination: &'static TerminationFlag) -> (Self, Shared) {
        let state = Shared::default();
        (
            Self {
                state: state.clone(),
                termination,
            },
            state,
        )
    }
}

impl Platform for MockBoard {
    type Serial = MockSerial;
    type Input = MockInput;
    type Output = MockOutput;
    type Poller = MockPoller;

    fn install_termination_handler(&mut self) -> Result<(), DriverError> {
        let mut s = self.state.borrow_mut();
        s.fail(Step::SignalHandler)?;
        s.handler_installed = true;
        Ok(())
    }

    fn create_poller(&mut self) -> Result<MockPoller, DriverError> {
        let mut s = self.state.borrow_mut();
        s.fail(Step::Poller)?;
        s.pollers_created += 1;
        Ok(MockPoller {
            state: self.state.clone(),
            termination: self.termination,
        })
    }

    fn open_serial(&mut self, _config: &SerialConfig) -> Result<MockSerial, DriverError> {
        self.state.borrow().fail(Step::Serial)?;
        Ok(MockSerial {
            state: self.state.clone(),
        })
    }

    fn open_input(&mut self, _pin: i32) -> Result<MockInput, DriverError> {
        self.state.borrow().fail(Step::Input)?;
        Ok(MockInput {
            state: self.state.clone(),
        })
    }

    fn open_output(&mut self, _pin: i32, initial: PinState) -> Result<MockOutput, DriverError> {
        let mut s = self.state.borrow_mut();
        s.fail(Step::Output)?;
        s.led_levels.push(initial);
        Ok(MockOutput {
            state: self.state.clone(),
        })
    }
}

// ── Serial ────────────────────────────────────────────────────

pub struct MockSerial {
    state: Shared,
}

impl SerialPort for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DriverError> {
        match self.state.borrow_mut().reads.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, DriverError> {
        let mut s = self.state.borrow_mut();
        s.write_calls += 1;
        let n = match s.write_script.pop_front() {
            Some(Ok(n)) => n.min(data.len()),
            Some(Err(e)) => return Err(e),
            None => data.len(),
        };
        s.wire.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn raw_handle(&self) -> RawHandle {
        SERIAL_HANDLE
    }
}

impl Release for MockSerial {
    fn release(self) -> Result<(), DriverError> {
        self.state.borrow_mut().release(Resource::Serial)
    }
}

// ── GPIO ──────────────────────────────────────────────────────

pub struct MockInput {
    state: Shared,
}

impl ErrorType for MockInput {
    type Error = DriverError;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, DriverError> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, DriverError> {
        let s = self.state.borrow();
        match s.button_error {
            Some(e) => Err(e),
            None => Ok(s.button_low),
        }
    }
}

impl Release for MockInput {
    fn release(self) -> Result<(), DriverError> {
        self.state.borrow_mut().release(Resource::Input)
    }
}

pub struct MockOutput {
    state: Shared,
}

impl ErrorType for MockOutput {
    type Error = DriverError;
}

impl MockOutput {
    fn drive(&mut self, level: PinState) -> Result<(), DriverError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = s.led_error {
            return Err(e);
        }
        s.led_levels.push(level);
        Ok(())
    }
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), DriverError> {
        self.drive(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), DriverError> {
        self.drive(PinState::High)
    }
}

impl Release for MockOutput {
    fn release(self) -> Result<(), DriverError> {
        self.state.borrow_mut().release(Resource::Output)
    }
}

// ── Poller ────────────────────────────────────────────────────

pub struct MockPoller {
    state: Shared,
    termination: &'static TerminationFlag,
}

impl Poller for MockPoller {
    fn watch(
        &mut self,
        token: Token,
        handle: RawHandle,
        _interest: Interest,
    ) -> Result<(), DriverError> {
        let mut s = self.state.borrow_mut();
        s.fail(Step::Watch)?;
        if handle != SERIAL_HANDLE {
            return Err(DriverError::new(DriverError::EBADF));
        }
        s.watched = Some(token);
        Ok(())
    }

    fn add_timer(&mut self, token: Token, period: Duration) -> Result<(), DriverError> {
        let mut s = self.state.borrow_mut();
        s.fail(Step::Timer)?;
        s.timer = Some(token);
        s.timer_period = Some(period);
        Ok(())
    }

    fn remove(&mut self, token: Token) -> Result<(), DriverError> {
        let mut s = self.state.borrow_mut();
        if s.timer == Some(token) {
            s.timer = None;
            return s.release(Resource::Timer);
        }
        if s.watched == Some(token) {
            s.watched = None;
            return Ok(());
        }
        Err(DriverError::new(DriverError::EBADF))
    }

    fn wait(&mut self, ready: &mut ReadyList) -> Result<(), DriverError> {
        let mut s = self.state.borrow_mut();
        let (serial, timer) = (s.watched, s.timer);
        let push = |ready: &mut ReadyList, token: Option<Token>| {
            if let Some(t) = token {
                let _ = ready.push(t);
            }
        };
        match s.waits.pop_front() {
            Some(Wait::Readable) => push(ready, serial),
            Some(Wait::Tick) => push(ready, timer),
            Some(Wait::Button(low)) => {
                s.button_low = low;
                push(ready, timer);
            }
            Some(Wait::Both) => {
                push(ready, serial);
                push(ready, timer);
            }
            Some(Wait::Fail(e)) => return Err(e),
            Some(Wait::Terminate) | None => self.termination.request(),
        }
        Ok(())
    }
}

impl Release for MockPoller {
    fn release(self) -> Result<(), DriverError> {
        self.state.borrow_mut().release(Resource::Dispatcher)
    }
}

// ── Event recorder ────────────────────────────────────────────

/// Sink that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
