//! Readiness-driven event dispatcher.
//!
//! Event sources are registered with a handler closure.  The dispatcher
//! blocks in the [`Poller`] until one or more sources are ready, then runs
//! each ready source's handler against the caller's context.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ UART rx     │────▶│              │     │ registration     │
//! │ Poll timer  │────▶│    Poller    │────▶│ table: token →   │──▶ handler(&mut ctx)
//! │ ...         │────▶│   (wait)     │     │ handler          │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//! ```
//!
//! Handlers run sequentially on the calling thread; none is re-entered and
//! none runs twice for a single [`Dispatcher::wait_and_dispatch`] call.

use core::fmt;
use core::time::Duration;
use std::time::Instant;

use log::debug;

use crate::app::ports::Release;
use crate::error::DriverError;

/// Maximum number of live event sources.
pub const MAX_SOURCES: usize = 8;

/// Platform handle for an I/O source (file descriptor, UART port number...).
pub type RawHandle = i32;

/// Identity of a registered source.  Never reused within a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub u32);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a source is watched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Readable,
}

/// Tokens reported ready by one wait.
pub type ReadyList = heapless::Vec<Token, MAX_SOURCES>;

// ───────────────────────────────────────────────────────────────
// Poller port
// ───────────────────────────────────────────────────────────────

/// Readiness-notification primitive (epoll-like).
///
/// Timers are delivered through the same mechanism as I/O handles: a timer
/// token is reported ready once per elapsed period.
pub trait Poller: Release {
    /// Start watching `handle`; report it as `token` when ready.
    fn watch(
        &mut self,
        token: Token,
        handle: RawHandle,
        interest: Interest,
    ) -> Result<(), DriverError>;

    /// Create a periodic timer reported as `token`.
    fn add_timer(&mut self, token: Token, period: Duration) -> Result<(), DriverError>;

    /// Stop watching a handle, or destroy a timer.
    fn remove(&mut self, token: Token) -> Result<(), DriverError>;

    /// Block until at least one source is ready and append its token(s).
    fn wait(&mut self, ready: &mut ReadyList) -> Result<(), DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Interval timer bookkeeping (shared by poller implementations)
// ───────────────────────────────────────────────────────────────

/// Fixed-period deadline tracker.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    period: Duration,
    next: Instant,
}

impl IntervalTimer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left until the next expiry (zero if already due).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Consume every expiry up to `now`; returns how many periods elapsed.
    /// Missed periods collapse into one readiness report.
    pub fn expire(&mut self, now: Instant) -> u32 {
        let mut expirations = 0;
        while self.next <= now {
            self.next += self.period;
            expirations += 1;
        }
        expirations
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatcher
// ───────────────────────────────────────────────────────────────

/// What kind of source a registration refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Io {
        handle: RawHandle,
        interest: Interest,
    },
    Timer { period: Duration },
}

/// Handler invoked with the caller's context when its source is ready.
pub type Handler<C> = Box<dyn FnMut(&mut C)>;

/// One live registration.
pub struct EventSource<C> {
    token: Token,
    kind: SourceKind,
    handler: Handler<C>,
}

impl<C> EventSource<C> {
    pub fn token(&self) -> Token {
        self.token
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

/// Registration table over a [`Poller`].
///
/// `C` is the context every handler receives; the dispatcher never holds it.
pub struct Dispatcher<C, P: Poller> {
    poller: P,
    sources: heapless::Vec<EventSource<C>, MAX_SOURCES>,
    next_token: u32,
}

impl<C, P: Poller> Dispatcher<C, P> {
    pub fn new(poller: P) -> Self {
        Self {
            poller,
            sources: heapless::Vec::new(),
            next_token: 0,
        }
    }

    /// Register an I/O handle.  Fails if the poller rejects the handle or
    /// the table is full.
    pub fn register_io(
        &mut self,
        handle: RawHandle,
        interest: Interest,
        handler: impl FnMut(&mut C) + 'static,
    ) -> Result<Token, DriverError> {
        let token = self.reserve()?;
        self.poller.watch(token, handle, interest)?;
        self.insert(
            token,
            SourceKind::Io { handle, interest },
            Box::new(handler),
        );
        Ok(token)
    }

    /// Register a periodic timer.
    pub fn register_timer(
        &mut self,
        period: Duration,
        handler: impl FnMut(&mut C) + 'static,
    ) -> Result<Token, DriverError> {
        let token = self.reserve()?;
        self.poller.add_timer(token, period)?;
        self.insert(token, SourceKind::Timer { period }, Box::new(handler));
        Ok(token)
    }

    /// Remove a source from the poller and the table.
    ///
    /// The table entry is dropped even when the poller reports an error, so
    /// a failed removal is never retried.
    pub fn deregister(&mut self, token: Token) -> Result<(), DriverError> {
        let Some(index) = self.sources.iter().position(|s| s.token == token) else {
            return Err(DriverError::new(DriverError::EBADF));
        };
        self.sources.swap_remove(index);
        self.poller.remove(token)
    }

    /// Block until something is ready, then run each ready handler once.
    /// Returns the number of handlers invoked.
    pub fn wait_and_dispatch(&mut self, ctx: &mut C) -> Result<usize, DriverError> {
        let mut ready = ReadyList::new();
        self.poller.wait(&mut ready)?;

        let mut dispatched = 0;
        for (i, token) in ready.iter().enumerate() {
            if ready[..i].contains(token) {
                continue;
            }
            match self.sources.iter_mut().find(|s| s.token == *token) {
                Some(source) => {
                    (source.handler)(ctx);
                    dispatched += 1;
                }
                None => debug!("dispatch: no handler for ready token {}", token),
            }
        }
        Ok(dispatched)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &EventSource<C>> {
        self.sources.iter()
    }

    pub fn poller(&self) -> &P {
        &self.poller
    }

    pub fn poller_mut(&mut self) -> &mut P {
        &mut self.poller
    }

    // ── Internal ──────────────────────────────────────────────

    fn reserve(&mut self) -> Result<Token, DriverError> {
        if self.sources.is_full() {
            return Err(DriverError::new(DriverError::ENOSPC));
        }
        let token = Token(self.next_token);
        self.next_token += 1;
        Ok(token)
    }

    fn insert(&mut self, token: Token, kind: SourceKind, handler: Handler<C>) {
        // Capacity was checked in `reserve`, and nothing is registered in
        // between.
        let _ = self.sources.push(EventSource {
            token,
            kind,
            handler,
        });
    }
}

impl<C, P: Poller> Release for Dispatcher<C, P> {
    /// Drop every registration and close the poller.
    fn release(mut self) -> Result<(), DriverError> {
        self.sources.clear();
        self.poller.release()
    }
}
