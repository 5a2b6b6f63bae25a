//! UART transport: full-delivery send and chunked receive.
//!
//! The link is half-duplex from the controller's point of view: a send runs
//! to completion (or failure) inside one handler before anything else is
//! dispatched.

use log::info;

use crate::dispatch::RawHandle;
use crate::error::{DriverError, IoError, Result};

/// Bytes read per readable event.  Inbound data has no length framing, so
/// this fixed cap bounds every read.
pub const RX_CHUNK: usize = 256;

/// Byte-oriented serial channel.
pub trait SerialPort {
    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read; 0 if nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, DriverError>;

    /// Write as much of `data` as the driver accepts right now.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> core::result::Result<usize, DriverError>;

    /// Handle the poller watches for readability.
    fn raw_handle(&self) -> RawHandle;
}

// ───────────────────────────────────────────────────────────────
// Send
// ───────────────────────────────────────────────────────────────

/// Outcome of a completed [`send_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Bytes written (always the full message length).
    pub bytes: usize,
    /// Driver write calls it took.
    pub writes: u32,
}

/// Write all of `message`, retrying on partial writes.
///
/// Each successful write advances past the bytes it accepted and the
/// remainder is retried immediately.  The first driver error aborts the send
/// and nothing more of the message is written.  There is no retry cap: a
/// driver that keeps accepting zero bytes without reporting an error stalls
/// the caller.
pub fn send_message<S: SerialPort>(port: &mut S, message: &[u8]) -> Result<SendReport> {
    let mut sent = 0;
    let mut writes = 0u32;

    while sent < message.len() {
        writes += 1;
        match port.write(&message[sent..]) {
            Ok(n) => sent += n.min(message.len() - sent),
            Err(error) => return Err(IoError::SerialWrite { error, sent }.into()),
        }
    }

    info!("Sent {} bytes over UART in {} calls.", sent, writes);
    Ok(SendReport {
        bytes: sent,
        writes,
    })
}

// ───────────────────────────────────────────────────────────────
// Receive
// ───────────────────────────────────────────────────────────────

/// Total bytes received this run.  Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounter(u64);

impl ByteCounter {
    pub fn get(self) -> u64 {
        self.0
    }

    fn add(&mut self, n: usize) -> u64 {
        self.0 = self.0.saturating_add(n as u64);
        self.0
    }
}

/// Inbound side of the UART.
#[derive(Debug, Default)]
pub struct SerialReceiver {
    received: ByteCounter,
}

impl SerialReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one chunk into `buf`.
    ///
    /// Returns the number of bytes read (0 = nothing pending, counter
    /// untouched).
    pub fn receive<S: SerialPort>(
        &mut self,
        port: &mut S,
        buf: &mut [u8; RX_CHUNK],
    ) -> Result<usize> {
        let n = port.read(buf).map_err(IoError::SerialRead)?;
        let n = n.min(RX_CHUNK);
        if n > 0 {
            self.received.add(n);
        }
        Ok(n)
    }

    pub fn total(&self) -> u64 {
        self.received.get()
    }
}
