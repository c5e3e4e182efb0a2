//! # Transport Abstraction
//!
//! The one narrow call that carries an encoded response out of the guest.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: A Transport knows nothing about messages or schemas.
//!   It moves one finished, opaque buffer per call.
//! - **Write-Only**: Nothing comes back that the encoder depends on. Errors
//!   are reported so the caller can log them, never interpreted.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

/// Errors that occur while handing bytes across the boundary.
#[derive(Debug, Clone)]
pub enum Error {
    /// The other side is gone (closed pipe, dropped host).
    Closed,
    /// The boundary refused a buffer of this size.
    PayloadTooLarge { len: usize, max: usize },
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Transport closed"),
            Self::PayloadTooLarge { len, max } => {
                write!(f, "Payload of {} bytes exceeds transport limit of {}", len, max)
            }
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hands one encoded buffer to the host.
///
/// # Invariants
/// - `payload` is exactly the encoded message: no trailing bytes.
/// - Must not interpret the payload content.
pub trait Transport {
    fn send(&mut self, payload: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send(payload)
    }
}

/// Writes each payload to an `io::Write` and flushes it.
#[derive(Debug)]
pub struct WriterTransport<W: Write> {
    writer: W,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// The guest's stdout, which the host captures as the response channel.
pub type StdoutTransport = WriterTransport<std::io::Stdout>;

impl StdoutTransport {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

/// Adapts a host-provided function (e.g. an imported `writebytes`) into a
/// Transport.
pub struct FnTransport<F>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    f: F,
}

impl<F> FnTransport<F>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Transport for FnTransport<F>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        (self.f)(payload)
    }
}

/// Captures every payload in memory.
///
/// Clones share the same store, so one clone can be handed to the SDK while
/// another inspects what was sent. A poisoned store is still read and
/// written; captured buffers are never half-pushed.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    max_len: Option<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects payloads longer than `max_len` with `PayloadTooLarge`.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Returns every payload sent so far, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns the most recent payload, if any.
    pub fn last(&self) -> Option<Vec<u8>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        if let Some(max) = self.max_len {
            if payload.len() > max {
                return Err(Error::PayloadTooLarge { len: payload.len(), max });
            }
        }
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(payload.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_transport_writes_exact_bytes() -> Result<()> {
        let mut t = WriterTransport::new(Vec::new());
        t.send(&[1, 2, 3])?;
        t.send(&[])?;
        t.send(&[4])?;
        assert_eq!(t.into_inner(), [1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn memory_transport_clones_share_store() -> Result<()> {
        let probe = MemoryTransport::new();
        let mut t = probe.clone();
        t.send(b"one")?;
        t.send(b"two")?;
        assert_eq!(probe.sent(), [b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(probe.last(), Some(b"two".to_vec()));
        Ok(())
    }

    #[test]
    fn memory_transport_enforces_max_len() {
        let mut t = MemoryTransport::new().with_max_len(2);
        let err = t.send(b"abc").unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { len: 3, max: 2 }));
        assert!(t.sent().is_empty());
    }

    #[test]
    fn fn_transport_calls_through() -> Result<()> {
        let mut seen = Vec::new();
        {
            let mut t = FnTransport::new(|b: &[u8]| {
                seen.extend_from_slice(b);
                Ok(())
            });
            t.send(b"xy")?;
        }
        assert_eq!(seen, b"xy");
        Ok(())
    }

    #[test]
    fn memory_transport_survives_poisoned_store() -> Result<()> {
        let mut t = MemoryTransport::new();
        t.send(b"before")?;

        let shared = t.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.sent.lock();
            panic!("poison the store");
        })
        .join();
        assert!(t.sent.is_poisoned());

        t.send(b"after")?;
        assert_eq!(t.sent(), [b"before".to_vec(), b"after".to_vec()]);
        assert_eq!(t.last(), Some(b"after".to_vec()));
        Ok(())
    }

    #[test]
    fn broken_pipe_maps_to_closed() {
        let e: Error = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(e, Error::Closed));
    }
}
