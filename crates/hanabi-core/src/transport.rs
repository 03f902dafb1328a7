//! Line-oriented connection traits.
//!
//! A client connection carries newline-terminated text in both directions:
//! prompts and notices out, single-token answers in.  The server never looks
//! at what sits underneath, so sessions take any [`Transport`], whether a TCP
//! socket in production or an in-memory duplex pipe in tests.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbound side: yields one answer line at a time.
pub trait TransportReader: Send + 'static {
    /// Next non-blank line with surrounding whitespace and the terminator
    /// stripped, or `Ok(None)` once the peer has hung up.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// Outbound side: each call is one line on the wire.
pub trait TransportWriter: Send + 'static {
    /// Write `text` followed by a newline and flush it.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A client connection.  Splitting it lets a session read and write from
/// separate tasks, so queued notices go out while the reader is blocked.
pub trait Transport: Send + 'static {
    type Reader: TransportReader;
    type Writer: TransportWriter;

    fn split(self) -> (Self::Reader, Self::Writer);
}
