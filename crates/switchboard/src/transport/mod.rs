//! Duplex byte-stream transports a connection can run over.
//!
//! A [`Transport`] offers a blocking read, a write bounded by a deadline, and
//! a close that unblocks any reader parked on the same stream. All methods
//! take `&self`: one dispatcher thread reads while caller threads write.

mod stream;
#[cfg(test)]
mod test_utils;

use std::io;
use std::time::Duration;

use tracing::trace;

pub use self::stream::pipe;
#[cfg(test)]
pub(crate) use self::test_utils::ScriptedTransport;

/// Tracing target for transport operations.
pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Duplex byte stream consumed by a connection.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync + 'static {
    /// Blocks until bytes are available and copies them into `buf`.
    ///
    /// `Ok(0)` means the stream has ended.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the stream fails.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes all of `bytes`, giving up once `deadline` elapses.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, including timeouts.
    fn write_with_deadline(&self, bytes: &[u8], deadline: Duration) -> io::Result<()>;

    /// Closes both directions of the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the stream cannot be shut down.
    fn close(&self) -> io::Result<()>;
}

/// Reads into `buf`, retrying reads interrupted by a signal.
pub(crate) fn read_with_retry(transport: &dyn Transport, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match transport.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {
                trace!(target: TRANSPORT_TARGET, "read interrupted, retrying");
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests;
