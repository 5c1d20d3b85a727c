//! Socket-backed transports.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use super::Transport;

impl Transport for TcpStream {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = self;
        Read::read(&mut stream, buf)
    }

    fn write_with_deadline(&self, bytes: &[u8], deadline: Duration) -> io::Result<()> {
        self.set_write_timeout(Some(deadline))?;
        let mut stream = self;
        stream.write_all(bytes)?;
        stream.flush()
    }

    fn close(&self) -> io::Result<()> {
        ignore_not_connected(self.shutdown(Shutdown::Both))
    }
}

#[cfg(unix)]
impl Transport for UnixStream {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = self;
        Read::read(&mut stream, buf)
    }

    fn write_with_deadline(&self, bytes: &[u8], deadline: Duration) -> io::Result<()> {
        self.set_write_timeout(Some(deadline))?;
        let mut stream = self;
        stream.write_all(bytes)?;
        stream.flush()
    }

    fn close(&self) -> io::Result<()> {
        ignore_not_connected(self.shutdown(Shutdown::Both))
    }
}

/// Treats shutting down an already disconnected socket as success.
fn ignore_not_connected(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
        other => other,
    }
}

/// Returns two connected in-process stream ends.
///
/// # Errors
///
/// Returns the I/O error raised while creating the socket pair.
#[cfg(unix)]
pub fn pipe() -> io::Result<(UnixStream, UnixStream)> {
    UnixStream::pair()
}

/// Returns two connected in-process stream ends.
///
/// # Errors
///
/// Returns the I/O error raised while creating the loopback pair.
#[cfg(not(unix))]
pub fn pipe() -> io::Result<(TcpStream, TcpStream)> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    let client = TcpStream::connect(listener.local_addr()?)?;
    let (server, _) = listener.accept()?;
    Ok((server, client))
}
