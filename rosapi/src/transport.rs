//! Byte-stream transport under a session.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A bidirectional byte stream a [`Session`](crate::Session) can own.
///
/// Any blocking stream works; [`TcpStream`] is the default.
pub trait Transport: Read + Write {
    /// Shuts the stream down. Called at most once per connection.
    fn close(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

/// Opens a TCP connection, applying `timeout` to connect, reads and writes.
pub(crate) fn connect_tcp(
    address: &str,
    port: u16,
    timeout: Option<Duration>,
) -> io::Result<TcpStream> {
    let timeout = timeout.filter(|t| !t.is_zero());
    let mut last_err = None;
    for addr in (address, port).to_socket_addrs()? {
        let attempt = match timeout {
            Some(t) => TcpStream::connect_timeout(&addr, t),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{address}: no addresses resolved"),
        )
    }))
}
