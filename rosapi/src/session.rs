//! Authenticated request/response session over one connection.
//!
//! ```text
//! Disconnected --connect--> Connected --login--> Authenticated
//!                               |                     |
//!                               +--> Closed <---------+
//!                 (disconnect, fatal, I/O error, rejected login)
//! ```
//!
//! The protocol has no request identifiers, so a [`Session`] runs one
//! command at a time and owns its connection exclusively. Callers sharing
//! a session across threads must wrap it in a `Mutex`.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use rosapi_proto::{DEFAULT_PORT, Query, Request, Response, SentenceBuffer};
use tracing::{debug, info};

use crate::auth::challenge_response;
use crate::classify::{Outcome, classify};
use crate::transport::{Transport, connect_tcp};
use crate::{Error, Result};

/// Default timeout for connect, reads, and writes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Size of a single transport read.
const READ_CHUNK: usize = 16 * 1024;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum State {
    /// Configured but never connected.
    Disconnected,
    /// Transport open, not logged in.
    Connected,
    /// Logged in; commands may be run.
    Authenticated,
    /// Transport closed. Reconnect to continue.
    Closed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::Closed => "closed",
        })
    }
}

/// Builder for a TCP [`Session`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    /// Host name or IP address.
    address: String,
    /// API port.
    port: u16,
    /// Connect/read/write timeout; `None` blocks indefinitely.
    timeout: Option<Duration>,
}

impl SessionBuilder {
    /// Sets the API port (default [`DEFAULT_PORT`]).
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the timeout for connect, reads, and writes.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables timeouts.
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Builds an unconnected session.
    pub fn build(self) -> Session {
        Session {
            address: self.address,
            port: self.port,
            timeout: self.timeout,
            transport: None,
            state: State::Disconnected,
            pending: SentenceBuffer::new(),
        }
    }

    /// Builds the session and opens its connection.
    pub fn connect(self) -> Result<Session> {
        let mut session = self.build();
        session.reconnect()?;
        Ok(session)
    }
}

/// A RouterOS API session.
///
/// ```no_run
/// use rosapi::Session;
///
/// let mut s = Session::connect("192.168.88.1", 8728)?;
/// s.login("admin", "")?;
/// for row in s.run("/interface/print", [("detail", "")], Vec::new())? {
///     println!("{:?}", row.attributes);
/// }
/// s.disconnect();
/// # Ok::<(), rosapi::Error>(())
/// ```
#[derive(Debug)]
pub struct Session<T: Transport = TcpStream> {
    /// Remote host.
    address: String,
    /// Remote port.
    port: u16,
    /// Applied to every connect, read, and write.
    timeout: Option<Duration>,
    /// Open connection, `None` unless connected.
    transport: Option<T>,
    /// Current lifecycle state.
    state: State,
    /// Bytes received past the last complete sentence.
    pending: SentenceBuffer,
}

impl Session {
    /// Starts building a session to `address`.
    pub fn builder(address: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            address: address.into(),
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Connects to `address:port` with the default timeout.
    pub fn connect(address: impl Into<String>, port: u16) -> Result<Self> {
        Self::builder(address).port(port).connect()
    }

    /// Opens a fresh connection from the `Disconnected` or `Closed` state.
    pub fn reconnect(&mut self) -> Result<()> {
        if matches!(self.state, State::Connected | State::Authenticated) {
            return Err(Error::State {
                op: "connect",
                state: self.state,
            });
        }
        let stream = connect_tcp(&self.address, self.port, self.timeout)?;
        info!(address = %self.address, port = self.port, "connected");
        self.pending.clear();
        self.transport = Some(stream);
        self.state = State::Connected;
        Ok(())
    }
}

impl<T: Transport> Session<T> {
    /// Wraps an already-open transport. The session starts `Connected`.
    pub fn with_transport(address: impl Into<String>, transport: T) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_PORT,
            timeout: None,
            transport: Some(transport),
            state: State::Connected,
            pending: SentenceBuffer::new(),
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> State {
        self.state
    }

    /// Remote address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Remote port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Logs in with the MD5 challenge-response exchange.
    ///
    /// Sends a bare `/login`, hashes the returned `ret` challenge with the
    /// password, then sends `/login =name= =response=` and waits for its
    /// `!done`. Any failure closes the session.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.expect_state(State::Connected, "log in")?;
        match self.authenticate(username, password) {
            Ok(()) => {
                info!(user = username, "logged in");
                self.state = State::Authenticated;
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Runs `command` and returns its `!re` rows followed by the `!done`.
    pub fn run<K, V>(
        &mut self,
        command: &str,
        attributes: impl IntoIterator<Item = (K, V)>,
        queries: impl IntoIterator<Item = Query>,
    ) -> Result<Vec<Response>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.expect_state(State::Authenticated, "run a command")?;
        let req = Request::new(command)?
            .attributes(attributes)
            .queries(queries);
        self.run_request(&req)
    }

    /// Runs a prebuilt request.
    ///
    /// Fails fast: the first `!trap` is returned as [`Error::Api`] once the
    /// trailing `!done` has been read, and rows received before it are
    /// dropped. `!fatal`, timeouts, and I/O or framing errors close the
    /// session.
    pub fn run_request(&mut self, req: &Request) -> Result<Vec<Response>> {
        self.expect_state(State::Authenticated, "run a command")?;
        let frame = rosapi_proto::encode(req)?;
        let result = self.transact(req.command(), &frame);
        if result.as_ref().is_err_and(Error::is_fatal) {
            self.disconnect();
        }
        result
    }

    /// Closes the transport. Safe to call in any state, any number of times.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            // The peer may already be gone; the socket is released either way.
            let _ = transport.close();
            info!(address = %self.address, "disconnected");
        }
        self.pending.clear();
        self.state = State::Closed;
    }

    /// Runs the two-step `/login` exchange on an open transport.
    fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let frame = rosapi_proto::encode(&Request::new("/login")?)?;
        let replies = self.transact("/login", &frame).map_err(rejected)?;
        let challenge = replies
            .iter()
            .find_map(|r| r.get("ret"))
            .ok_or_else(|| Error::Authentication("device sent no login challenge".into()))?;

        let req = Request::new("/login")?
            .attribute("name", username)
            .attribute("response", challenge_response(password, challenge)?);
        let frame = rosapi_proto::encode(&req)?;
        self.transact("/login", &frame).map_err(rejected)?;
        Ok(())
    }

    /// Sends one encoded sentence and reads sentences up to `!done`/`!fatal`.
    fn transact(&mut self, command: &str, frame: &[u8]) -> Result<Vec<Response>> {
        let transport = self.transport.as_mut().ok_or(Error::State {
            op: "send",
            state: self.state,
        })?;
        debug!(command, bytes = frame.len(), "sending sentence");
        transport.write_all(frame)?;
        transport.flush()?;

        let mut rows = Vec::new();
        let mut trap = None;
        loop {
            let resp = self.read_sentence()?;
            debug!(
                status = %resp.status,
                words = resp.attributes.len() + resp.error.len(),
                "received sentence"
            );
            match classify(resp) {
                Ok(Outcome::Row(row)) => {
                    if trap.is_none() {
                        rows.push(row);
                    }
                }
                Ok(Outcome::Done(done)) => {
                    return match trap {
                        Some(e) => Err(e),
                        None => {
                            rows.push(done);
                            Ok(rows)
                        }
                    };
                }
                Err(e) if e.is_fatal() => return Err(e),
                // A trap is followed by `!done`; drain it so the next
                // command starts on a sentence boundary.
                Err(e) => {
                    trap.get_or_insert(e);
                }
            }
        }
    }

    /// Returns the next sentence, reading from the transport as needed.
    fn read_sentence(&mut self) -> Result<Response> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(resp) = self.pending.next_sentence()? {
                return Ok(resp);
            }
            let transport = self.transport.as_mut().ok_or(Error::State {
                op: "read",
                state: self.state,
            })?;
            let n = match transport.read(&mut chunk) {
                Ok(0) => {
                    return Err(Error::Connection(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by device",
                    )));
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.pending.push(&chunk[..n]);
        }
    }

    /// Fails with [`Error::State`] unless the session is in `want`.
    fn expect_state(&self, want: State, op: &'static str) -> Result<()> {
        if self.state == want {
            Ok(())
        } else {
            Err(Error::State {
                op,
                state: self.state,
            })
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Turns a device error during login into an authentication failure.
fn rejected(e: Error) -> Error {
    match e {
        Error::Api { details, .. } if details.is_empty() => {
            Error::Authentication("login rejected".into())
        }
        Error::Api { details, .. } => Error::Authentication(details.join("; ")),
        other => other,
    }
}
