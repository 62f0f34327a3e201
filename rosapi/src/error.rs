//! Error types for RouterOS API sessions.

use std::fmt;
use std::io;

use rosapi_proto::ProtocolError;

use crate::session::State;

/// Alias for `Result<T, rosapi::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Which device error sentence produced an [`Error::Api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiErrorKind {
    /// `!trap`: the command failed, the session is still usable.
    Trap,
    /// `!fatal`: the device is closing the connection.
    Fatal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trap => f.write_str("trap"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed length prefix, incomplete sentence, unknown status, or an
    /// invalid request.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Connect, read, or write failed at the transport level.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),

    /// No progress within the configured timeout.
    #[error("timed out waiting for the device")]
    Timeout,

    /// Login challenge missing or credentials rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The device answered with `!trap` or `!fatal`.
    #[error("device reported {kind}: {}", .details.join("; "))]
    Api {
        /// Sentence that carried the error.
        kind: ApiErrorKind,
        /// Error words as sent by the device, e.g. `message=no such item`.
        details: Vec<String>,
    },

    /// Operation is not valid in the session's current state.
    #[error("cannot {op} while session is {state}")]
    State {
        /// Rejected operation.
        op: &'static str,
        /// State the session was in.
        state: State,
    },
}

impl Error {
    /// Whether the session was closed by this error and must be reconnected.
    ///
    /// Requests rejected before anything is sent (bad command path, word
    /// too long to frame) leave the session as it was.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Api { kind, .. } => matches!(kind, ApiErrorKind::Fatal),
            Self::Protocol(
                ProtocolError::InvalidCommand(_) | ProtocolError::LengthTooLarge(_),
            )
            | Self::State { .. } => false,
            _ => true,
        }
    }

    /// Device error details, empty for non-API errors.
    pub fn details(&self) -> &[String] {
        match self {
            Self::Api { details, .. } => details,
            _ => &[],
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            _ => Self::Connection(e),
        }
    }
}
