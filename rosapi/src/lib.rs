//! Client for the RouterOS API.
//!
//! A [`Session`] owns one TCP connection (port [`DEFAULT_PORT`]), logs in
//! with the MD5 challenge-response exchange, and runs commands one at a
//! time, returning every `!re` row and the final `!done` of each.
//!
//! # Quick start
//!
//! ```no_run
//! use rosapi::Session;
//!
//! let mut session = Session::builder("192.168.88.1")
//!     .timeout(std::time::Duration::from_secs(5))
//!     .connect()?;
//! session.login("admin", "secret")?;
//!
//! let rows = session.run(
//!     "/interface/print",
//!     [("proplist", "name,type")],
//!     [("disabled".to_owned(), Some("no".to_owned()))],
//! )?;
//! for row in rows.iter().filter(|r| r.id().is_some()) {
//!     println!("{:?}", row.attributes);
//! }
//! # Ok::<(), rosapi::Error>(())
//! ```
//!
//! Device errors arrive as [`Error::Api`]; a `!trap` leaves the session
//! usable, a `!fatal` closes it.

mod auth;
mod classify;
mod error;
mod session;
mod transport;

pub use auth::challenge_response;
pub use classify::{Outcome, classify};
pub use error::{ApiErrorKind, Error, Result};
pub use rosapi_proto::{
    Attributes, DEFAULT_PORT, ProtocolError, Query, Request, Response, Status,
};
pub use session::{DEFAULT_TIMEOUT, Session, SessionBuilder, State};
pub use transport::Transport;
