//! Wire codec for the RouterOS API.
//!
//! The API is a synchronous request/response protocol over one TCP
//! connection. Every unit on the wire is a *word* preceded by a
//! variable-width length (see [`length`]); words are grouped into
//! *sentences* ended by a zero-length word.
//!
//! This crate is pure data transformation: it never touches a socket.
//!
//! ```
//! use rosapi_proto::{Request, Status, decode_sentences, encode};
//!
//! let req = Request::new("/interface/print").unwrap();
//! assert_eq!(encode(&req).unwrap()[0], 16);
//!
//! let resp = decode_sentences(b"\x05!done\x00").unwrap();
//! assert_eq!(resp[0].status, Status::Done);
//! ```

mod codec;
mod error;
pub mod length;
mod message;

pub use codec::{SentenceBuffer, decode_sentences, decode_words, encode};
pub use error::ProtocolError;
pub use message::{Attributes, DEFAULT_PORT, Query, Request, Response, Status};
