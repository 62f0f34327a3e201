//! Maps decoded sentences to command outcomes.

use rosapi_proto::{Response, Status};

use crate::error::ApiErrorKind;
use crate::{Error, Result};

/// A successful sentence and whether it ends the command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Outcome {
    /// `!re`: one data row, more sentences follow.
    Row(Response),
    /// `!done`: the command finished.
    Done(Response),
}

impl Outcome {
    /// The underlying response.
    pub fn into_response(self) -> Response {
        match self {
            Self::Row(r) | Self::Done(r) => r,
        }
    }
}

/// Classifies one response sentence.
///
/// `!trap` and `!fatal` become [`Error::Api`] carrying the device's
/// error words verbatim.
pub fn classify(resp: Response) -> Result<Outcome> {
    match resp.status {
        Status::Re => Ok(Outcome::Row(resp)),
        Status::Done => Ok(Outcome::Done(resp)),
        Status::Trap => Err(Error::Api {
            kind: ApiErrorKind::Trap,
            details: resp.error,
        }),
        _ => Err(Error::Api {
            kind: ApiErrorKind::Fatal,
            details: resp.error,
        }),
    }
}
