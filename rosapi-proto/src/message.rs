//! Request and response sentence types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Default plaintext API port.
pub const DEFAULT_PORT: u16 = 8728;

/// Attribute mapping carried by requests and responses.
pub type Attributes = BTreeMap<String, String>;

/// One query word: `?name` or `?name=value`.
pub type Query = (String, Option<String>);

/// A command sentence sent to the device.
///
/// Encodes as the command word, `=name=value` attributes, `.name=value`
/// API attributes, `?name[=value]` queries, then the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command path, always starting with `/`.
    command: String,
    /// Regular attributes.
    attributes: Attributes,
    /// API-internal attributes such as `.tag`.
    api_attributes: Attributes,
    /// Query words, in the order they are sent.
    queries: Vec<Query>,
}

impl Request {
    /// Creates a request for `command`, which must start with `/`.
    pub fn new(command: impl Into<String>) -> Result<Self, ProtocolError> {
        let command = command.into();
        if !command.starts_with('/') {
            return Err(ProtocolError::InvalidCommand(command));
        }
        Ok(Self {
            command,
            attributes: Attributes::new(),
            api_attributes: Attributes::new(),
            queries: Vec::new(),
        })
    }

    /// Adds a regular `=name=value` attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Adds an API-internal `.name=value` attribute.
    #[must_use]
    pub fn api_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.api_attributes.insert(name.into(), value.into());
        self
    }

    /// Appends a `?name` or `?name=value` query word.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.queries.push((name.into(), value));
        self
    }

    /// Extends the regular attributes.
    #[must_use]
    pub fn attributes<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(attrs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Extends the query words.
    #[must_use]
    pub fn queries<K>(mut self, queries: impl IntoIterator<Item = (K, Option<String>)>) -> Self
    where
        K: Into<String>,
    {
        self.queries
            .extend(queries.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Command path.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Words of this sentence in wire order, without the terminator.
    pub fn words(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(
            1 + self.attributes.len() + self.api_attributes.len() + self.queries.len(),
        );
        words.push(self.command.clone());
        words.extend(self.attributes.iter().map(|(k, v)| format!("={k}={v}")));
        words.extend(self.api_attributes.iter().map(|(k, v)| format!(".{k}={v}")));
        words.extend(self.queries.iter().map(|(k, v)| match v {
            Some(v) => format!("?{k}={v}"),
            None => format!("?{k}"),
        }));
        words
    }
}

/// Leading status word of a response sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Status {
    /// Command finished.
    Done,
    /// One data row; more sentences follow.
    Re,
    /// Command-level error; the connection stays usable.
    Trap,
    /// Session-level error; the device closes the connection.
    Fatal,
}

impl Status {
    /// Wire name without the leading `!`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Re => "re",
            Self::Trap => "trap",
            Self::Fatal => "fatal",
        }
    }

    /// Whether the status ends the reply to a command.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Fatal)
    }

    /// Whether sentences with this status carry error details.
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Trap | Self::Fatal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(Self::Done),
            "re" => Ok(Self::Re),
            "trap" => Ok(Self::Trap),
            "fatal" => Ok(Self::Fatal),
            other => Err(ProtocolError::UnrecognizedStatus(other.to_owned())),
        }
    }
}

/// A decoded response sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Response {
    /// Leading status word.
    pub status: Status,
    /// `name=value` words. Empty for `trap`/`fatal`.
    pub attributes: Attributes,
    /// Error detail words, populated only for `trap`/`fatal`.
    pub error: Vec<String>,
}

impl Response {
    /// Creates a response with no attributes or details.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            attributes: Attributes::new(),
            error: Vec::new(),
        }
    }

    /// Looks up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Object id (`.id`, e.g. `*7`) of the row, if present.
    pub fn id(&self) -> Option<&str> {
        self.get(".id")
    }
}
