//! Framing and decoding errors.

/// Local framing or decoding violation.
///
/// None of these are retryable: they mean the bytes on the wire (or the
/// request being built) do not follow the protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Command word is empty or does not start with `/`.
    #[error("command must start with '/': {0:?}")]
    InvalidCommand(String),

    /// Word is longer than the largest encodable length (`0x0FFF_FFFF`).
    #[error("length too large to encode: {0}")]
    LengthTooLarge(usize),

    /// Length prefix marker bits are unknown or disagree with the byte count.
    #[error("invalid length prefix: {0:02x?}")]
    InvalidLengthPrefix(Vec<u8>),

    /// Buffer does not end on a sentence boundary.
    #[error("incomplete message: {0} trailing bytes do not form a sentence")]
    Incomplete(usize),

    /// First word of a response sentence is not a known `!status`.
    #[error("unrecognized status: {0:?}")]
    UnrecognizedStatus(String),

    /// Sentence consists of the terminator alone.
    #[error("empty sentence")]
    EmptySentence,

    /// Word payload is not valid UTF-8.
    #[error("invalid UTF-8 in word")]
    InvalidUtf8,
}
