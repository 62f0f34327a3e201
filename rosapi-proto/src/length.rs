//! Variable-width length prefix placed before every word.
//!
//! The number of leading one bits in the first byte selects the width:
//!
//! ```text
//! 0xxxxxxx                              < 0x80
//! 10xxxxxx xxxxxxxx                     <= 0x3FFF
//! 110xxxxx xxxxxxxx xxxxxxxx            <= 0x1F_FFFF
//! 1110xxxx xxxxxxxx xxxxxxxx xxxxxxxx   <= 0x0FFF_FFFF
//! ```
//!
//! All multi-byte forms are big-endian.

use crate::ProtocolError;

/// Largest length representable by the 4-byte form.
pub const MAX_LENGTH: usize = 0x0FFF_FFFF;

/// Encodes `len` in the smallest form that fits.
pub fn encode_length(len: usize) -> Result<Vec<u8>, ProtocolError> {
    let Ok(n) = u32::try_from(len) else {
        return Err(ProtocolError::LengthTooLarge(len));
    };
    let bytes = match n {
        0..0x80 => vec![n.to_be_bytes()[3]],
        0x80..=0x3FFF => (n | 0x8000).to_be_bytes()[2..].to_vec(),
        0x4000..=0x1F_FFFF => (n | 0x00C0_0000).to_be_bytes()[1..].to_vec(),
        0x20_0000..=0x0FFF_FFFF => (n | 0xE000_0000).to_be_bytes().to_vec(),
        _ => return Err(ProtocolError::LengthTooLarge(len)),
    };
    Ok(bytes)
}

/// Returns the total prefix width announced by its first byte.
pub fn prefix_width(first: u8) -> Result<usize, ProtocolError> {
    match first.leading_ones() {
        0 => Ok(1),
        1 => Ok(2),
        2 => Ok(3),
        3 => Ok(4),
        // 0xF0 (5-byte form) and 0xF8.. control bytes are not supported.
        _ => Err(ProtocolError::InvalidLengthPrefix(vec![first])),
    }
}

/// Decodes a complete prefix.
///
/// `prefix` must hold exactly the number of bytes its marker bits announce.
pub fn decode_length(prefix: &[u8]) -> Result<usize, ProtocolError> {
    let invalid = || ProtocolError::InvalidLengthPrefix(prefix.to_vec());
    let (&first, rest) = prefix.split_first().ok_or_else(invalid)?;
    if prefix_width(first)? != prefix.len() {
        return Err(invalid());
    }

    let mask: u8 = match prefix.len() {
        1 => 0x7F,
        2 => 0x3F,
        3 => 0x1F,
        _ => 0x0F,
    };
    let value = rest
        .iter()
        .fold(u32::from(first & mask), |acc, &b| (acc << 8) | u32::from(b));
    usize::try_from(value).map_err(|_| invalid())
}
