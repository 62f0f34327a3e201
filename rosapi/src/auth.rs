//! MD5 challenge-response used by the `/login` exchange.

use md5::{Digest, Md5};

use crate::{Error, Result};

/// Computes the `response` attribute for a login challenge.
///
/// `challenge` is the hex string from the device's `ret` attribute. The
/// result is `"00"` followed by the hex MD5 of
/// `0x00 || password || unhex(challenge)`.
pub fn challenge_response(password: &str, challenge: &str) -> Result<String> {
    let challenge = hex::decode(challenge.trim())
        .map_err(|e| Error::Authentication(format!("invalid challenge {challenge:?}: {e}")))?;

    let mut md = Md5::new();
    md.update([0u8]);
    md.update(password.as_bytes());
    md.update(&challenge);
    Ok(format!("00{}", hex::encode(md.finalize())))
}
