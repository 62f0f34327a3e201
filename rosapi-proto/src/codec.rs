//! Sentence codec.
//!
//! A sentence is a sequence of length-prefixed words ending in a
//! zero-length word (a single `0x00` byte on the wire):
//!
//! ```text
//! [len][word] [len][word] ... [0x00]
//! ```

use crate::length::{decode_length, encode_length, prefix_width};
use crate::{ProtocolError, Request, Response, Status};

/// Encodes `req` as one complete, terminated sentence.
pub fn encode(req: &Request) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::new();
    for word in req.words() {
        out.extend(encode_length(word.len())?);
        out.extend_from_slice(word.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// Decodes a buffer holding one or more whole sentences.
///
/// Fails with [`ProtocolError::Incomplete`] unless the buffer ends exactly
/// on a sentence boundary. Use [`SentenceBuffer`] when data arrives in
/// arbitrary chunks.
pub fn decode_sentences(buf: &[u8]) -> Result<Vec<Response>, ProtocolError> {
    if buf.is_empty() {
        return Err(ProtocolError::Incomplete(0));
    }
    let mut out = Vec::new();
    let mut rest = buf;
    while !rest.is_empty() {
        match parse_sentence(rest)? {
            Some((resp, used)) => {
                out.push(resp);
                rest = &rest[used..];
            }
            None => return Err(ProtocolError::Incomplete(rest.len())),
        }
    }
    Ok(out)
}

/// Builds a response from the words of one sentence, terminator excluded.
///
/// The first word must be `!done`, `!re`, `!trap` or `!fatal`. Remaining
/// words are `=name=value` attributes, split on the first `=` after the
/// leading one; for `trap`/`fatal` they are kept as error details instead.
pub fn decode_words<W: AsRef<[u8]>>(words: &[W]) -> Result<Response, ProtocolError> {
    let (first, rest) = words.split_first().ok_or(ProtocolError::EmptySentence)?;
    let first = utf8(first.as_ref())?;
    let status: Status = first
        .strip_prefix('!')
        .ok_or_else(|| ProtocolError::UnrecognizedStatus(first.to_owned()))?
        .parse()?;

    let mut resp = Response::new(status);
    for word in rest {
        let word = utf8(word.as_ref())?;
        let body = word.strip_prefix('=').unwrap_or(word);
        if status.is_error() {
            resp.error.push(body.to_owned());
        } else {
            let (k, v) = body.split_once('=').unwrap_or((body, ""));
            resp.attributes.insert(k.to_owned(), v.to_owned());
        }
    }
    Ok(resp)
}

/// Accumulates received bytes and yields complete sentences.
///
/// A single socket read may return part of a sentence, or several; this
/// buffer holds the remainder until the rest arrives.
#[derive(Debug, Default)]
pub struct SentenceBuffer {
    /// Bytes received but not yet consumed as a sentence.
    buf: Vec<u8>,
}

impl SentenceBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Takes the next complete sentence.
    ///
    /// Returns `Ok(None)` if more data is needed. Malformed data is an
    /// error as soon as it is seen, even before the sentence is complete.
    pub fn next_sentence(&mut self) -> Result<Option<Response>, ProtocolError> {
        let Some((resp, used)) = parse_sentence(&self.buf)? else {
            return Ok(None);
        };
        self.buf.drain(..used);
        Ok(Some(resp))
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Discards buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Parses one sentence from the front of `buf`.
///
/// Returns the response and the number of bytes it occupied, or `None`
/// if `buf` ends before the terminator.
fn parse_sentence(buf: &[u8]) -> Result<Option<(Response, usize)>, ProtocolError> {
    let mut pos = 0;
    let mut words = Vec::new();
    loop {
        let Some(&first) = buf.get(pos) else {
            return Ok(None);
        };
        let width = prefix_width(first)?;
        let Some(prefix) = buf.get(pos..pos + width) else {
            return Ok(None);
        };
        let len = decode_length(prefix)?;
        pos += width;
        if len == 0 {
            break;
        }
        let Some(word) = buf.get(pos..pos + len) else {
            return Ok(None);
        };
        words.push(word);
        pos += len;
    }
    Ok(Some((decode_words(&words)?, pos)))
}

/// Borrows a word as UTF-8 text.
fn utf8(word: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(word).map_err(|_| ProtocolError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frames raw words into a sentence the way the device does.
    fn sentence(words: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for w in words {
            out.extend(encode_length(w.len()).unwrap());
            out.extend_from_slice(w.as_bytes());
        }
        out.push(0);
        out
    }

    #[test]
    fn encode_login_bytes() {
        let req = Request::new("/login").unwrap();
        assert_eq!(encode(&req).unwrap(), b"\x06/login\x00");
    }

    #[test]
    fn encode_attributes_and_queries() {
        let req = Request::new("/interface/print")
            .unwrap()
            .query("disabled", Some("no".into()));
        let mut expected = b"\x10/interface/print".to_vec();
        expected.extend(b"\x0c?disabled=no\x00");
        assert_eq!(encode(&req).unwrap(), expected);
    }

    #[test]
    fn encode_uses_byte_length_not_char_count() {
        let req = Request::new("/system/identity/set")
            .unwrap()
            .attribute("name", "r\u{f6}uter");
        let bytes = encode(&req).unwrap();
        // "=name=röuter" is 12 chars but 13 bytes.
        let word = &bytes[21..];
        assert_eq!(word[0], 13);
        assert_eq!(&word[1..14], "=name=r\u{f6}uter".as_bytes());
    }

    #[test]
    fn encode_long_word_uses_two_byte_prefix() {
        let req = Request::new("/x").unwrap().attribute("comment", "a".repeat(200));
        let bytes = encode(&req).unwrap();
        // Prefix and "/x" take three bytes; the attribute word is 209.
        assert_eq!(&bytes[3..5], &[0x80, 209]);
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn query_roundtrips_as_attributes() {
        let req = Request::new("/interface/print")
            .unwrap()
            .query("disabled", Some("no".into()));
        let words = req.words();
        let body = words[1].strip_prefix('?').unwrap();

        let resp = decode_sentences(&sentence(&["!done", &format!("={body}")])).unwrap();
        assert_eq!(resp.len(), 1);
        assert_eq!(resp[0].status, Status::Done);
        assert_eq!(resp[0].get("disabled"), Some("no"));
    }

    #[test]
    fn decodes_multiple_sentences() {
        let mut buf = sentence(&["!re", "=.id=*3", "=name=ether1"]);
        buf.extend(sentence(&["!re", "=.id=*4", "=name=ether2"]));
        buf.extend(sentence(&["!done"]));

        let resp = decode_sentences(&buf).unwrap();
        assert_eq!(resp.len(), 3);
        assert_eq!(resp[0].id(), Some("*3"));
        assert_eq!(resp[1].get("name"), Some("ether2"));
        assert_eq!(resp[2], Response::new(Status::Done));
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let resp = decode_sentences(&sentence(&["!re", "=comment=a=b"])).unwrap();
        assert_eq!(resp[0].get("comment"), Some("a=b"));
    }

    #[test]
    fn trap_words_become_error_details() {
        let resp = decode_words(&["!trap", "=category=1", "=message=invalid value"]).unwrap();
        assert_eq!(resp.status, Status::Trap);
        assert!(resp.attributes.is_empty());
        assert_eq!(resp.error, ["category=1", "message=invalid value"]);
    }

    #[test]
    fn unprefixed_attribute_words() {
        let resp = decode_words(&["!re", ".id=*3", "name=ether1"]).unwrap();
        let expected: Vec<(&str, &str)> = vec![(".id", "*3"), ("name", "ether1")];
        assert!(resp.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())).eq(expected));
    }

    #[test]
    fn rejects_unknown_status() {
        assert_eq!(
            decode_sentences(&sentence(&["!empty"])),
            Err(ProtocolError::UnrecognizedStatus("empty".into()))
        );
        assert!(matches!(
            decode_sentences(&sentence(&["done"])),
            Err(ProtocolError::UnrecognizedStatus(_))
        ));
    }

    #[test]
    fn rejects_empty_sentence() {
        assert_eq!(decode_sentences(&[0]), Err(ProtocolError::EmptySentence));
    }

    #[test]
    fn rejects_incomplete_message() {
        let full = sentence(&["!re", "=name=ether1"]);
        for cut in 0..full.len() {
            assert!(
                matches!(
                    decode_sentences(&full[..cut]),
                    Err(ProtocolError::Incomplete(_))
                ),
                "cut at {cut}"
            );
        }

        let mut two = full.clone();
        two.extend(&full[..4]);
        assert_eq!(decode_sentences(&two), Err(ProtocolError::Incomplete(4)));
    }

    #[test]
    fn buffer_reassembles_partial_reads() {
        let mut wire = sentence(&["!re", "=name=ether1"]);
        wire.extend(sentence(&["!done"]));

        let mut buf = SentenceBuffer::new();
        let mut got = Vec::new();
        for b in &wire {
            buf.push(std::slice::from_ref(b));
            while let Some(resp) = buf.next_sentence().unwrap() {
                got.push(resp);
            }
        }
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].get("name"), Some("ether1"));
        assert_eq!(got[1].status, Status::Done);
        assert_eq!(buf.buffered_len(), 0);
    }

    #[test]
    fn buffer_reports_bad_prefix_early() {
        let mut buf = SentenceBuffer::new();
        buf.push(&[0xF8, 0x01]);
        assert!(matches!(
            buf.next_sentence(),
            Err(ProtocolError::InvalidLengthPrefix(_))
        ));
    }
}
