//! Low-level decoding of the two text-bearing PNG chunk types.
//!
//! This module implements the field-level parsing of `tEXt` and `iTXt`
//! payloads. Failures here are per-chunk: the metadata stage folds the
//! results and drops the chunks that did not decode, so a single bad chunk
//! never fails an extraction.
//!
//! ## Payload Layouts
//!
//! `tEXt`:
//! - keyword (Latin-1), NUL, text (UTF-8)
//!
//! `iTXt`:
//! - keyword (Latin-1), NUL
//! - compression flag (1 byte), compression method (1 byte)
//! - language tag, NUL
//! - translated keyword, NUL
//! - text (UTF-8, remainder)
//!
//! The compression flag is read but never acted on: a flagged-compressed
//! payload is still decoded as raw UTF-8 rather than inflated first. The
//! language tag and translated keyword are located only to skip them.

use thiserror::Error;
use tracing::debug;

/// A decoded keyword/text pair from a text-bearing chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The Latin-1 keyword naming this entry
    pub keyword: String,
    /// The UTF-8 text body
    pub text: String,
}

/// Why a single text chunk failed to decode.
///
/// The extraction pipeline skips the chunk instead of surfacing these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecodeError {
    /// A required NUL separator was not found
    #[error("missing NUL separator")]
    MissingNullSeparator,
    /// Payload ended inside the fixed iTXt header fields
    #[error("payload truncated inside header fields")]
    TruncatedHeader,
}

/// Decode a byte slice as Latin-1, one byte per character. Total.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decode a byte slice as UTF-8, replacing invalid sequences with U+FFFD.
fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Position of the first NUL at or after `from`
fn find_nul(payload: &[u8], from: usize) -> Option<usize> {
    payload[from..].iter().position(|&b| b == 0).map(|i| from + i)
}

/// Decode a `tEXt` payload: Latin-1 keyword, NUL, UTF-8 text.
pub fn decode_text(payload: &[u8]) -> std::result::Result<TextChunk, TextDecodeError> {
    let sep = find_nul(payload, 0).ok_or(TextDecodeError::MissingNullSeparator)?;
    Ok(TextChunk {
        keyword: decode_latin1(&payload[..sep]),
        text: decode_utf8(&payload[sep + 1..]),
    })
}

/// Decode an `iTXt` payload.
///
/// The compression flag and method bytes are skipped, the language tag and
/// translated keyword are discarded, and the remaining bytes are decoded as
/// UTF-8 regardless of what the compression flag claims.
pub fn decode_international_text(
    payload: &[u8],
) -> std::result::Result<TextChunk, TextDecodeError> {
    let keyword_end = find_nul(payload, 0).ok_or(TextDecodeError::MissingNullSeparator)?;
    let keyword = decode_latin1(&payload[..keyword_end]);

    // compression flag + compression method
    let lang_start = keyword_end + 3;
    if lang_start > payload.len() {
        return Err(TextDecodeError::TruncatedHeader);
    }
    let compression_flag = payload[keyword_end + 1];
    if compression_flag != 0 {
        debug!(
            "iTXt '{}' flags compressed text; decoding bytes as UTF-8 without inflating",
            keyword
        );
    }

    let lang_end = find_nul(payload, lang_start).ok_or(TextDecodeError::MissingNullSeparator)?;
    let translated_end =
        find_nul(payload, lang_end + 1).ok_or(TextDecodeError::MissingNullSeparator)?;

    Ok(TextChunk {
        keyword,
        text: decode_utf8(&payload[translated_end + 1..]),
    })
}

/// Encode a keyword/text pair into the `tEXt` payload layout.
///
/// The inverse of [`decode_text`] for Latin-1-safe keywords and UTF-8 text;
/// useful for building fixtures and round-trip checks.
pub fn encode_text(keyword: &str, text: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(keyword.len() + 1 + text.len());
    payload.extend(keyword.chars().map(|c| c as u8));
    payload.push(0);
    payload.extend_from_slice(text.as_bytes());
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_text_simple() {
        let chunk = decode_text(b"prompt\0a cat").unwrap();
        assert_eq!(chunk.keyword, "prompt");
        assert_eq!(chunk.text, "a cat");
    }

    #[test]
    fn test_decode_text_empty_text() {
        let chunk = decode_text(b"prompt\0").unwrap();
        assert_eq!(chunk.keyword, "prompt");
        assert_eq!(chunk.text, "");
    }

    #[test]
    fn test_decode_text_missing_separator() {
        assert_eq!(
            decode_text(b"no separator here"),
            Err(TextDecodeError::MissingNullSeparator)
        );
    }

    #[test]
    fn test_decode_text_latin1_keyword() {
        // 0xE9 is 'é' in Latin-1 but an invalid UTF-8 sequence on its own
        let chunk = decode_text(b"caf\xE9\0body").unwrap();
        assert_eq!(chunk.keyword, "café");
        assert_eq!(chunk.text, "body");
    }

    #[test]
    fn test_decode_text_invalid_utf8_is_lossy() {
        let chunk = decode_text(b"k\0bad \xFF byte").unwrap();
        assert_eq!(chunk.keyword, "k");
        assert_eq!(chunk.text, "bad \u{FFFD} byte");
    }

    #[test]
    fn test_decode_international_text() {
        // keyword NUL flag method lang NUL translated NUL text
        let payload = b"Comment\0\0\0en-us\0Kommentar\0ein Hund";
        let chunk = decode_international_text(payload).unwrap();
        assert_eq!(chunk.keyword, "Comment");
        assert_eq!(chunk.text, "ein Hund");
    }

    #[test]
    fn test_decode_international_text_empty_fields() {
        let payload = b"k\0\0\0\0\0text";
        let chunk = decode_international_text(payload).unwrap();
        assert_eq!(chunk.keyword, "k");
        assert_eq!(chunk.text, "text");
    }

    #[test]
    fn test_decode_international_text_compressed_flag_passthrough() {
        // Flag set: bytes still come back as (lossy) UTF-8, not inflated
        let payload = b"k\0\x01\0en\0\0raw bytes";
        let chunk = decode_international_text(payload).unwrap();
        assert_eq!(chunk.text, "raw bytes");
    }

    #[test]
    fn test_decode_international_text_truncated() {
        assert_eq!(
            decode_international_text(b"k\0\x01"),
            Err(TextDecodeError::TruncatedHeader)
        );
        assert_eq!(
            decode_international_text(b"k\0\0\0en-us"),
            Err(TextDecodeError::MissingNullSeparator)
        );
        assert_eq!(
            decode_international_text(b"no nul at all"),
            Err(TextDecodeError::MissingNullSeparator)
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let payload = encode_text("prompt", "a cat sitting on a mat");
        let chunk = decode_text(&payload).unwrap();
        assert_eq!(chunk.keyword, "prompt");
        assert_eq!(chunk.text, "a cat sitting on a mat");
    }

    #[test]
    fn test_encode_text_layout() {
        assert_eq!(encode_text("k", "v"), b"k\0v");
    }
}
