//! PNG signature validation and chunk framing.
//!
//! This module walks the raw bytes of a PNG file and produces the ordered
//! chunk sequence that the metadata stage consumes.
//!
//! ## Format Overview
//!
//! A PNG file is an 8-byte signature followed by a series of chunks. Each
//! chunk is encoded as:
//!
//! - A 4-byte big-endian length of the payload
//! - A 4-byte ASCII type tag (e.g. `IHDR`, `tEXt`, `IEND`)
//! - The payload bytes
//! - A 4-byte CRC over tag and payload
//!
//! The walk stops once the `IEND` chunk has been appended, or when the
//! cursor reaches the end of the buffer. CRC bytes are skipped without
//! validation; corrupt-but-well-framed files parse the same as pristine
//! ones.

pub mod text;

use crate::error::{Error, Result};
use tracing::{debug, trace};

pub use text::{decode_international_text, decode_text, encode_text, TextChunk, TextDecodeError};

/// The 8-byte signature every PNG file starts with
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The first four signature bytes (`\x89PNG`), enough to recognize the format
pub const PNG_PREFIX: [u8; 4] = [137, 80, 78, 71];

/// Bytes of chunk header (length + type) plus trailing CRC
const CHUNK_OVERHEAD: usize = 12;

/// A 4-byte PNG chunk type tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Uncompressed Latin-1 keyword / UTF-8 text chunk
    pub const TEXT: Self = Self(*b"tEXt");
    /// International text chunk with language tag and compression flag
    pub const INTL_TEXT: Self = Self(*b"iTXt");
    /// Image header chunk
    pub const IMAGE_HEADER: Self = Self(*b"IHDR");
    /// Image data chunk
    pub const IMAGE_DATA: Self = Self(*b"IDAT");
    /// Terminal chunk marking the end of the PNG stream
    pub const IMAGE_END: Self = Self(*b"IEND");

    /// Returns the tag as raw bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Returns true for the two text-bearing chunk types
    pub fn is_text(&self) -> bool {
        *self == Self::TEXT || *self == Self::INTL_TEXT
    }
}

impl std::fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in &self.0 {
            std::fmt::Write::write_char(f, b as char)?;
        }
        Ok(())
    }
}

/// A single framed chunk, borrowing its payload from the input buffer
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// The 4-byte type tag
    pub tag: ChunkType,
    /// The payload, exactly as many bytes as the length field declared
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Returns the declared payload length
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Validate the 8-byte PNG signature at the start of `data`.
///
/// A buffer that does not even begin with `\x89PNG` fails as [`Error::NotPng`];
/// a buffer with the prefix but a corrupt remainder fails as
/// [`Error::InvalidSignature`].
pub fn validate_signature(data: &[u8]) -> Result<()> {
    if data.len() < PNG_PREFIX.len() || data[..PNG_PREFIX.len()] != PNG_PREFIX {
        let shown = &data[..data.len().min(4)];
        return Err(Error::not_png(format!(
            "first bytes are {:02X?}, expected {:02X?}",
            shown, PNG_PREFIX
        )));
    }

    if data.len() < PNG_SIGNATURE.len() {
        return Err(Error::not_png(format!(
            "buffer is only {} bytes, shorter than the 8-byte signature",
            data.len()
        )));
    }

    for (offset, (&found, &expected)) in data.iter().zip(PNG_SIGNATURE.iter()).enumerate() {
        if found != expected {
            return Err(Error::invalid_signature(offset, found, expected));
        }
    }

    Ok(())
}

/// Walk the chunk sequence of a signature-validated buffer.
///
/// Returns every chunk in file order, stopping after `IEND` or at the end of
/// the buffer. CRC bytes are skipped, not checked. Fails with
/// [`Error::MalformedChunk`] when a chunk header or payload read would run
/// past the end of the buffer.
pub fn read_chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>> {
    let mut chunks = Vec::new();
    let mut position = PNG_SIGNATURE.len();

    debug!("Framing chunks in {} bytes", data.len());

    while position < data.len() {
        if position + 8 > data.len() {
            return Err(Error::malformed_chunk(
                position,
                format!(
                    "truncated chunk header: {} bytes remain, need 8",
                    data.len() - position
                ),
            ));
        }

        let length = u32::from_be_bytes([
            data[position],
            data[position + 1],
            data[position + 2],
            data[position + 3],
        ]) as usize;

        let mut tag_bytes = [0u8; 4];
        tag_bytes.copy_from_slice(&data[position + 4..position + 8]);
        let tag = ChunkType(tag_bytes);

        let payload_start = position + 8;
        let payload_end = payload_start
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                Error::malformed_chunk(
                    position,
                    format!(
                        "declared length {} exceeds {} remaining bytes",
                        length,
                        data.len() - payload_start
                    ),
                )
            })?;

        trace!("Chunk {:?} at offset {} ({} bytes)", tag, position, length);

        chunks.push(Chunk {
            tag,
            payload: &data[payload_start..payload_end],
        });

        if tag == ChunkType::IMAGE_END {
            break;
        }

        // Advance past payload and the unvalidated CRC
        position += CHUNK_OVERHEAD + length;
    }

    debug!("Framed {} chunks", chunks.len());
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Append a chunk with a zeroed (unchecked) CRC
    fn push_chunk(buf: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(tag);
        buf.extend_from_slice(payload);
        buf.extend_from_slice(&[0u8; 4]);
    }

    fn png_with_chunks(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut buf = PNG_SIGNATURE.to_vec();
        for (tag, payload) in chunks {
            push_chunk(&mut buf, tag, payload);
        }
        buf
    }

    #[test]
    fn test_validate_signature_ok() {
        let buf = png_with_chunks(&[(b"IEND", &[])]);
        assert!(validate_signature(&buf).is_ok());
    }

    #[test]
    fn test_validate_signature_not_png() {
        assert!(matches!(
            validate_signature(b"%PDF-1.7"),
            Err(Error::NotPng { .. })
        ));
        assert!(matches!(validate_signature(&[]), Err(Error::NotPng { .. })));
        // PNG prefix present but buffer too short for the full signature
        assert!(matches!(
            validate_signature(&PNG_PREFIX),
            Err(Error::NotPng { .. })
        ));
    }

    #[test]
    fn test_validate_signature_corrupt_tail() {
        let mut buf = PNG_SIGNATURE.to_vec();
        buf[6] = 0xFF;
        match validate_signature(&buf) {
            Err(Error::InvalidSignature { offset, found, .. }) => {
                assert_eq!(offset, 6);
                assert_eq!(found, 0xFF);
            }
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn test_read_chunks_stops_at_iend() {
        let buf = png_with_chunks(&[
            (b"IHDR", &[0u8; 13]),
            (b"IEND", &[]),
            (b"tEXt", b"after\0end"),
        ]);
        let chunks = read_chunks(&buf).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].tag, ChunkType::IMAGE_HEADER);
        assert_eq!(chunks[1].tag, ChunkType::IMAGE_END);
    }

    #[test]
    fn test_read_chunks_without_iend() {
        let buf = png_with_chunks(&[(b"IHDR", &[0u8; 13]), (b"tEXt", b"k\0v")]);
        let chunks = read_chunks(&buf).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].payload, b"k\0v");
    }

    #[test]
    fn test_read_chunks_overstated_length() {
        let mut buf = PNG_SIGNATURE.to_vec();
        buf.extend_from_slice(&1000u32.to_be_bytes());
        buf.extend_from_slice(b"tEXt");
        buf.extend_from_slice(b"short");
        assert!(matches!(
            read_chunks(&buf),
            Err(Error::MalformedChunk { offset: 8, .. })
        ));
    }

    #[test]
    fn test_read_chunks_truncated_header() {
        let mut buf = PNG_SIGNATURE.to_vec();
        buf.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(
            read_chunks(&buf),
            Err(Error::MalformedChunk { .. })
        ));
    }

    #[test]
    fn test_read_chunks_empty_after_signature() {
        let chunks = read_chunks(&PNG_SIGNATURE).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_type_debug() {
        assert_eq!(format!("{:?}", ChunkType::TEXT), "tEXt");
        assert_eq!(format!("{:?}", ChunkType::IMAGE_END), "IEND");
    }

    #[test]
    fn test_is_text() {
        assert!(ChunkType::TEXT.is_text());
        assert!(ChunkType::INTL_TEXT.is_text());
        assert!(!ChunkType::IMAGE_DATA.is_text());
    }
}
