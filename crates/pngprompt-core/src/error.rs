//! Error types for the pngprompt-core library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate,
//! with one variant per user-facing failure category.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pngprompt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all pngprompt operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input does not start with the PNG prefix at all
    #[error("not a PNG file: {details}")]
    NotPng {
        /// Description of what was found instead
        details: String,
    },

    /// Input has the PNG prefix but a corrupt remainder of the 8-byte signature
    #[error("invalid PNG signature: byte {offset} is 0x{found:02X}, expected 0x{expected:02X}")]
    InvalidSignature {
        /// Offset of the first mismatching signature byte
        offset: usize,
        /// The byte found at that offset
        found: u8,
        /// The byte the signature requires
        expected: u8,
    },

    /// A chunk's declared length is inconsistent with the remaining buffer
    #[error("malformed chunk at offset {offset}: {details}")]
    MalformedChunk {
        /// Byte offset of the chunk header
        offset: usize,
        /// Detailed description of the inconsistency
        details: String,
    },

    /// No text-bearing chunks decoded from the input
    #[error("no text metadata found in PNG")]
    NoMetadata,

    /// Metadata existed but contained no non-empty string candidate
    #[error("no prompt found in PNG metadata")]
    NoPromptFound,
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new not-a-PNG error
    pub fn not_png(details: impl Into<String>) -> Self {
        Self::NotPng {
            details: details.into(),
        }
    }

    /// Creates a new invalid signature error
    pub fn invalid_signature(offset: usize, found: u8, expected: u8) -> Self {
        Self::InvalidSignature {
            offset,
            found,
            expected,
        }
    }

    /// Creates a new malformed chunk error
    pub fn malformed_chunk(offset: usize, details: impl Into<String>) -> Self {
        Self::MalformedChunk {
            offset,
            details: details.into(),
        }
    }

    /// Returns true if this is a per-file failure that a batch run should skip
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotPng { .. }
                | Self::InvalidSignature { .. }
                | Self::MalformedChunk { .. }
                | Self::NoMetadata
                | Self::NoPromptFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed_chunk(42, "length exceeds remaining buffer");
        assert!(err.to_string().contains("offset 42"));
        assert!(err.to_string().contains("length exceeds remaining buffer"));
    }

    #[test]
    fn test_not_png_display() {
        let err = Error::not_png("first bytes are 0x25504446");
        assert!(err.to_string().starts_with("not a PNG file"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::NoMetadata.is_recoverable());
        assert!(Error::not_png("junk").is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!Error::file_read("/missing.png", io).is_recoverable());
    }
}
