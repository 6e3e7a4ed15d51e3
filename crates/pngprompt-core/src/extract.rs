//! Extraction pipeline over one PNG byte buffer.
//!
//! This module sequences the stages — signature validation, chunk framing,
//! text decoding, metadata mining — and maps each stage's failure to a
//! user-facing error category.
//!
//! The pipeline is synchronous and stateless: one buffer in, one
//! [`Extraction`] or [`Error`](crate::Error) out, no state retained between
//! calls. Batch callers can run extractions in parallel freely.
//!
//! ## Extensibility
//!
//! The [`SelectStrategy`] trait allows a custom selection policy:
//!
//! ```no_run
//! use pngprompt_core::{Extractor, Metadata, SelectStrategy};
//!
//! struct FirstKeyword;
//!
//! impl SelectStrategy for FirstKeyword {
//!     fn select(&self, metadata: &Metadata) -> Option<String> {
//!         metadata.iter().next().and_then(|(_, v)| v.as_raw()).map(String::from)
//!     }
//! }
//!
//! let extractor = Extractor::with_strategy(Box::new(FirstKeyword));
//! ```

use crate::chunk::{read_chunks, validate_signature};
use crate::error::{Error, Result};
use crate::metadata::{parse_values, LongestString, Metadata, SelectStrategy, TextMap};
use tracing::debug;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// Maximum number of text chunks to decode per file (0 = unlimited)
    pub max_text_chunks: usize,
}

impl ExtractorConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of text chunks to decode
    pub fn max_text_chunks(mut self, max: usize) -> Self {
        self.max_text_chunks = max;
        self
    }
}

/// Result of a successful extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The selected prompt text
    pub prompt: String,
    /// The full keyword-indexed metadata the prompt was selected from
    pub metadata: Metadata,
}

/// Primary entry point: runs the extraction pipeline over a byte buffer
pub struct Extractor {
    config: ExtractorConfig,
    strategy: Box<dyn SelectStrategy>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Creates an extractor with the default longest-string selection
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
            strategy: Box::new(LongestString),
        }
    }

    /// Creates an extractor with custom configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self {
            config,
            strategy: Box::new(LongestString),
        }
    }

    /// Creates an extractor with a custom selection strategy
    pub fn with_strategy(strategy: Box<dyn SelectStrategy>) -> Self {
        Self {
            config: ExtractorConfig::default(),
            strategy,
        }
    }

    /// Sets the selection strategy
    pub fn strategy(mut self, strategy: Box<dyn SelectStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Extract the prompt and metadata from a PNG byte buffer.
    ///
    /// Fails with [`Error::NotPng`] or [`Error::InvalidSignature`] when the
    /// signature check fails, [`Error::MalformedChunk`] when framing fails,
    /// [`Error::NoMetadata`] when no text chunk decoded, and
    /// [`Error::NoPromptFound`] when the metadata held no non-empty string.
    pub fn extract(&self, data: &[u8]) -> Result<Extraction> {
        validate_signature(data)?;

        let chunks = read_chunks(data)?;
        debug!("Framed {} chunks", chunks.len());

        let text = TextMap::from_chunks(&chunks, self.config.max_text_chunks);
        if text.is_empty() {
            return Err(Error::NoMetadata);
        }

        let metadata = parse_values(&text);
        let prompt = self.strategy.select(&metadata).unwrap_or_default();
        if prompt.is_empty() {
            return Err(Error::NoPromptFound);
        }

        debug!("Selected prompt of {} chars", prompt.chars().count());
        Ok(Extraction { prompt, metadata })
    }
}

/// Extract the prompt from a PNG file on disk.
///
/// This is a convenience function that reads the file and extracts from it.
pub fn extract_file(path: impl AsRef<std::path::Path>) -> Result<Extraction> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Extractor::new().extract(&data)
}

/// Extract from a file with custom configuration
pub fn extract_file_with_config(
    path: impl AsRef<std::path::Path>,
    config: ExtractorConfig,
) -> Result<Extraction> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Extractor::with_config(config).extract(&data)
}
