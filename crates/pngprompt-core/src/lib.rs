//! # pngprompt-core
//!
//! A library for recovering generation prompts embedded in PNG text metadata.
//!
//! Node-based image-generation pipelines store their workflow, including the
//! text prompt, in the PNG's ancillary `tEXt`/`iTXt` chunks. This crate
//! provides the core functionality for:
//!
//! - Validating the PNG signature and framing the chunk sequence
//! - Decoding the two text-bearing chunk types
//! - Mining the decoded metadata for the likely prompt
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`chunk`]: Signature validation, chunk framing and text-chunk decoding
//! - [`metadata`]: Keyword-indexed metadata, JSON parsing and prompt mining
//! - [`extract`]: The pipeline orchestrator
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use pngprompt_core::Extractor;
//! use std::fs;
//!
//! // Read a PNG file
//! let data = fs::read("./render_00042_.png")?;
//!
//! // Run the extraction pipeline
//! let extraction = Extractor::new().extract(&data)?;
//!
//! println!("{}", extraction.prompt);
//! for keyword in extraction.metadata.keywords() {
//!     println!("metadata under '{}'", keyword);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! The [`SelectStrategy`] trait customizes which string the miner picks when
//! the longest-string default is not the right heuristic for your metadata.
//!
//! ## Known limitations
//!
//! - `iTXt` chunks flagged as compressed are not inflated; their payload
//!   bytes are decoded as UTF-8 as-is.
//! - Chunk CRCs are skipped, not verified.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod chunk;
pub mod error;
pub mod extract;
pub mod metadata;

// Re-export primary types for convenience
pub use chunk::{Chunk, ChunkType, TextChunk, PNG_SIGNATURE};
pub use error::{Error, Result};
pub use extract::{extract_file, extract_file_with_config, Extraction, Extractor, ExtractorConfig};
pub use metadata::{LongestString, Metadata, MetadataValue, SelectStrategy, TextMap};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
