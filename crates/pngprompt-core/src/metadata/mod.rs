//! Text metadata collection and structured parsing.
//!
//! This module turns the framed chunk sequence into the keyword-indexed
//! metadata a caller receives: first a [`TextMap`] of decoded keyword/text
//! pairs, then a [`Metadata`] map whose values have been JSON-parsed where
//! possible.
//!
//! ## Architecture
//!
//! 1. [`TextMap::from_chunks`] folds the chunk sequence, decoding `tEXt` and
//!    `iTXt` payloads and silently skipping any chunk that fails to decode.
//! 2. [`parse_values`] attempts `serde_json` parsing of every text value,
//!    keeping the raw string when parsing fails.
//! 3. [`mine`] walks the parsed values for string leaves and selects the
//!    likely prompt.
//!
//! Both maps are insertion-ordered: a repeated keyword replaces the earlier
//! value but keeps its original position, so iteration order is stable for
//! a given input.

pub mod mine;

use crate::chunk::{decode_international_text, decode_text, Chunk, ChunkType};
use serde::Serialize;
use tracing::{debug, trace};

pub use mine::{LongestString, SelectStrategy};

/// Decoded text-chunk entries, keyword to text, in first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMap {
    entries: Vec<(String, String)>,
}

impl TextMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a keyword/text pair.
    ///
    /// A repeated keyword replaces the existing value in place; the entry
    /// keeps its original position.
    pub fn insert(&mut self, keyword: String, text: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == keyword) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((keyword, text)),
        }
    }

    /// Returns the text stored under `keyword`, if any
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, t)| t.as_str())
    }

    /// Number of distinct keywords
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no text chunk decoded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t.as_str()))
    }

    /// Folds a chunk sequence into a text map.
    ///
    /// Only `tEXt` and `iTXt` chunks are considered; a chunk that fails to
    /// decode is skipped, never fatal. `max_chunks` bounds how many text
    /// chunks are decoded (0 = unlimited).
    pub fn from_chunks(chunks: &[Chunk<'_>], max_chunks: usize) -> Self {
        let mut map = Self::new();
        let mut decoded = 0usize;

        for chunk in chunks.iter().filter(|c| c.tag.is_text()) {
            if max_chunks > 0 && decoded >= max_chunks {
                debug!("Reached text chunk limit of {}, stopping", max_chunks);
                break;
            }

            let result = if chunk.tag == ChunkType::TEXT {
                decode_text(chunk.payload)
            } else {
                decode_international_text(chunk.payload)
            };

            match result {
                Ok(text_chunk) => {
                    trace!(
                        "Decoded {:?} chunk '{}' ({} chars)",
                        chunk.tag,
                        text_chunk.keyword,
                        text_chunk.text.len()
                    );
                    map.insert(text_chunk.keyword, text_chunk.text);
                    decoded += 1;
                }
                Err(e) => {
                    trace!("Skipping undecodable {:?} chunk: {}", chunk.tag, e);
                }
            }
        }

        debug!("Collected {} text entries", map.len());
        map
    }
}

/// A metadata value: JSON-parsed when the text parsed, raw text otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// The text parsed as JSON
    Structured(serde_json::Value),
    /// The text as stored in the chunk; it did not parse as JSON
    Raw(String),
}

impl MetadataValue {
    /// Returns the parsed JSON value, if this entry parsed
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// Returns the raw fallback text, if this entry did not parse
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Self::Structured(_) => None,
            Self::Raw(s) => Some(s),
        }
    }
}

/// Keyword-indexed parsed metadata, in first-insertion order.
///
/// This is the mapping returned to callers alongside the selected prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetadataValue)>,
}

impl Metadata {
    /// Returns the value stored under `keyword`, if any
    pub fn get(&self, keyword: &str) -> Option<&MetadataValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates the keywords in insertion order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for Metadata {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parse every text value as JSON, falling back to the raw string.
pub fn parse_values(text: &TextMap) -> Metadata {
    let mut entries = Vec::with_capacity(text.len());

    for (keyword, value) in text.iter() {
        match serde_json::from_str::<serde_json::Value>(value) {
            Ok(parsed) => {
                trace!("Keyword '{}' parsed as JSON", keyword);
                entries.push((keyword.to_owned(), MetadataValue::Structured(parsed)));
            }
            Err(e) => {
                trace!("Keyword '{}' kept raw: {}", keyword, e);
                entries.push((keyword.to_owned(), MetadataValue::Raw(value.to_owned())));
            }
        }
    }

    Metadata { entries }
}
