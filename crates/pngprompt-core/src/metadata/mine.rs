//! String-leaf traversal and prompt selection.
//!
//! This module provides the [`SelectStrategy`] trait for choosing a prompt
//! out of parsed metadata, and the default [`LongestString`] heuristic.
//!
//! The default assumes the generation prompt is the longest string anywhere
//! in the metadata. That holds for the typical output of node-based
//! generation pipelines, whose workflow JSON buries the prompt among many
//! short identifiers, but it is a heuristic, not a guarantee. Callers that
//! know their metadata shape better can implement [`SelectStrategy`]
//! themselves.

use super::{Metadata, MetadataValue};
use serde_json::Value;

/// Collect every string leaf reachable from `value`, depth-first pre-order.
///
/// Arrays are walked in index order and objects in document order; numbers,
/// booleans and null are not leaves.
pub fn collect_strings<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Trait for implementing custom prompt selection policies
///
/// This trait allows you to plug in a different heuristic for picking the
/// prompt out of the parsed metadata.
pub trait SelectStrategy: Send + Sync {
    /// Select the prompt from the metadata, or `None` if there is no candidate
    fn select(&self, metadata: &Metadata) -> Option<String>;
}

/// Default selection policy: the longest string wins.
///
/// Candidates are every string leaf of every parsed value, plus each raw
/// fallback text as a single candidate. Length is counted in characters,
/// and the first-seen candidate wins ties, so selection is deterministic
/// for a given input.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestString;

impl SelectStrategy for LongestString {
    fn select(&self, metadata: &Metadata) -> Option<String> {
        let mut best: Option<&str> = None;
        let mut best_len = 0usize;

        for (_, value) in metadata.iter() {
            let mut candidates = Vec::new();
            match value {
                MetadataValue::Structured(parsed) => collect_strings(parsed, &mut candidates),
                MetadataValue::Raw(text) => candidates.push(text.as_str()),
            }

            for candidate in candidates {
                let len = candidate.chars().count();
                if best.is_none() || len > best_len {
                    best = Some(candidate);
                    best_len = len;
                }
            }
        }

        best.map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{parse_values, TextMap};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn metadata_from(pairs: &[(&str, &str)]) -> Metadata {
        let mut text = TextMap::new();
        for (k, v) in pairs {
            text.insert((*k).into(), (*v).into());
        }
        parse_values(&text)
    }

    #[test]
    fn test_collect_strings_nested() {
        let value = json!({
            "nodes": {
                "1": {"text": "a cat sitting", "seed": 42},
                "2": {"text": "cat", "enabled": true}
            },
            "tags": ["fluffy", null]
        });
        let mut out = Vec::new();
        collect_strings(&value, &mut out);
        assert_eq!(out, vec!["a cat sitting", "cat", "fluffy"]);
    }

    #[test]
    fn test_collect_strings_scalars_are_not_leaves() {
        let mut out = Vec::new();
        let num = json!(42);
        let boolean = json!(true);
        let null = json!(null);
        collect_strings(&num, &mut out);
        collect_strings(&boolean, &mut out);
        collect_strings(&null, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_longest_string_picks_longest_leaf() {
        let metadata = metadata_from(&[(
            "workflow",
            r#"{"nodes":{"1":{"text":"a cat sitting"},"2":{"text":"cat"}}}"#,
        )]);
        assert_eq!(
            LongestString.select(&metadata),
            Some("a cat sitting".to_string())
        );
    }

    #[test]
    fn test_longest_string_raw_fallback_competes() {
        let metadata = metadata_from(&[
            ("short", r#"{"text":"tiny"}"#),
            ("note", "this raw text is clearly the longest candidate"),
        ]);
        assert_eq!(
            LongestString.select(&metadata),
            Some("this raw text is clearly the longest candidate".to_string())
        );
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let metadata = metadata_from(&[("a", r#"["first","blurb"]"#)]);
        assert_eq!(LongestString.select(&metadata), Some("first".to_string()));

        // Ties across keywords resolve by insertion order too
        let metadata = metadata_from(&[("x", "alpha"), ("y", "bravo")]);
        assert_eq!(LongestString.select(&metadata), Some("alpha".to_string()));
    }

    #[test]
    fn test_object_walk_follows_document_order() {
        // Equal-length strings under keys that sort the other way around:
        // the one written first in the document must win the tie
        let metadata = metadata_from(&[("w", r#"{"zebra":"aaaa","apple":"bbbb"}"#)]);
        assert_eq!(LongestString.select(&metadata), Some("aaaa".to_string()));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Four characters of kana outweigh a three-character ASCII string
        // even though byte counts would say otherwise either way
        let metadata = metadata_from(&[("a", r#"["ねこです","cat"]"#)]);
        assert_eq!(LongestString.select(&metadata), Some("ねこです".to_string()));
    }

    #[test]
    fn test_no_candidates() {
        let metadata = metadata_from(&[("counts", "[1,2,3]")]);
        assert_eq!(LongestString.select(&metadata), None);

        let empty = metadata_from(&[]);
        assert_eq!(LongestString.select(&empty), None);
    }

    #[test]
    fn test_empty_string_candidate_is_selectable() {
        let metadata = metadata_from(&[("only", r#"[""]"#)]);
        assert_eq!(LongestString.select(&metadata), Some(String::new()));
    }
}
