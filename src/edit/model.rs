//! Edit value types and offset validation
//!
//! Offsets are Unicode codepoint indices into the original source text,
//! never byte indices. An edit is a half-open range `[start, end)` plus the
//! replacement text; `start == end` denotes a pure insertion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single proposed text change against the original source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Codepoint offset where the replaced range starts
    pub start: usize,

    /// Codepoint offset one past the end of the replaced range
    pub end: usize,

    /// Text substituted for the range
    pub replacement: String,

    /// Human-readable description; not used in text computation
    #[serde(default)]
    pub message: String,
}

/// An edit tagged with the plugin that produced it.
///
/// The origin is diagnostic only; it never influences merge priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedEdit {
    #[serde(flatten)]
    pub edit: Edit,
    pub origin: String,
}

/// Why an edit was excluded from the merged output.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("Edit range {start}..{end} out of bounds for source length {len}")]
    OffsetOutOfRange { start: usize, end: usize, len: usize },

    #[error("Edit range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },

    #[error("Edit at {start} overlaps a previously accepted edit ending at {prior_end}")]
    Overlap { start: usize, prior_end: usize },
}

impl Edit {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
            message: String::new(),
        }
    }

    pub fn with_message(
        start: usize,
        end: usize,
        replacement: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
            message: message.into(),
        }
    }

    /// True when the edit inserts without replacing anything.
    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    /// Check the offset invariant against a source of `len` codepoints.
    ///
    /// Violations are reported, never clamped.
    pub fn validate(&self, len: usize) -> std::result::Result<(), RejectReason> {
        if self.start > self.end {
            return Err(RejectReason::InvertedRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.end > len {
            return Err(RejectReason::OffsetOutOfRange {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(())
    }
}

impl AggregatedEdit {
    pub fn new(edit: Edit, origin: impl Into<String>) -> Self {
        Self {
            edit,
            origin: origin.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_edit() {
        let edit = Edit::new(2, 5, "xyz");
        assert!(edit.validate(10).is_ok());
    }

    #[test]
    fn test_insertion_at_end_is_valid() {
        let edit = Edit::new(10, 10, "tail");
        assert!(edit.is_insertion());
        assert!(edit.validate(10).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        let edit = Edit::new(8, 12, "Z");
        assert_eq!(
            edit.validate(10),
            Err(RejectReason::OffsetOutOfRange {
                start: 8,
                end: 12,
                len: 10
            })
        );
    }

    #[test]
    fn test_inverted_range() {
        let edit = Edit::new(5, 3, "x");
        assert_eq!(
            edit.validate(10),
            Err(RejectReason::InvertedRange { start: 5, end: 3 })
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let edit = Edit::new(0, 4, "ok");
        assert!(edit.validate(10).is_ok());
        assert!(edit.validate(10).is_ok());

        let bad = Edit::new(9, 12, "no");
        assert_eq!(bad.validate(10), bad.validate(10));
    }

    #[test]
    fn test_message_defaults_empty_on_wire() {
        let edit: Edit = serde_json::from_str(r#"{"start":1,"end":2,"replacement":"a"}"#).unwrap();
        assert_eq!(edit.message, "");
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let result = serde_json::from_str::<Edit>(r#"{"start":1,"end":2}"#);
        assert!(result.is_err());
    }
}
