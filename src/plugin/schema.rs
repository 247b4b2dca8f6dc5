//! Plugin wire schema
//!
//! One request/response pair per plugin process, UTF-8 JSON over stdio:
//!
//! 1. Host writes a single object to the plugin's stdin, then closes it:
//!    `{ "source": "<file text>", "file": "path/to/file" }`
//! 2. Plugin writes a single object to stdout and exits:
//!    `{ "edits": [ { "start": 10, "end": 20, "replacement": "...", "message": "..." } ] }`
//!
//! Offsets are codepoint indices into `source` as supplied. A response
//! without an `edits` key is the empty list, not an error.

use serde::{Deserialize, Serialize};

use crate::edit::Edit;
use crate::error::TransportError;

/// Input sent to a plugin process via stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequest {
    /// Full original file text, immutable for the duration of a run
    pub source: String,

    /// Advisory path string; the host never resolves or opens it on the
    /// plugin's behalf
    pub file: String,
}

/// Output read from a plugin process's stdout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginResponse {
    /// Proposed edits in emission order; not assumed sorted by offset
    #[serde(default)]
    pub edits: Vec<Edit>,
}

impl PluginRequest {
    pub fn new(source: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            file: file.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Io {
            reason: format!("Failed to serialize request: {e}"),
        })
    }
}

impl PluginResponse {
    /// Schema-validating decode: anything that is not a JSON object with
    /// well-formed `edits` entries is malformed. Field presence and types
    /// are never trusted without this check.
    pub fn from_json(json: &str) -> Result<Self, TransportError> {
        serde_json::from_str(json).map_err(|e| TransportError::Malformed {
            reason: format!("Failed to parse response JSON: {e}"),
        })
    }
}
