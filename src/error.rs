use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read source file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write rewritten file {path}: {source}")]
    SourceWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Manifest error in {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },
}

/// Transport-level failures, scoped to a single plugin invocation.
///
/// The runner records these per plugin; none of them abort the run as a
/// whole.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to spawn plugin process: {reason}")]
    Spawn { reason: String },

    #[error("Plugin timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Plugin exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("Plugin returned malformed response: {reason}")]
    Malformed { reason: String },

    #[error("Plugin I/O error: {reason}")]
    Io { reason: String },
}

pub type Result<T> = std::result::Result<T, HostError>;
