//! Plugin manifest discovery
//!
//! Besides the plugin list in the host configuration, a plugin directory
//! can carry one `*.toml` manifest per plugin:
//!
//! ```toml
//! name = "docblock"
//! command = "./docblock-plugin"
//! args = ["--strict"]
//! timeout_ms = 5000
//! ```
//!
//! Discovered plugins are appended after the configured ones, in
//! lexicographic manifest-path order, so the aggregation order stays
//! deterministic across filesystems.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::PluginSpec;
use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

/// Scan a directory for plugin manifests.
///
/// A missing directory is not an error; an unreadable or invalid manifest
/// is, since running with a silently dropped plugin would be worse.
pub fn discover(plugin_dir: &Path) -> Result<Vec<PluginSpec>, ConfigError> {
    if !plugin_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = fs::read_dir(plugin_dir)
        .map_err(|e| ConfigError::Manifest {
            path: plugin_dir.to_path_buf(),
            reason: format!("Failed to read plugin directory: {e}"),
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
        .collect();
    paths.sort();

    let mut specs = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| ConfigError::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let manifest_dir = path.parent().unwrap_or(plugin_dir);

        // "./x" resolves relative to the manifest, and the plugin runs
        // with the manifest's directory as its working directory.
        let command = match manifest.command.strip_prefix("./") {
            Some(rest) => manifest_dir.join(rest).display().to_string(),
            None => manifest.command,
        };

        specs.push(PluginSpec {
            name: manifest.name,
            command,
            args: manifest.args,
            env: manifest.env,
            timeout_ms: manifest.timeout_ms,
            enabled: true,
            required: false,
            working_dir: Some(manifest_dir.to_path_buf()),
        });
    }

    Ok(specs)
}
