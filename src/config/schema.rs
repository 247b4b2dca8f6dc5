//! Host configuration types and validation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Top-level host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Plugins to run, in declaration order
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,

    /// Optional directory scanned for `*.toml` plugin manifests; discovered
    /// plugins run after the explicitly configured ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<PathBuf>,

    /// Default timeout for a single plugin invocation (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Concurrent plugin invocations: 1 = sequential, 0 = one per CPU
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
}

/// One plugin descriptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginSpec {
    /// Identifier used in reports and logs
    pub name: String,

    /// Executable to run
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the child process
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Override the default invocation timeout (milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// A failing required plugin makes the host exit non-zero after the run
    #[serde(default)]
    pub required: bool,

    /// Working directory for the child process; manifest discovery sets
    /// this to the manifest's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrent() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            plugin_dir: None,
            default_timeout_ms: default_timeout_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout_ms < 100 {
            return Err(ConfigError::Validation(
                "default_timeout_ms must be at least 100ms".into(),
            ));
        }
        if self.default_timeout_ms > 600_000 {
            return Err(ConfigError::Validation(
                "default_timeout_ms cannot exceed 600000ms (10 minutes)".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for plugin in &self.plugins {
            if plugin.name.is_empty() {
                return Err(ConfigError::Validation("Plugin has empty name".into()));
            }
            if plugin.command.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Plugin '{}' has empty command",
                    plugin.name
                )));
            }
            if !seen.insert(&plugin.name) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate plugin name '{}'",
                    plugin.name
                )));
            }
            if let Some(timeout_ms) = plugin.timeout_ms {
                if timeout_ms < 100 {
                    return Err(ConfigError::Validation(format!(
                        "Plugin '{}' timeout_ms must be at least 100ms",
                        plugin.name
                    )));
                }
                if timeout_ms > 600_000 {
                    return Err(ConfigError::Validation(format!(
                        "Plugin '{}' timeout_ms cannot exceed 600000ms (10 minutes)",
                        plugin.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Enabled plugins in declaration order.
    pub fn enabled_plugins(&self) -> Vec<PluginSpec> {
        self.plugins.iter().filter(|p| p.enabled).cloned().collect()
    }

    /// Effective timeout for one plugin.
    pub fn plugin_timeout_ms(&self, plugin: &PluginSpec) -> u64 {
        plugin.timeout_ms.unwrap_or(self.default_timeout_ms)
    }

    /// Worker count for the runner; `0` means one per CPU.
    pub fn effective_concurrency(&self) -> usize {
        match self.max_concurrent {
            0 => num_cpus::get(),
            n => n as usize,
        }
    }
}
