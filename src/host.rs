//! Host orchestration
//!
//! The only component that touches the file system: reads the target file,
//! drives the runner and merger, and writes the merged text back (or
//! renders a unified diff in dry-run mode). Everything in between operates
//! on in-memory text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::edit::{merge, MergeReport};
use crate::error::{HostError, Result};
use crate::plugin::{PluginOutcome, PluginRequest, PluginRunner};

/// Everything one file's run produced, for reporting and exit policy.
#[derive(Debug)]
pub struct FileReport {
    pub file: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub outcomes: Vec<PluginOutcome>,
    pub merge: MergeReport,
    pub changed: bool,
    /// Unified diff of the would-be change; present only in dry-run mode
    pub diff: Option<String>,
    pub required_failure: bool,
}

pub struct Host {
    config: Arc<Config>,
    runner: PluginRunner,
    dry_run: bool,
}

impl Host {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            runner: PluginRunner::new(config.clone()),
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rewrite one file in place (or diff it in dry-run mode).
    ///
    /// Plugin and edit failures are recorded in the report; the only
    /// errors surfaced here are the host's own I/O failures.
    pub async fn rewrite_file(&self, path: &Path) -> Result<FileReport> {
        let source = std::fs::read_to_string(path).map_err(|e| HostError::SourceRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let request = PluginRequest::new(source.clone(), path.display().to_string());
        let run = self.runner.run(&request).await;
        let required_failure = run.required_failure();

        let outcome = merge(&source, run.edits);
        let changed = outcome.changed();

        let mut diff = None;
        if changed {
            if self.dry_run {
                diff = Some(diffy::create_patch(&source, &outcome.text).to_string());
            } else {
                std::fs::write(path, &outcome.text).map_err(|e| HostError::SourceWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!(
            file = %path.display(),
            applied = outcome.report.applied.len(),
            rejected = outcome.report.rejected.len(),
            changed,
            dry_run = self.dry_run,
            "File processed"
        );

        Ok(FileReport {
            file: path.to_path_buf(),
            timestamp: Utc::now(),
            outcomes: run.outcomes,
            merge: outcome.report,
            changed,
            diff,
            required_failure,
        })
    }

    /// Invoke every enabled plugin against an empty source, reporting
    /// health without touching any file. Used by `check --probe`.
    pub async fn probe_plugins(&self) -> Vec<PluginOutcome> {
        let request = PluginRequest::new("", "<probe>");
        self.runner.run(&request).await.outcomes
    }
}
