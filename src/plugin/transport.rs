//! Plugin process invocation
//!
//! The transport owns the whole child-process lifecycle for exactly one
//! request/response exchange: spawn, write the request, close stdin, drain
//! stdout/stderr until exit, and forcibly terminate on timeout.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::plugin::schema::{PluginRequest, PluginResponse};

/// Capability boundary around one plugin invocation.
///
/// A single method keeps the seam narrow: the process transport below is
/// the production implementation, and tests substitute doubles that return
/// canned responses without spawning anything.
#[async_trait]
pub trait PluginTransport: Send + Sync {
    async fn invoke(
        &self,
        request: &PluginRequest,
        timeout: Duration,
    ) -> Result<PluginResponse, TransportError>;
}

/// Runs a plugin as a child process, one process per `invoke` call.
pub struct ProcessTransport {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
}

impl ProcessTransport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }
}

#[async_trait]
impl PluginTransport for ProcessTransport {
    async fn invoke(
        &self,
        request: &PluginRequest,
        timeout: Duration,
    ) -> Result<PluginResponse, TransportError> {
        let payload = request.to_json()?;

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true); // Prevent zombie processes

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| TransportError::Spawn {
            reason: format!("{}: {e}", self.command),
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| TransportError::Io {
            reason: "stdin is not available".to_string(),
        })?;

        debug!(bytes = payload.len(), "Writing request");

        // The whole exchange runs under the timeout: a plugin that stops
        // reading its input can stall the write just as surely as one that
        // never exits. On expiry the dropped future takes the child with
        // it, and kill_on_drop terminates the process.
        let exchange = async move {
            // A plugin may exit before draining its input; its exit status
            // is more informative than the broken pipe, so write failures
            // do not short-circuit output collection. Closing stdin
            // signals end-of-input to plugins that do read.
            let write_result = async {
                stdin.write_all(payload.as_bytes()).await?;
                stdin.shutdown().await
            }
            .await;
            if let Err(e) = write_result {
                debug!(error = %e, "Plugin stopped reading its input early");
            }
            drop(stdin);

            child.wait_with_output().await
        };

        let output = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })?
            .map_err(|e| TransportError::Io {
                reason: format!("Failed to collect plugin output: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            // The output may still parse; it is discarded either way, but
            // the count makes the report explicable.
            if let Ok(parsed) = PluginResponse::from_json(stdout.trim()) {
                warn!(
                    code,
                    edits = parsed.edits.len(),
                    "Discarding well-formed output from plugin that exited non-zero"
                );
            }

            return Err(TransportError::Exit { code, stderr });
        }

        PluginResponse::from_json(stdout.trim())
    }
}
