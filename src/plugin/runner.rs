//! Plugin orchestration
//!
//! Invokes the transport once per configured plugin, isolates each
//! plugin's failure, and aggregates origin-tagged edits. Invocations may
//! run with bounded concurrency, but results are reassembled by declared
//! position, so the aggregation order downstream of the runner is always
//! plugin declaration order, never completion order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, PluginSpec};
use crate::edit::AggregatedEdit;
use crate::error::TransportError;
use crate::plugin::schema::PluginRequest;
use crate::plugin::transport::{PluginTransport, ProcessTransport};

/// Builds a transport for one plugin descriptor. The default factory
/// spawns real processes; tests substitute canned transports.
pub type TransportFactory = dyn Fn(&PluginSpec) -> Arc<dyn PluginTransport> + Send + Sync;

/// Record of one plugin invocation.
#[derive(Debug)]
pub struct PluginOutcome {
    pub name: String,
    pub required: bool,
    pub duration_ms: u64,
    /// Number of edits contributed on success, transport failure otherwise
    pub result: Result<usize, TransportError>,
}

impl PluginOutcome {
    pub fn failed(&self) -> bool {
        self.result.is_err()
    }
}

/// Everything one run produced: per-plugin outcomes plus the flattened
/// edit list: declaration order across plugins, emission order within.
#[derive(Debug, Default)]
pub struct RunnerOutcome {
    pub outcomes: Vec<PluginOutcome>,
    pub edits: Vec<AggregatedEdit>,
}

impl RunnerOutcome {
    /// True when any plugin marked `required` failed.
    pub fn required_failure(&self) -> bool {
        self.outcomes.iter().any(|o| o.required && o.failed())
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed()).count()
    }
}

/// Orchestrates transport calls across the configured plugin list.
pub struct PluginRunner {
    config: Arc<Config>,
    factory: Box<TransportFactory>,
    semaphore: Arc<Semaphore>,
}

impl PluginRunner {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_factory(
            config,
            Box::new(|spec| {
                let mut transport = ProcessTransport::new(spec.command.clone())
                    .with_args(spec.args.clone())
                    .with_env(spec.env.clone());
                if let Some(ref dir) = spec.working_dir {
                    transport = transport.with_working_dir(dir.clone());
                }
                Arc::new(transport) as Arc<dyn PluginTransport>
            }),
        )
    }

    pub fn with_factory(config: Arc<Config>, factory: Box<TransportFactory>) -> Self {
        let permits = config.effective_concurrency().max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            config,
            factory,
        }
    }

    /// Run every enabled plugin against the request.
    ///
    /// Failures are converted to outcome records; they never prevent the
    /// remaining plugins from running.
    pub async fn run(&self, request: &PluginRequest) -> RunnerOutcome {
        let plugins = self.config.enabled_plugins();

        if plugins.is_empty() {
            debug!("No plugins configured");
            return RunnerOutcome::default();
        }

        info!(count = plugins.len(), file = %request.file, "Running plugins");

        // join_all preserves input order, which is declaration order.
        let results = join_all(
            plugins
                .iter()
                .map(|spec| self.invoke_plugin(spec, request)),
        )
        .await;

        let mut outcome = RunnerOutcome::default();
        for (record, edits) in results {
            outcome.outcomes.push(record);
            outcome.edits.extend(edits);
        }

        info!(
            plugins = outcome.outcomes.len(),
            failures = outcome.failure_count(),
            edits = outcome.edits.len(),
            "Plugin run complete"
        );

        outcome
    }

    async fn invoke_plugin(
        &self,
        spec: &PluginSpec,
        request: &PluginRequest,
    ) -> (PluginOutcome, Vec<AggregatedEdit>) {
        let timeout_ms = self.config.plugin_timeout_ms(spec);
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "plugin_invocation",
            plugin = %spec.name,
            file = %request.file,
            request_id = %request_id,
        );

        async {
            let start = Instant::now();

            // The semaphore only closes on drop, after every run finished.
            let _permit = match self.semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        PluginOutcome {
                            name: spec.name.clone(),
                            required: spec.required,
                            duration_ms: 0,
                            result: Err(TransportError::Io {
                                reason: "concurrency semaphore closed".to_string(),
                            }),
                        },
                        Vec::new(),
                    )
                }
            };

            debug!(timeout_ms, "Starting plugin invocation");

            let transport = (self.factory)(spec);
            let result = transport
                .invoke(request, Duration::from_millis(timeout_ms))
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(response) => {
                    info!(
                        duration_ms,
                        edits = response.edits.len(),
                        "Plugin invocation succeeded"
                    );

                    let edits: Vec<AggregatedEdit> = response
                        .edits
                        .into_iter()
                        .map(|edit| AggregatedEdit::new(edit, &spec.name))
                        .collect();

                    (
                        PluginOutcome {
                            name: spec.name.clone(),
                            required: spec.required,
                            duration_ms,
                            result: Ok(edits.len()),
                        },
                        edits,
                    )
                }
                Err(e) => {
                    match &e {
                        TransportError::Timeout { timeout_ms } => {
                            warn!(duration_ms, timeout_ms, "Plugin invocation timed out")
                        }
                        other => error!(duration_ms, error = %other, "Plugin invocation failed"),
                    }

                    (
                        PluginOutcome {
                            name: spec.name.clone(),
                            required: spec.required,
                            duration_ms,
                            result: Err(e),
                        },
                        Vec::new(),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }
}
