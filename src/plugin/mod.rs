//! Plugin protocol: wire schema, process transport, and orchestration
//!
//! Plugins are external executables. The host writes one JSON request to a
//! plugin's stdin, closes it, and reads one JSON response from its stdout;
//! the plugin proposes edits, the host decides what to apply.
//!
//! - `schema`: request/response wire types and validating decode
//! - `transport`: the `PluginTransport` seam and the child-process
//!   implementation (spawn, timeout, kill)
//! - `runner`: per-plugin invocation, failure isolation, declaration-order
//!   aggregation
//! - `manifest`: `*.toml` manifest discovery in a plugin directory

pub mod manifest;
pub mod runner;
pub mod schema;
pub mod transport;

pub use runner::{PluginOutcome, PluginRunner, RunnerOutcome};
pub use schema::{PluginRequest, PluginResponse};
pub use transport::{PluginTransport, ProcessTransport};
