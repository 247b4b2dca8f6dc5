//! Layered configuration: file (TOML/JSON/YAML) merged with environment
//! overrides, plus plugin manifest discovery

mod loader;
mod schema;

pub use loader::{load_from_env_or_file, load_from_path};
pub use schema::{Config, PluginSpec};
