pub mod config;
pub mod edit;
pub mod error;
pub mod host;
pub mod plugin;
