use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use std::path::Path;

use super::schema::Config;
use crate::error::{ConfigError, Result};
use crate::plugin::manifest;

/// Load configuration from the default file locations, overridden by
/// `REWRITE_HOST_`-prefixed environment variables.
pub fn load_from_env_or_file() -> Result<Config> {
    let config: Config = Figment::new()
        .merge(Toml::file("rewrite-host.toml"))
        .merge(Json::file("rewrite-host.json"))
        .merge(Yaml::file("rewrite-host.yaml"))
        .merge(Yaml::file("rewrite-host.yml"))
        .merge(Env::prefixed("REWRITE_HOST_"))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    finish(config)
}

/// Load configuration from an explicit path.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let figment = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Figment::new().merge(Toml::file(path)),
        Some("json") => Figment::new().merge(Json::file(path)),
        Some("yaml") | Some("yml") => Figment::new().merge(Yaml::file(path)),
        _ => {
            return Err(ConfigError::Parse(
                "Unsupported config file format. Use .toml, .json, .yaml, or .yml".into(),
            )
            .into())
        }
    };

    let config: Config = figment
        .merge(Env::prefixed("REWRITE_HOST_"))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    finish(config)
}

/// Append manifest-discovered plugins and validate the combined result.
fn finish(mut config: Config) -> Result<Config> {
    if let Some(plugin_dir) = config.plugin_dir.clone() {
        let discovered = manifest::discover(&plugin_dir)?;
        config.plugins.extend(discovered);
    }

    config.validate()?;
    Ok(config)
}
