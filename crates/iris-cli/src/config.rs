//! Configuration loading
//!
//! Sources, lowest priority first: embedded defaults, `./iris.toml`, the file
//! given with `--config`, then `IRIS_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IrisConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub persist: bool,
    /// Where `iris_auth.json` lives. Defaults to `~/.iris`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

pub fn load_config(explicit: Option<&Path>) -> Result<IrisConfig> {
    let mut builder = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("iris").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    // prefix_separator("_") makes IRIS_API__BASE_URL map to api.base_url.
    let config = builder
        .add_source(
            Environment::with_prefix("IRIS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
