//! Handles settings for the application.
//!
//! Sources, later ones winning: the TOML file (`config/jieyou.toml` unless
//! `--config` is given), `JIEYOU_*` environment variables (`__` separates
//! nested keys, e.g. `JIEYOU_REMOTE__BASE_URL`), then command-line overrides.
use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/jieyou.toml";
const DEFAULT_STATE_PATH: &str = "config/jieyou_state.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub level: String,
    pub state_path: String,
    pub remote: Option<Remote>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            state_path: DEFAULT_STATE_PATH.to_string(),
            remote: None,
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut builder = config::Config::builder();
        builder = builder.add_source(config::File::with_name(config_path).required(false));
        builder = builder.add_source(
            config::Environment::with_prefix("JIEYOU")
                .prefix_separator("_")
                .separator("__"),
        );
        let mut settings: Settings = builder.build()?.try_deserialize()?;

        if let Some(level) = &cli.level {
            settings.level = level.clone();
        }
        if let Some(state) = &cli.state {
            settings.state_path = state.clone();
        }
        if let Some(remote) = &settings.remote
            && remote.base_url.trim().is_empty()
        {
            settings.remote = None;
        }

        Ok(settings)
    }
}
