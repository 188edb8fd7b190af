//! Application configuration
//!
//! Configuration is layered with figment: built-in defaults, then the TOML
//! file (optional), then `TVSTREAM_` environment variables where `__`
//! separates sections, e.g. `TVSTREAM_CATALOGUE__LOAD_TIMEOUT=5s`.
//!
//! ```toml
//! [catalogue]
//! source = "https://example.com/playlist.m3u"
//! format = "auto"
//! load_timeout = "10s"
//!
//! [player]
//! command = "mpv"
//! args = ["--force-media-title={title}", "{url}"]
//!
//! [display]
//! layout = "grid"
//! grid_columns = 3
//! ```

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::sources::SourceFormat;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "TVSTREAM_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalogue: CatalogueConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the catalogue comes from and how long loads may take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// `builtin`, a local path or an http(s) URL
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub format: SourceFormat,
    /// Upper bound for one projector load, reported as a timeout failure
    #[serde(default = "default_load_timeout", with = "duration")]
    pub load_timeout: Duration,
    /// Total timeout of one HTTP request
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
}

/// External player used for playback handoff
///
/// Arguments support the `{url}`, `{title}`, `{id}` and `{thumbnail}`
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_command")]
    pub command: String,
    #[serde(default = "default_player_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,
}

/// Presentation of the catalogue on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One row per category
    #[default]
    Rows,
    /// Flat grid of every entry
    Grid,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}
fn default_load_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_LOAD_TIMEOUT).unwrap_or(Duration::from_secs(10))
}
fn default_request_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_REQUEST_TIMEOUT).unwrap_or(Duration::from_secs(30))
}
fn default_player_command() -> String {
    DEFAULT_PLAYER_COMMAND.to_string()
}
fn default_player_args() -> Vec<String> {
    DEFAULT_PLAYER_ARGS.iter().map(|arg| arg.to_string()).collect()
}
fn default_grid_columns() -> usize {
    DEFAULT_GRID_COLUMNS
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            format: SourceFormat::default(),
            load_timeout: default_load_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
            args: default_player_args(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            grid_columns: default_grid_columns(),
        }
    }
}

impl Config {
    /// Load defaults, then the TOML file at `path` if it exists, then the environment
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let figment = Self::defaults_figment()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Figment holding only the built-in defaults
    pub fn defaults_figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    /// Extract and validate a configuration from any figment
    pub fn from_figment(figment: Figment) -> AppResult<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| AppError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.catalogue.load_timeout.is_zero() {
            return Err(AppError::configuration("catalogue.load_timeout must be greater than zero"));
        }
        if self.catalogue.request_timeout.is_zero() {
            return Err(AppError::configuration(
                "catalogue.request_timeout must be greater than zero",
            ));
        }
        if self.player.command.trim().is_empty() {
            return Err(AppError::configuration("player.command must not be empty"));
        }
        if self.display.grid_columns == 0 {
            return Err(AppError::configuration("display.grid_columns must be at least 1"));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::internal(format!("failed to render configuration: {e}")))
    }
}
