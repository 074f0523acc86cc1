//! Layered settings: built-in defaults, then an optional TOML file, then
//! `OUTLAY_*` environment variables (`__` separates sections, e.g.
//! `OUTLAY_STORAGE__BACKEND=sqlite`). Command-line flags are applied last by
//! the CLI.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Looked up as `outlay.toml` (or any format `config` understands) in the
/// working directory when no explicit file is given.
pub const DEFAULT_CONFIG_NAME: &str = "outlay";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub log: LogSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

impl Backend {
    pub fn default_path(&self) -> &'static str {
        match self {
            Backend::Json => "expenses.json",
            Backend::Sqlite => "expenses.db",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: Backend,
    /// Defaults to a backend-specific file in the working directory.
    pub path: Option<PathBuf>,
}

impl StorageSettings {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.backend.default_path()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// How digits are grouped when amounts are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// 12,34,567.89
    #[default]
    Indian,
    /// 1,234,567.89
    Western,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub currency: String,
    pub grouping: Grouping,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency: "₹".to_string(),
            grouping: Grouping::Indian,
        }
    }
}

/// Build settings from defaults, the config file and the environment.
/// An explicitly named file must exist; the default one is optional.
pub fn load(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    builder = match config_path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
    };
    builder = builder.add_source(
        Environment::with_prefix("OUTLAY")
            .prefix_separator("_")
            .separator("__"),
    );
    builder.build()?.try_deserialize()
}
