//! Layered configuration loading using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`FINANCE_BUDDY_*`, `__` separates sections)
//! 2. `./finance-buddy.toml`
//! 3. `<config dir>/finance-buddy/config.toml`
//! 4. Built-in defaults
//!
//! `FINANCE_BUDDY_DATA__PATH=/tmp/fb.db` maps to `data.path`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::charts::Dimensions;

pub const ENV_PREFIX: &str = "FINANCE_BUDDY_";
pub const LOCAL_CONFIG_FILE: &str = "finance-buddy.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataConfig {
    /// SQLite file holding the stored collections
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("finance-buddy").join("finance.db"))
            .unwrap_or_else(|| PathBuf::from("finance-buddy.db"));
        DataConfig { path }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartConfig {
    pub trend_width: f64,
    pub trend_height: f64,
    pub allocation_width: f64,
    pub allocation_height: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            trend_width: 600.0,
            trend_height: 300.0,
            allocation_width: 400.0,
            allocation_height: 300.0,
        }
    }
}

impl ChartConfig {
    pub fn trend(&self) -> Dimensions {
        Dimensions::new(self.trend_width, self.trend_height)
    }

    pub fn allocation(&self) -> Dimensions {
        Dimensions::new(self.allocation_width, self.allocation_height)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub charts: ChartConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load from all sources and validate
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load with an explicit TOML file layered above the default locations
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Self::base_figment()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    pub fn figment() -> Figment {
        Self::base_figment().merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn base_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        figment
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("finance-buddy").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dims = [
            ("charts.trend_width", self.charts.trend_width),
            ("charts.trend_height", self.charts.trend_height),
            ("charts.allocation_width", self.charts.allocation_width),
            ("charts.allocation_height", self.charts.allocation_height),
        ];

        for (field, value) in dims {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }

        if self.data.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data.path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Log file used by the terminal UI, next to the database
    pub fn log_file(&self) -> PathBuf {
        self.data
            .path
            .parent()
            .map(|dir| dir.join("finance-buddy.log"))
            .unwrap_or_else(|| PathBuf::from("finance-buddy.log"))
    }
}
