//! Settings loading and validation for cb-core.
//!
//! Settings live in a single TOML file:
//!
//! ```toml
//! alpha = 0.1
//! probabilities = [0.05, 0.5, 0.95]
//! output = "json"
//! ```
//!
//! Every key is optional; missing keys take the built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::inference::DEFAULT_PROBABILITIES;
use crate::output::OutputFormat;

/// Environment variable naming a settings file.
pub const CONFIG_ENV_VAR: &str = "CB_CONFIG";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid setting {field}: {message}")]
    Invalid { field: String, message: String },
}

/// User-tunable defaults for the command-line front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Tail probability for credible intervals and tests.
    pub alpha: f64,

    /// Levels reported in the posterior quantile table.
    pub probabilities: Vec<f64>,

    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            probabilities: DEFAULT_PROBABILITIES.to_vec(),
            output: OutputFormat::Text,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text without validating them.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check that α and every table level lie strictly inside (0, 1).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Invalid {
                field: "alpha".to_string(),
                message: format!("must be in (0, 1), got {}", self.alpha),
            });
        }
        if self.probabilities.is_empty() {
            return Err(ConfigError::Invalid {
                field: "probabilities".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        for (i, &p) in self.probabilities.iter().enumerate() {
            if !(p > 0.0 && p < 1.0) {
                return Err(ConfigError::Invalid {
                    field: format!("probabilities[{i}]"),
                    message: format!("must be in (0, 1), got {p}"),
                });
            }
        }
        Ok(())
    }
}

/// Settings resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit settings file (highest priority).
    pub config_path: Option<PathBuf>,
}

/// Resolved settings with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    /// Path the settings came from (None if using defaults).
    pub path: Option<PathBuf>,
}

/// Load settings with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI flag (via ConfigOptions)
/// 2. Environment variable (CB_CONFIG)
/// 3. Built-in defaults
pub fn load_settings(options: &ConfigOptions) -> Result<ResolvedSettings, ConfigError> {
    let path = match &options.config_path {
        Some(path) => Some(path.clone()),
        None => std::env::var_os(CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from),
    };

    let Some(path) = path else {
        return Ok(ResolvedSettings {
            settings: Settings::default(),
            path: None,
        });
    };

    let settings = load_settings_from_file(&path)?;
    settings.validate()?;
    debug!(path = %path.display(), alpha = settings.alpha, "settings loaded");

    Ok(ResolvedSettings {
        settings,
        path: Some(path),
    })
}

/// Load settings from a specific file.
pub fn load_settings_from_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Settings::from_toml_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}
