//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::units::Unit;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Generator settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.1..=10.0).contains(&self.generator.board_thickness) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Board thickness {} mm out of range (0.1-10.0)",
                    self.generator.board_thickness
                ),
            });
        }
        if self.export.upload_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "Upload timeout must be at least 1 second".to_string(),
            });
        }
        if self.export.poll_interval_ms == 0
            || self.export.poll_interval_ms > self.export.upload_timeout_secs * 1000
        {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Poll interval {} ms must be positive and below the upload timeout",
                    self.export.poll_interval_ms
                ),
            });
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }
        Ok(())
    }
}

/// Generator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Bind dimensions to named parameters so later edits propagate.
    /// Default: true
    #[serde(default = "default_true")]
    pub parametric: bool,

    /// Presentation unit for created parameters.
    /// Default: "mm"
    #[serde(default)]
    pub default_unit: Unit,

    /// Board thickness in mm, used for through-hole lead projection when the
    /// caller does not supply one.
    #[serde(default = "default_board_thickness")]
    pub board_thickness: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            parametric: default_true(),
            default_unit: Unit::default(),
            board_thickness: default_board_thickness(),
        }
    }
}

fn default_board_thickness() -> f64 {
    1.6
}

const fn default_true() -> bool {
    true
}

/// Export configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory snapshots are written to. Default: the system temp dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Wall-clock limit for one upload, in seconds.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,

    /// Interval between upload completion polls, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            upload_timeout_secs: default_upload_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_upload_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    500
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
