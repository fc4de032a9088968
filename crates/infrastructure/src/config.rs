//! Tool settings: YAML file with log, flatten, and lookup sections.
//! CLI flags override file values; a missing file falls back to defaults.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Flattened JSON for log aggregators.
    Json,
    /// Human-readable output for interactive use.
    Text,
}

// ── Settings ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub flatten: FlattenSettings,

    #[serde(default)]
    pub lookup: LookupSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlattenSettings {
    /// Expand address columns to leaf values.
    #[serde(default = "default_true")]
    pub addresses: bool,
    /// Expand the service column to protocol/port tokens.
    #[serde(default = "default_true")]
    pub services: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupSettings {
    /// Treat FQDN/geography stored values as matching IP queries and
    /// vice versa.
    #[serde(default)]
    pub fqdn_geo_match_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    /// Bound of the worker's command and event channels. Must be at
    /// least 1.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    crate::constants::PIPELINE_CHANNEL_CAPACITY
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for FlattenSettings {
    fn default() -> Self {
        Self {
            addresses: true,
            services: true,
        }
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            fqdn_geo_match_all: false,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log: LogSettings::default(),
            flatten: FlattenSettings::default(),
            lookup: LookupSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parse settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml_ng::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
