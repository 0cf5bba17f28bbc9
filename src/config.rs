// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Configuration file types and parsing for cozmonaut.
//!
//! JSON5 configuration format supporting:
//! - Log pipeline sizing, thresholds, sink and output format
//! - Service state pool sizing and per-service settings
//! - Comments and trailing commas

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::logging::{Facility, LogFormat, Severity};

/// Startup configuration (JSON5 file format)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Log pipeline settings
    #[serde(default)]
    pub log: LogConfig,

    /// Service framework settings
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Log pipeline section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Number of record slots in the ring
    pub ring_capacity: usize,

    /// Global minimum severity
    pub level: Severity,

    /// Per-facility overrides of the global level
    pub facility_levels: HashMap<Facility, Severity>,

    /// Where rendered lines go
    pub sink: SinkConfig,

    /// Rendered line format
    pub format: LogFormat,

    /// Consumer pause when the ring is empty, in milliseconds
    pub idle_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 1024,
            level: Severity::Info,
            facility_levels: HashMap::new(),
            sink: SinkConfig::Stderr,
            format: LogFormat::Text,
            idle_ms: 1,
        }
    }
}

/// Log sink selection
///
/// `"stderr"`, `"stdout"` or `{ file: "/path/to/log" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkConfig {
    #[default]
    Stderr,
    Stdout,
    File(PathBuf),
}

/// Service framework section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    /// Maximum number of simultaneously loaded services
    pub max_loaded: usize,

    pub console: ConsoleConfig,
    pub script: ScriptConfig,
    pub monitor: MonitorConfig,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            max_loaded: 16,
            console: ConsoleConfig::default(),
            script: ScriptConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Console loop period in milliseconds
    pub tick_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { tick_ms: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScriptConfig {
    /// Script loop period in milliseconds
    pub tick_ms: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self { tick_ms: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,

    /// Frames after which the window asks to close (0 = never)
    pub max_frames: u64,

    /// Minimum frame period in milliseconds (0 = unpaced)
    pub frame_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 576,
            title: "Monitor".to_string(),
            max_frames: 0,
            frame_ms: 16,
        }
    }
}

impl Config {
    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize configuration to JSON5 string (with pretty formatting)
    pub fn to_json5(&self) -> String {
        // json5 has no pretty printer; JSON is valid JSON5
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5();
        std::fs::write(path, content)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log.ring_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "log.ring_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        // An idle period of zero would turn the consumer into a busy loop
        if self.log.idle_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "log.idle_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let SinkConfig::File(path) = &self.log.sink {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "log.sink",
                    reason: "file path is empty".to_string(),
                });
            }
        }

        if self.services.max_loaded == 0 {
            return Err(ConfigError::InvalidValue {
                field: "services.max_loaded",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.services.console.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "services.console.tick_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.services.script.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "services.script.tick_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        let monitor = &self.services.monitor;
        if monitor.width == 0 || monitor.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "services.monitor",
                reason: format!("window size {}x{} is empty", monitor.width, monitor.height),
            });
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    IoError(PathBuf, String),
    ParseError(String),
    InvalidValue { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(
                    f,
                    "failed to read config file '{}': {}",
                    path.display(),
                    msg
                )
            }
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
