//! Configuration module for the respond filter
//!
//! CRITICAL: Configuration is loaded from Envoy plugin configuration,
//! NOT from external files. This avoids file I/O in the Wasm sandbox.

use proxy_wasm::types::LogLevel;
use serde::Deserialize;

/// Foreign function the downstream bytes are handed to
pub const RESPOND_FUNCTION: &str = "respond";

/// Filter configuration loaded from Envoy plugin configuration
#[derive(Clone, Debug, Deserialize)]
pub struct FilterConfig {
    /// Name of the foreign function receiving the intercepted bytes
    #[serde(default = "default_function_name")]
    pub function_name: String,

    /// Minimum level forwarded to the host log
    #[serde(default)]
    pub log_level: LogLevelSetting,

    /// Whether to emit structured audit events
    #[serde(default = "default_audit")]
    pub audit: bool,
}

fn default_function_name() -> String {
    RESPOND_FUNCTION.to_string()
}

fn default_audit() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            function_name: default_function_name(),
            log_level: LogLevelSetting::default(),
            audit: default_audit(),
        }
    }
}

/// Log level as written in the plugin configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelSetting {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

impl From<LogLevelSetting> for LogLevel {
    fn from(level: LogLevelSetting) -> Self {
        match level {
            LogLevelSetting::Trace => LogLevel::Trace,
            LogLevelSetting::Debug => LogLevel::Debug,
            LogLevelSetting::Info => LogLevel::Info,
            LogLevelSetting::Warn => LogLevel::Warn,
            LogLevelSetting::Error => LogLevel::Error,
            LogLevelSetting::Critical => LogLevel::Critical,
        }
    }
}

impl FilterConfig {
    /// Parse configuration from JSON bytes (from Envoy plugin configuration)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str = std::str::from_utf8(bytes)
            .map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;

        let config: Self = serde_json::from_str(config_str)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))?;

        if config.function_name.is_empty() {
            return Err(ConfigError::EmptyFunctionName);
        }

        Ok(config)
    }

    /// Resolve the plugin configuration, falling back to defaults when
    /// the host has none
    pub fn from_plugin_configuration(bytes: Option<&[u8]>) -> Result<Self, ConfigError> {
        match bytes {
            Some(bytes) if !bytes.is_empty() => Self::from_bytes(bytes),
            _ => Ok(Self::default()),
        }
    }
}

/// Configuration parsing errors
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidUtf8(String),
    InvalidJson(String),
    EmptyFunctionName,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidUtf8(e) => write!(f, "Invalid UTF-8: {}", e),
            ConfigError::InvalidJson(e) => write!(f, "Invalid JSON: {}", e),
            ConfigError::EmptyFunctionName => write!(f, "function_name must not be empty"),
        }
    }
}
