//! Binding Configuration (stackcall.toml)
//!
//! Describes how bound native functions react to bad arguments, and how the
//! resulting diagnostics are rendered and logged.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration file name looked up in project directories
pub const CONFIG_FILE_NAME: &str = "stackcall.toml";

/// Binding configuration from stackcall.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BindingsConfig {
    /// Defaults applied to every function without its own entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Diagnostics rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsConfig>,

    /// Logging settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Per-function overrides, keyed by the script-visible function name
    #[serde(default)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub functions: HashMap<String, FunctionConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Failure policy for functions without an override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyKind>,

    /// Fallback pushed by the `log` policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackValue>,
}

/// Per-function failure handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FunctionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackValue>,
}

/// How a bound function reports bad arguments
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Abort the script call with the diagnostic
    #[default]
    Raise,
    /// Log the diagnostic and return the fallback value
    Log,
}

impl PolicyKind {
    /// Parse a policy name as written in config files and environment variables
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "raise" | "error" => Some(PolicyKind::Raise),
            "log" | "substitute" => Some(PolicyKind::Log),
            _ => None,
        }
    }
}

/// Scalar fallback value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FallbackValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Default for FallbackValue {
    fn default() -> Self {
        FallbackValue::Boolean(false)
    }
}

/// Effective policy for one function after merging defaults and overrides
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPolicy {
    Raise,
    Log(FallbackValue),
}

/// Diagnostics rendering settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Terminal colors ("always", "never", "auto")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSetting>,
}

/// Terminal color preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    Always,
    Never,
    #[default]
    Auto,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level ("trace", "debug", "info", "warn", "error")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
}

/// Log line format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl BindingsConfig {
    /// Load binding configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the binding configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                validate_level("logging.level", level)?;
            }
        }

        for (name, function) in &self.functions {
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "functions".to_string(),
                    reason: "function name must not be empty".to_string(),
                });
            }
            if function.policy == Some(PolicyKind::Raise) && function.fallback.is_some() {
                return Err(ConfigError::InvalidValue {
                    field: format!("functions.{}.fallback", name),
                    reason: "a fallback has no effect with the 'raise' policy".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Effective policy for a function: its own entry, then `[defaults]`, then raise
    pub fn policy_for(&self, function: &str) -> ResolvedPolicy {
        let defaults = self.defaults.clone().unwrap_or_default();
        let entry = self.functions.get(function);

        let kind = entry
            .and_then(|f| f.policy)
            .or(defaults.policy)
            .unwrap_or_default();

        match kind {
            PolicyKind::Raise => ResolvedPolicy::Raise,
            PolicyKind::Log => {
                let fallback = entry
                    .and_then(|f| f.fallback.clone())
                    .or(defaults.fallback)
                    .unwrap_or_default();
                ResolvedPolicy::Log(fallback)
            }
        }
    }

    /// Color preference, `auto` when unset
    pub fn color(&self) -> ColorSetting {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.color)
            .unwrap_or_default()
    }

    /// Merge another config into this one
    /// Other config takes precedence for non-None values and per-function entries
    pub fn merge(&mut self, other: &BindingsConfig) {
        if other.defaults.is_some() {
            self.defaults = other.defaults.clone();
        }
        if other.diagnostics.is_some() {
            self.diagnostics = other.diagnostics.clone();
        }
        if other.logging.is_some() {
            self.logging = other.logging.clone();
        }
        for (name, function) in &other.functions {
            self.functions.insert(name.clone(), function.clone());
        }
    }
}

/// Validate a log level name
pub(crate) fn validate_level(field: &str, value: &str) -> ConfigResult<()> {
    if !matches!(
        value.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    ) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "must be one of trace, debug, info, warn, error, off, got '{}'",
                value
            ),
        });
    }
    Ok(())
}
