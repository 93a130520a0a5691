//! stackcall Configuration System
//!
//! Provides configuration for hosts that expose native functions to scripts:
//! - Per-function failure policies (`stackcall.toml`)
//! - Global user defaults (~/.stackcall/config.toml)
//! - Diagnostics rendering and logging settings
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.stackcall/config.toml)
//! 2. Project config (./stackcall.toml)
//! 3. Environment variables (STACKCALL_*)
//!
//! # Example
//!
//! ```no_run
//! use stackcall_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let policy = config.policy_for("getPlayerName");
//! ```

pub mod bindings;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use bindings::{
    BindingsConfig, ColorSetting, DefaultsConfig, DiagnosticsConfig, FallbackValue,
    FunctionConfig, LogFormat, LoggingConfig, PolicyKind, ResolvedPolicy,
};
pub use loader::{Config, ConfigLoader};
