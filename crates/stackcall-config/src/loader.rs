//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::bindings::{
    validate_level, BindingsConfig, ColorSetting, DefaultsConfig, LoggingConfig, PolicyKind,
    ResolvedPolicy, CONFIG_FILE_NAME,
};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.stackcall/config.toml) - lowest priority
/// 2. Project config (./stackcall.toml) - overrides global
/// 3. Environment variables (STACKCALL_*) - overrides project
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Merged binding configuration
    pub bindings: BindingsConfig,

    /// Directory where stackcall.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Create a loader that reads the global config from an explicit path
    pub fn with_global_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find stackcall.toml, then merges it over the
    /// global config if one exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_config(start_dir)?;
        self.assemble(project_root, project)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = BindingsConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.assemble(project_root, project)
    }

    fn assemble(
        &mut self,
        project_root: Option<PathBuf>,
        project: BindingsConfig,
    ) -> ConfigResult<Config> {
        let mut bindings = self.load_global_config().unwrap_or_default();
        bindings.merge(&project);
        let bindings = self.apply_env_overrides(bindings)?;

        Ok(Config {
            bindings,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, BindingsConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let config = BindingsConfig::load_from_file(&config_path)?;
                return Ok((Some(current), config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, BindingsConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.stackcall/config.toml
    fn load_global_config(&mut self) -> ConfigResult<BindingsConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = Self::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional
        if !path.exists() {
            return Ok(BindingsConfig::default());
        }

        BindingsConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides
    ///
    /// STACKCALL_POLICY sets the default policy, STACKCALL_LOG the log level.
    fn apply_env_overrides(&self, mut config: BindingsConfig) -> ConfigResult<BindingsConfig> {
        if let Ok(policy) = env::var("STACKCALL_POLICY") {
            let kind = PolicyKind::parse(&policy).ok_or_else(|| ConfigError::InvalidValue {
                field: "STACKCALL_POLICY".to_string(),
                reason: format!("must be 'raise' or 'log', got '{}'", policy),
            })?;
            config
                .defaults
                .get_or_insert_with(DefaultsConfig::default)
                .policy = Some(kind);
        }

        if let Ok(level) = env::var("STACKCALL_LOG") {
            validate_level("STACKCALL_LOG", &level)?;
            config
                .logging
                .get_or_insert_with(LoggingConfig::default)
                .level = Some(level);
        }

        Ok(config)
    }

    /// Get the global configuration directory (~/.stackcall)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".stackcall"))
    }

    /// Get the global config file path (~/.stackcall/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        Ok(Self::global_config_dir()?.join("config.toml"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective failure policy for a function
    pub fn policy_for(&self, function: &str) -> ResolvedPolicy {
        self.bindings.policy_for(function)
    }

    /// Color preference for rendered diagnostics
    pub fn color(&self) -> ColorSetting {
        self.bindings.color()
    }

    /// Logging settings, defaulted when absent
    pub fn logging(&self) -> LoggingConfig {
        self.bindings.logging.clone().unwrap_or_default()
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a stackcall.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
