//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every field has a
//! compiled default, so a missing file (or a missing section) never stops a
//! crawl from starting.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "BIBJOIN_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Correlation and merge behavior (optional)
    #[serde(default)]
    pub correlation: CorrelationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Settings consumed by the correlation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Skip emission when the item's full-text sibling is absent
    #[serde(default = "default_require_full_text")]
    pub require_full_text: bool,

    /// File name of the full-text sibling next to each item file
    #[serde(default = "default_full_text_file")]
    pub full_text_file: String,

    /// Publisher applied when the merged record has none
    #[serde(default = "default_publisher")]
    pub publisher: String,

    /// Provider applied when the merged record has none
    #[serde(default = "default_publisher")]
    pub provider: String,

    /// Prefix of the package `formatFamily` value that marks a book dataset
    #[serde(default = "default_book_family_prefix")]
    pub book_family_prefix: String,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            require_full_text: default_require_full_text(),
            full_text_file: default_full_text_file(),
            publisher: default_publisher(),
            provider: default_publisher(),
            book_family_prefix: default_book_family_prefix(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_require_full_text() -> bool {
    true
}

fn default_full_text_file() -> String {
    "main.pdf".to_string()
}

fn default_publisher() -> String {
    "Elsevier".to_string()
}

fn default_book_family_prefix() -> String {
    "BOOK".to_string()
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfigDir(PathBuf),
    CompiledDefaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserConfigDir(p) => Some(p),
            ConfigSource::CompiledDefaults => None,
        }
    }
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory
/// 4. Compiled defaults (fallback)
pub struct ConfigResolver {
    app_name: String,
}

impl ConfigResolver {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
        }
    }

    /// Pick the config file to load without reading it
    pub fn resolve_source(&self, cli_arg: Option<&Path>) -> ConfigSource {
        if let Some(path) = cli_arg {
            return ConfigSource::CommandLine(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        if let Some(path) = self.user_config_path() {
            if path.exists() {
                return ConfigSource::UserConfigDir(path);
            }
        }

        ConfigSource::CompiledDefaults
    }

    /// Resolve and load the configuration
    ///
    /// An explicitly requested file (CLI or environment) that is missing is an
    /// error. A missing or absent default file falls back to compiled defaults.
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
        let source = self.resolve_source(cli_arg);
        let config = match &source {
            ConfigSource::CommandLine(path) | ConfigSource::Environment(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                load_toml_config(path)?
            }
            ConfigSource::UserConfigDir(path) => load_toml_config(path)?,
            ConfigSource::CompiledDefaults => {
                warn!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };
        Ok((config, source))
    }

    /// `<config_dir>/<app>/config.toml`
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(&self.app_name).join("config.toml"))
    }
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write a config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, config.to_toml_string()?)?;
    Ok(())
}

impl TomlConfig {
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let c = &self.correlation;
        if c.full_text_file.trim().is_empty() || c.full_text_file.contains('/') {
            return Err(Error::Config(format!(
                "correlation.full_text_file must be a plain file name, got {:?}",
                c.full_text_file
            )));
        }
        if c.book_family_prefix.trim().is_empty() {
            return Err(Error::Config(
                "correlation.book_family_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
