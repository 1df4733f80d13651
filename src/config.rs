//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/dectree/dectree.toml`
//! 3. Explicit config file (`--config <file>`)
//! 4. Environment variables: `DECTREE__*` prefix, e.g. `DECTREE__IDS__PREFIX`

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::IdStyle;

/// Node id settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdSettings {
    /// Prefix of every generated id (default: "ID")
    pub prefix: String,
    /// `sequential` or `random`
    pub style: IdStyle,
}

impl Default for IdSettings {
    fn default() -> Self {
        Self {
            prefix: "ID".into(),
            style: IdStyle::Sequential,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Decimals shown for expected values
    pub precision: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

/// Raw id settings for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawIdSettings {
    pub prefix: Option<String>,
    pub style: Option<IdStyle>,
}

/// Raw display settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplaySettings {
    pub precision: Option<usize>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub ids: RawIdSettings,
    pub display: RawDisplaySettings,
}

/// Unified configuration for dectree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub ids: IdSettings,
    pub display: DisplaySettings,
}

/// Get the XDG config directory for dectree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dectree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("dectree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    parse_raw_settings(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_raw_settings(content: &str) -> Result<RawSettings, toml::de::Error> {
    toml::from_str(content)
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            ids: IdSettings {
                prefix: overlay
                    .ids
                    .prefix
                    .clone()
                    .unwrap_or_else(|| self.ids.prefix.clone()),
                style: overlay.ids.style.unwrap_or(self.ids.style),
            },
            display: DisplaySettings {
                precision: overlay.display.precision.unwrap_or(self.display.precision),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config, if present
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Explicit file: missing is an error here, the user asked for it
        if let Some(path) = config_file {
            debug!("loading config {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment overrides
        current = Self::apply_env_overrides(current)?;

        current.validate()?;
        Ok(current)
    }

    /// Load defaults plus a TOML document, no global file or environment.
    pub fn from_toml(content: &str) -> Result<Self, ApplicationError> {
        let raw = parse_raw_settings(content).map_err(|e| ApplicationError::Config {
            message: format!("parse: {}", e),
        })?;
        let settings = Self::default().merge_with(&raw);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply DECTREE__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("DECTREE").prefix_separator("__").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "ids.prefix")? {
            settings.ids.prefix = val;
        }
        if let Some(val) = env_value::<IdStyle>(&config, "ids.style")? {
            settings.ids.style = val;
        }
        if let Some(val) = env_value::<usize>(&config, "display.precision")? {
            settings.display.precision = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.ids.prefix.chars().any(char::is_whitespace) {
            return Err(ApplicationError::Config {
                message: format!("ids.prefix must not contain whitespace: {:?}", self.ids.prefix),
            });
        }
        if self.display.precision > 12 {
            return Err(ApplicationError::Config {
                message: format!("display.precision must be at most 12, got {}", self.display.precision),
            });
        }
        Ok(())
    }

    /// Render as TOML for `config show`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize: {}", e),
        })
    }
}

/// Typed environment value; unset is `None`, an unparsable value is an error.
fn env_value<T: DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("environment {}: {}", key, e),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
