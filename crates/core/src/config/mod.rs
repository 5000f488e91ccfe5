//! Session configuration
//!
//! An optional TOML file selects which backends a session may use and how
//! verbose logging is:
//!
//! ```toml
//! version = 1
//! debug = false
//! backends = ["d3d11", "vulkan"]
//! ```
//!
//! A missing file means defaults. The file is only written by an explicit
//! [`SessionConfig::save`].

mod loader;

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::backend::{Backend, BackendSet};

pub use loader::{config_path, default_config_path, CONFIG_ENV, CONFIG_FILE_NAME};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine where the config file lives
    #[error("Config path not available - could not resolve host executable")]
    NoConfigPath,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Enabled backends; empty enables every available backend
    #[serde(deserialize_with = "concrete_backends")]
    pub backends: Vec<Backend>,
}

/// `none` and `auto` select nothing, so they are rejected in the list
fn concrete_backends<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Backend>, D::Error> {
    use serde::de::Error;

    let backends = Vec::<Backend>::deserialize(deserializer)?;
    match backends.iter().find(|backend| !backend.is_concrete()) {
        Some(backend) => Err(D::Error::custom(format!(
            "\"{}\" is not a backend that can be enabled",
            backend
        ))),
        None => Ok(backends),
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            backends: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Load from the resolved config path, falling back to defaults if absent
    pub fn load() -> ConfigResult<Self> {
        let path = config_path()?;
        Self::load_from_path(&path)
    }

    /// Load from `path`, falling back to defaults if the file does not exist
    pub fn load_from_path(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to the resolved config path
    pub fn save(&self) -> ConfigResult<()> {
        let path = config_path()?;
        self.save_to_path(&path)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml_string()?)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reload from the resolved config path
    pub fn reload(&mut self) -> ConfigResult<()> {
        *self = Self::load()?;
        tracing::debug!("Reloaded config");
        Ok(())
    }

    /// Backends the session may use; `None` means no restriction
    pub fn enabled_backends(&self) -> Option<BackendSet> {
        if self.backends.is_empty() {
            None
        } else {
            Some(self.backends.iter().copied().collect())
        }
    }
}
