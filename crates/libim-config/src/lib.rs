//! Configuration management for libim
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (LIBIM_* prefix, `__` between nested keys)
//! 2. libim.local.toml (gitignored, local overrides)
//! 3. libim.toml (git-tracked, project config)
//! 4. ~/.config/libim/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use libim_io::ChannelConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main libim configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibimConfig {
    /// Write buffering and size cap for every file stream.
    pub channel: ChannelConfig,
}

impl LibimConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML file, without layering
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, e.g. to seed a project's libim.toml
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings a channel cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.buffer_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel.buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.channel.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "channel.max_file_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
