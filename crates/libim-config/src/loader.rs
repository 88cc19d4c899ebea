//! Configuration loader with multi-source merging

use crate::{LibimConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "LIBIM".to_string(),
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "LIBIM")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/libim/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Config files in ascending precedence; missing files are skipped.
    fn file_layers(&self) -> Vec<PathBuf> {
        let mut layers = Vec::with_capacity(3);
        if self.user_config
            && let Ok(user_file) = Paths::new().user_config_file()
        {
            layers.push(user_file);
        }
        layers.push(Paths::project_config_file(&self.project_dir));
        layers.push(Paths::local_config_file(&self.project_dir));
        layers
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<LibimConfig> {
        let defaults = config::Config::try_from(&LibimConfig::default())
            .context("Failed to serialize built-in defaults")?;
        let mut builder = config::Config::builder().add_source(defaults);

        for layer in self.file_layers() {
            if layer.exists() {
                builder = builder.add_source(
                    config::File::from(layer)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        // LIBIM_CHANNEL__BUFFER_CAPACITY=... overrides every file
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let libim_config: LibimConfig = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .context("Failed to build configuration")?;

        libim_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(libim_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> LibimConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn loader(project_dir: &Path) -> ConfigLoader {
        // A prefix nothing sets, so the host environment cannot leak in.
        ConfigLoader::new()
            .with_project_dir(project_dir)
            .with_env_prefix("LIBIM_TEST_UNSET")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config, LibimConfig::default());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[channel]
buffer_capacity = 65536
max_file_size = 2000000000
"#;
        fs::write(project_dir.join("libim.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.channel.buffer_capacity, 65536);
        assert_eq!(config.channel.max_file_size, 2_000_000_000);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("libim.toml"),
            r#"
[channel]
buffer_capacity = 1024
max_file_size = 5000
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("libim.local.toml"),
            r#"
[channel]
buffer_capacity = 256
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.channel.buffer_capacity, 256);
        assert_eq!(config.channel.max_file_size, 5000);
    }

    #[test]
    fn test_file_layers_order() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let layers = loader(project_dir).file_layers();
        assert_eq!(
            layers,
            vec![
                project_dir.join("libim.toml"),
                project_dir.join("libim.local.toml"),
            ]
        );
    }

    #[test]
    fn test_invalid_project_config_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("libim.toml"),
            "[channel]\nbuffer_capacity = 0\n",
        )
        .expect("Failed to write config");

        assert!(loader(project_dir).load().is_err());
        assert_eq!(
            loader(project_dir).load_or_default(),
            LibimConfig::default()
        );
    }

    // Environment variables are not exercised here: the process environment is
    // shared across test threads. In actual usage:
    //
    // LIBIM_CHANNEL__BUFFER_CAPACITY=65536
    // LIBIM_CHANNEL__MAX_FILE_SIZE=2147483648
    //
    // override the corresponding config file values.
}
