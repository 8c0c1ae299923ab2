use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::Deserialize;

use crate::driver::FailurePolicy;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown figure format: {0}")]
    UnknownImageFormat(String),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Figure capture configuration
    pub figures: FigureConfig,
    /// How a failing cell affects the rest of the run
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureConfig {
    /// Install the figure capture adapter
    pub enabled: bool,
    /// Format figures are saved in
    pub format: ImageFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            figures: FigureConfig {
                enabled: false,
                format: ImageFormat::Png,
            },
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlFigureConfig {
    pub enabled: Option<bool>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlRunConfig {
    pub failure_policy: Option<FailurePolicy>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub figures: Option<TomlFigureConfig>,
    pub run: Option<TomlRunConfig>,
}

impl Config {
    /// Load configuration from the data directory, merging with defaults.
    ///
    /// Writes the bundled example on first run. A missing or invalid file
    /// leaves the defaults in place.
    pub fn load() -> Self {
        let config_file = config_path();

        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match Self::load_from(&config_file) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path, merging with defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let toml_config: TomlConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Config::default();
        config.merge(toml_config)?;
        Ok(config)
    }

    fn merge(&mut self, toml_config: TomlConfig) -> Result<(), ConfigError> {
        if let Some(figures) = toml_config.figures {
            if let Some(enabled) = figures.enabled {
                self.figures.enabled = enabled;
            }
            if let Some(format) = figures.format {
                self.figures.format = ImageFormat::from_extension(&format)
                    .ok_or(ConfigError::UnknownImageFormat(format))?;
            }
        }

        if let Some(run) = toml_config.run {
            if let Some(policy) = run.failure_policy {
                self.failure_policy = policy;
            }
        }

        Ok(())
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(path = %parent.display(), error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write default config");
        }
    }

    pub fn with_figures(mut self, enabled: bool) -> Self {
        self.figures.enabled = enabled;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
