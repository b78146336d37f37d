// Configuration Management
//
// This crate handles configuration loading for the agent API:
// - Configuration structs with defaults
// - YAML file loading
// - Environment variable loading

use std::path::Path;
use thiserror::Error;

pub mod types;

// Re-export all configuration types
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found. Tried paths: {paths}")]
    FileNotFound { paths: String },

    #[error("Failed to read configuration file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Main configuration loading interface
impl ApiConfig {
    /// Load configuration from a YAML file. Missing sections fall back to defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ApiConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from `CONFIG_PATH` or a default location, falling
    /// back to the environment when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("CONFIG_PATH") {
            if !Path::new(&path).exists() {
                return Err(ConfigError::FileNotFound { paths: path });
            }
            return Self::load_from_file(path);
        }

        let config_paths = ["config/config.yaml", "config.yaml"];
        for path in &config_paths {
            if Path::new(path).exists() {
                return Self::load_from_file(path);
            }
        }

        Self::from_env()
    }
}
