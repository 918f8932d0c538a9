//! Configuration file parsing (YAML format).

use std::fs;
use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::types::RelayConfig;

/// Load configuration from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RelayConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;
    load_config_str(&content)
}

/// Load configuration from a YAML string.
pub fn load_config_str(content: &str) -> Result<RelayConfig, ConfigError> {
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
