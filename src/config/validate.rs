//! Configuration validation.
//!
//! Only problems that make the whole relay pointless are fatal here. Broken
//! individual entries are reported and skipped when they are loaded.

use crate::common::error::ConfigError;
use crate::config::types::RelayConfig;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &RelayConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push("endpoints is empty - no endpoints configured".to_string());
    }
    if config.links.is_empty() {
        errors.push("links is empty - nothing would be relayed".to_string());
    }

    let mut template_names: Vec<_> = config.repeatable_filters.keys().collect();
    template_names.sort();
    for name in template_names {
        let template = &config.repeatable_filters[name];
        if !template.is_object() {
            errors.push(format!("repeatable-filters.{} must be a map", name));
        } else if template.get("type").and_then(|t| t.as_str()).is_none() {
            errors.push(format!("repeatable-filters.{}.type is required", name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
