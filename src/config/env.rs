//! Environment variable overrides for configuration.
//!
//! - `CHATRELAY_CONFIG` - path of the configuration file
//! - `CHATRELAY_CYCLE_FLOOR_MS` - distributor cycle floor in milliseconds

use std::env;

use tracing::warn;

use crate::config::types::RelayConfig;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CHATRELAY";

const DEFAULT_CONFIG_PATH: &str = "chatrelay.yml";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: RelayConfig) -> RelayConfig {
    let floor_var = format!("{}_CYCLE_FLOOR_MS", ENV_PREFIX);
    if let Ok(floor) = env::var(&floor_var) {
        match floor.trim().parse() {
            Ok(floor) => config.distributor.cycle_floor_ms = floor,
            Err(_) => warn!("Ignoring {}: '{}' is not a number of milliseconds", floor_var, floor),
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `CHATRELAY_CONFIG` environment variable, otherwise returns "chatrelay.yml".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
