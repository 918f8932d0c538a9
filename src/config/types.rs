//! Configuration type definitions.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::loadable::ConfigNode;

/// Root configuration structure.
///
/// Endpoint, link and filter entries stay as raw nodes: their shape depends
/// on the type named in each entry and is checked when the entry is loaded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayConfig {
    #[serde(default)]
    pub distributor: DistributorConfig,
    #[serde(default)]
    pub endpoints: Vec<ConfigNode>,
    #[serde(default)]
    pub links: Vec<ConfigNode>,
    /// Named filter definitions that links can reference by name.
    #[serde(default)]
    pub repeatable_filters: HashMap<String, ConfigNode>,
}

/// Message distributor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DistributorConfig {
    /// Minimum duration of one distribution cycle, in milliseconds.
    #[serde(default = "default_cycle_floor_ms")]
    pub cycle_floor_ms: u64,
}

impl DistributorConfig {
    pub fn cycle_floor(&self) -> Duration {
        Duration::from_millis(self.cycle_floor_ms)
    }
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            cycle_floor_ms: default_cycle_floor_ms(),
        }
    }
}

fn default_cycle_floor_ms() -> u64 {
    crate::bus::DEFAULT_CYCLE_FLOOR.as_millis() as u64
}
