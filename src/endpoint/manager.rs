//! Endpoint registry bound to the routing graph.

use std::sync::Arc;

use tracing::info;

use crate::common::LoadError;
use crate::endpoint::console::{ConsoleEndpoint, CONSOLE_ENDPOINT_TYPE};
use crate::endpoint::log::{LogEndpoint, LOG_ENDPOINT_TYPE};
use crate::endpoint::Endpoint;
use crate::loadable::{ConfigNode, LoadOutcome, TypeDescriptor, TypeRegistry};
use crate::routing::RoutingGraph;

/// Loads endpoint entries and registers the results in the routing graph.
pub struct EndpointManager {
    registry: TypeRegistry<Endpoint>,
    graph: Arc<RoutingGraph>,
}

impl EndpointManager {
    /// Create a manager with the built-in `log` and `console` types registered.
    pub fn new(graph: Arc<RoutingGraph>) -> Result<Self, LoadError> {
        let sink = graph.clone();
        let registry = TypeRegistry::new("Endpoint", move |endpoint: Endpoint, _: &()| {
            sink.register_endpoint(endpoint).map(|_| ())
        });

        registry.register(LOG_ENDPOINT_TYPE, LogEndpoint::descriptor())?;
        registry.register(CONSOLE_ENDPOINT_TYPE, ConsoleEndpoint::descriptor())?;

        Ok(Self { registry, graph })
    }

    /// Register an endpoint type. Entries already waiting for it load now.
    pub fn register(&self, name: &str, descriptor: TypeDescriptor<Endpoint>) -> Result<(), LoadError> {
        self.registry.register(name, descriptor)
    }

    pub fn registry(&self) -> &TypeRegistry<Endpoint> {
        &self.registry
    }

    pub fn graph(&self) -> &Arc<RoutingGraph> {
        &self.graph
    }

    pub fn load(&self, entry: ConfigNode) -> LoadOutcome {
        self.registry.load(entry, ())
    }

    /// Load the whole `endpoints` section.
    pub fn load_all(&self, entries: &[ConfigNode]) -> Vec<LoadOutcome> {
        let outcomes = self.registry.load_all(entries.iter().cloned(), ());
        let loaded = outcomes
            .iter()
            .filter(|outcome| **outcome == LoadOutcome::Loaded)
            .count();
        let queued = outcomes
            .iter()
            .filter(|outcome| **outcome == LoadOutcome::Queued)
            .count();
        info!(loaded, queued, "Loaded endpoints");
        outcomes
    }
}
