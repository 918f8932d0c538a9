//! Relay assembly: routing graph, registries, bus and shutdown hooks.

use std::any::Any;
use std::sync::Arc;

use tracing::info;

use crate::bus::{Message, MessageBus, Publisher};
use crate::common::{RelayError, ShutdownHooks, Shutdownable};
use crate::config::RelayConfig;
use crate::endpoint::EndpointManager;
use crate::filter::FilterManager;
use crate::link::{load_links, LinkLoadReport};
use crate::routing::RoutingGraph;

/// A running relay.
///
/// Endpoint and filter types that are not built in can be registered after
/// [`Relay::start`]; configuration entries naming them were queued during
/// start and load as soon as their type appears.
pub struct Relay {
    graph: Arc<RoutingGraph>,
    bus: Arc<MessageBus>,
    endpoints: EndpointManager,
    filters: FilterManager,
    hooks: ShutdownHooks,
    links: LinkLoadReport,
}

impl Relay {
    /// Build the relay from `config` and start distributing messages.
    pub fn start(config: &RelayConfig) -> Result<Self, RelayError> {
        let graph = Arc::new(RoutingGraph::new());
        let bus = Arc::new(MessageBus::start(
            graph.clone(),
            config.distributor.cycle_floor(),
        )?);

        let hooks = ShutdownHooks::new();
        hooks.track(bus.clone());

        let endpoints = EndpointManager::new(graph.clone())?;
        let filters = FilterManager::new(config.repeatable_filters.clone())?;

        let publisher = bus.publisher();
        endpoints
            .registry()
            .register_argument_provider(move || publisher.clone());
        let publisher = bus.publisher();
        filters
            .registry()
            .register_argument_provider(move || publisher.clone());

        endpoints.load_all(&config.endpoints);
        let links = load_links(&config.links, &graph, &filters);

        info!(
            endpoints = graph.endpoint_count(),
            links = links.loaded,
            "Relay started"
        );

        Ok(Self {
            graph,
            bus,
            endpoints,
            filters,
            hooks,
            links,
        })
    }

    pub fn graph(&self) -> &Arc<RoutingGraph> {
        &self.graph
    }

    pub fn endpoints(&self) -> &EndpointManager {
        &self.endpoints
    }

    pub fn filters(&self) -> &FilterManager {
        &self.filters
    }

    /// Counts from loading the `links` section.
    pub fn link_report(&self) -> LinkLoadReport {
        self.links
    }

    pub fn publisher(&self) -> Publisher {
        self.bus.publisher()
    }

    pub fn publish(&self, message: Message) -> bool {
        self.bus.publish(message)
    }

    /// Make values of type `A` available to endpoint and filter constructors.
    pub fn register_argument_provider<A, F>(&self, supplier: F)
    where
        A: Any + Send,
        F: Fn() -> A + Send + Sync + 'static,
    {
        let supplier = Arc::new(supplier);
        let for_endpoints = supplier.clone();
        self.endpoints
            .registry()
            .register_argument_provider(move || for_endpoints());
        self.filters
            .registry()
            .register_argument_provider(move || supplier());
    }

    /// Stop `resource` together with the relay.
    pub fn track_shutdownable(&self, resource: Arc<dyn Shutdownable>) {
        self.hooks.track(resource);
    }

    /// Warn about configuration entries whose type never got registered.
    pub fn report_pending(&self) {
        self.endpoints.registry().report_pending();
        self.filters.registry().report_pending();
    }

    /// Stop the bus and every tracked resource.
    pub fn shutdown(&self) {
        info!("Shutting down relay");
        self.hooks.run_all();
    }
}
