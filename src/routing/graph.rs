//! The routing graph: named endpoints and the links between them.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;

use crate::common::LoadError;
use crate::endpoint::Endpoint;
use crate::link::Link;

/// Endpoints by name and links by source name.
///
/// Both tables tolerate concurrent mutation while configuration is loading
/// and concurrent reads from the distributor afterwards.
#[derive(Debug, Default)]
pub struct RoutingGraph {
    endpoints: DashMap<String, Arc<Endpoint>>,
    links: DashMap<String, Vec<Arc<Link>>>,
}

impl RoutingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint. A second endpoint with the same name is refused and
    /// the first one stays registered.
    pub fn register_endpoint(&self, endpoint: Endpoint) -> Result<Arc<Endpoint>, LoadError> {
        match self.endpoints.entry(endpoint.name().to_string()) {
            Entry::Occupied(existing) => Err(LoadError::DuplicateEndpoint {
                name: existing.key().clone(),
            }),
            Entry::Vacant(slot) => {
                let endpoint = Arc::new(endpoint);
                slot.insert(endpoint.clone());
                debug!(endpoint = endpoint.name(), kind = ?endpoint.kind(), "Registered endpoint");
                Ok(endpoint)
            }
        }
    }

    /// Append a link to those leaving its source.
    pub fn add_link(&self, link: Arc<Link>) {
        debug!(link = %link, "Registered link");
        self.links
            .entry(link.source().to_string())
            .or_default()
            .push(link);
    }

    pub fn endpoint(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(name).map(|entry| entry.value().clone())
    }

    /// All registered endpoints, sorted by name.
    pub fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        let mut endpoints: Vec<_> = self
            .endpoints
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        endpoints.sort_by(|a, b| a.name().cmp(b.name()));
        endpoints
    }

    /// Links leaving `source`, in the order they were added.
    pub fn links_from(&self, source: &str) -> Vec<Arc<Link>> {
        self.links
            .get(source)
            .map(|links| links.value().clone())
            .unwrap_or_default()
    }

    /// Every link from `source` whose target currently resolves, paired with
    /// that target. Links to unknown endpoints are skipped.
    pub fn destinations_for(&self, source: &str) -> Vec<(Arc<Link>, Arc<Endpoint>)> {
        self.links_from(source)
            .into_iter()
            .filter_map(|link| {
                let target = self.endpoint(link.target())?;
                Some((link, target))
            })
            .collect()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.iter().map(|entry| entry.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::testing::NullHandler;
    use crate::endpoint::EndpointKind;
    use std::thread;

    fn endpoint(name: &str, type_tag: &str) -> Endpoint {
        Endpoint::new(name, type_tag, NullHandler(EndpointKind::Game))
    }

    #[test]
    fn test_duplicate_endpoint_keeps_first() {
        let graph = RoutingGraph::new();
        graph.register_endpoint(endpoint("irc", "first")).unwrap();

        let err = graph.register_endpoint(endpoint("irc", "second")).unwrap_err();

        assert!(matches!(err, LoadError::DuplicateEndpoint { ref name } if name == "irc"));
        assert_eq!(graph.endpoint("irc").unwrap().type_tag(), "first");
        assert_eq!(graph.endpoint_count(), 1);
    }

    #[test]
    fn test_unresolved_targets_are_skipped() {
        let graph = RoutingGraph::new();
        graph.register_endpoint(endpoint("game", "t")).unwrap();
        graph.register_endpoint(endpoint("irc", "t")).unwrap();
        graph.add_link(Arc::new(Link::new("game", "missing")));
        graph.add_link(Arc::new(Link::new("game", "irc")));

        let destinations = graph.destinations_for("game");

        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[0].1.name(), "irc");
        assert_eq!(graph.links_from("game").len(), 2);
        assert_eq!(graph.link_count(), 2);
    }

    #[test]
    fn test_destinations_keep_insertion_order() {
        let graph = RoutingGraph::new();
        for name in ["a", "b", "c"] {
            graph.register_endpoint(endpoint(name, "t")).unwrap();
        }
        graph.add_link(Arc::new(Link::new("a", "c")));
        graph.add_link(Arc::new(Link::new("a", "b")));
        graph.add_link(Arc::new(Link::new("a", "c")));

        let targets: Vec<_> = graph
            .destinations_for("a")
            .into_iter()
            .map(|(_, endpoint)| endpoint.name().to_string())
            .collect();
        assert_eq!(targets, vec!["c", "b", "c"]);
    }

    #[test]
    fn test_source_without_links_has_no_destinations() {
        let graph = RoutingGraph::new();
        graph.register_endpoint(endpoint("lonely", "t")).unwrap();
        assert!(graph.destinations_for("lonely").is_empty());
        assert!(graph.destinations_for("unknown").is_empty());
    }

    #[test]
    fn test_late_endpoint_resolves_existing_link() {
        let graph = RoutingGraph::new();
        graph.add_link(Arc::new(Link::new("game", "irc")));
        assert!(graph.destinations_for("game").is_empty());

        graph.register_endpoint(endpoint("irc", "t")).unwrap();
        assert_eq!(graph.destinations_for("game").len(), 1);
    }

    #[test]
    fn test_concurrent_duplicate_registration_admits_one() {
        let graph = Arc::new(RoutingGraph::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let graph = graph.clone();
                thread::spawn(move || {
                    graph
                        .register_endpoint(endpoint("shared", &format!("t{}", i)))
                        .is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(graph.endpoint_count(), 1);
    }
}
