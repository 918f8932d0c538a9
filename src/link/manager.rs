//! Loading links from configuration.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::filter::FilterManager;
use crate::link::Link;
use crate::loadable::ConfigNode;
use crate::routing::RoutingGraph;

/// Counts gathered while loading the `links` section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkLoadReport {
    pub loaded: usize,
    pub not_a_map: usize,
    pub no_source: usize,
    pub no_target: usize,
}

/// Load every link entry into `graph`, loading each link's filters through `filters`.
///
/// Entries that are not maps or lack a `source`/`target` are counted and skipped.
pub fn load_links(
    entries: &[ConfigNode],
    graph: &RoutingGraph,
    filters: &FilterManager,
) -> LinkLoadReport {
    let mut report = LinkLoadReport::default();

    for entry in entries {
        if !entry.is_object() {
            report.not_a_map += 1;
            continue;
        }
        let Some(source) = entry.get("source").and_then(Value::as_str) else {
            report.no_source += 1;
            continue;
        };
        let Some(target) = entry.get("target").and_then(Value::as_str) else {
            report.no_target += 1;
            continue;
        };

        let link = Arc::new(Link::new(source, target));
        graph.add_link(link.clone());
        report.loaded += 1;

        match entry.get("filters") {
            Some(Value::Array(filter_entries)) => {
                for filter_entry in filter_entries {
                    filters.load(filter_entry, &link);
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => warn!(link = %link, "Link 'filters' must be a list, ignoring"),
        }
    }

    if report.not_a_map > 0 {
        warn!("Links list contained {} entries which were not maps", report.not_a_map);
    }
    if report.no_source > 0 {
        warn!("Links list contained {} entries without a source", report.no_source);
    }
    if report.no_target > 0 {
        warn!("Links list contained {} entries without a target", report.no_target);
    }
    if report.loaded == 0 {
        error!("Loaded no links! Nothing will be passed between any Endpoints!");
    } else {
        info!(count = report.loaded, "Loaded links");
    }

    report
}
