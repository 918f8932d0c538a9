//! Message routing between endpoints.

pub mod graph;

pub use graph::RoutingGraph;
