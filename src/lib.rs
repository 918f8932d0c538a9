//! Chatrelay - routes chat messages between game servers and IRC networks.
//!
//! Endpoints are joined by directed links, each carrying a chain of filters
//! that rewrite or reject messages in flight. A single background
//! distributor fans published messages out along the links.

pub mod bus;
pub mod common;
pub mod config;
pub mod endpoint;
pub mod filter;
pub mod link;
pub mod loadable;
pub mod relay;
pub mod routing;

pub use bus::{Message, MessageBus, Publisher, TargetedMessage};
pub use common::{RelayError, Shutdownable};
pub use endpoint::{Endpoint, EndpointHandler, EndpointKind};
pub use filter::Filter;
pub use relay::Relay;
pub use routing::RoutingGraph;
