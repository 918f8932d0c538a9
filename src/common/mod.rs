//! Common utilities and types shared across the relay.

pub mod error;
pub mod guard;
pub mod shutdown;

pub use error::{ConfigError, EndpointError, FilterError, LoadError, RelayError};
pub use shutdown::{ShutdownHooks, Shutdownable};
