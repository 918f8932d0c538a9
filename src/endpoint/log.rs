//! Endpoint that writes deliveries to the application log.

use tracing::info;

use crate::bus::TargetedMessage;
use crate::common::{EndpointError, LoadError};
use crate::endpoint::{kind_from_extra, Endpoint, EndpointHandler, EndpointKind};
use crate::loadable::{ConfigNode, DescriptorBuilder, Loadable, TypeDescriptor};

/// Type tag under which the log endpoint is registered.
pub const LOG_ENDPOINT_TYPE: &str = "log";

#[derive(Debug, Default)]
pub struct LogEndpoint {
    kind: EndpointKind,
}

impl LogEndpoint {
    pub fn descriptor() -> TypeDescriptor<Endpoint> {
        DescriptorBuilder::new(|_| Ok(LogEndpoint::default()))
            .finish(|handler, entry| Endpoint::from_entry(handler, entry))
    }
}

impl Loadable for LogEndpoint {}

impl EndpointHandler for LogEndpoint {
    fn kind(&self) -> EndpointKind {
        self.kind
    }

    fn load_extra(&mut self, extra: &ConfigNode) -> Result<(), LoadError> {
        if let Some(kind) = kind_from_extra(extra)? {
            self.kind = kind;
        }
        Ok(())
    }

    fn receive(&self, message: &TargetedMessage) -> Result<(), EndpointError> {
        info!(
            endpoint = message.target().name(),
            source = message.origin().source(),
            "{}",
            message.text()
        );
        Ok(())
    }
}
