//! Endpoint bound to the process console.
//!
//! Deliveries are printed to stdout with a timestamp. Lines typed on stdin
//! are published by the host binary as messages from every console endpoint.

use std::io::Write;

use chrono::Local;

use crate::bus::TargetedMessage;
use crate::common::{EndpointError, LoadError};
use crate::endpoint::{kind_from_extra, Endpoint, EndpointHandler, EndpointKind};
use crate::loadable::{ConfigNode, DescriptorBuilder, Loadable, TypeDescriptor};

/// Type tag under which the console endpoint is registered.
pub const CONSOLE_ENDPOINT_TYPE: &str = "console";

/// Sender name attached to lines read from the console.
pub const CONSOLE_SENDER: &str = "console";

#[derive(Debug, Default)]
pub struct ConsoleEndpoint {
    kind: EndpointKind,
}

impl ConsoleEndpoint {
    pub fn descriptor() -> TypeDescriptor<Endpoint> {
        DescriptorBuilder::new(|_| Ok(ConsoleEndpoint::default()))
            .finish(|handler, entry| Endpoint::from_entry(handler, entry))
    }
}

impl Loadable for ConsoleEndpoint {}

impl EndpointHandler for ConsoleEndpoint {
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
        let line = format_line(&Local::now().format("%H:%M:%S").to_string(), message.text());
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

fn format_line(timestamp: &str, text: &str) -> String {
    format!("[{}] {}", timestamp, text)
}
