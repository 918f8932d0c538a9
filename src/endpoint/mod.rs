//! Endpoints: named sources and destinations of relayed messages.
//!
//! An [`Endpoint`] pairs the configured name and type tag with an
//! [`EndpointHandler`] that does the actual delivery. Handlers for game
//! servers and IRC networks live outside the core and plug in through the
//! endpoint registry.

pub mod console;
pub mod log;
pub mod manager;

use std::fmt;

use serde_json::Value;

use crate::bus::TargetedMessage;
use crate::common::guard::contain;
use crate::common::{EndpointError, LoadError};
use crate::loadable::ConfigNode;

pub use console::ConsoleEndpoint;
pub use log::LogEndpoint;
pub use manager::EndpointManager;

/// Data key holding the format string a message was rendered from.
pub const MESSAGE_FORMAT: &str = "MESSAGE_FORMAT";
/// Data key holding the bare message body.
pub const MESSAGE_TEXT: &str = "MESSAGE_TEXT";
/// Data key holding the display name of the sender.
pub const SENDER_NAME: &str = "SENDER_NAME";

/// Kind of chat system behind an endpoint. Filters use it to pick a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointKind {
    Irc,
    #[default]
    Game,
}

impl EndpointKind {
    /// Parse a kind name from configuration, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "irc" => Some(EndpointKind::Irc),
            "game" => Some(EndpointKind::Game),
            _ => None,
        }
    }
}

/// Behaviour of a concrete endpoint type.
pub trait EndpointHandler: Send + Sync {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Game
    }

    /// Configure from the entry's `extra` block. Only called when one exists.
    fn load_extra(&mut self, _extra: &ConfigNode) -> Result<(), LoadError> {
        Ok(())
    }

    /// Adjust a message before the link's filters see it.
    fn pre_process(&self, _message: &mut TargetedMessage) -> Result<(), EndpointError> {
        Ok(())
    }

    /// Deliver a message that survived filtering.
    fn receive(&self, message: &TargetedMessage) -> Result<(), EndpointError>;
}

/// A named endpoint registered in the routing graph.
pub struct Endpoint {
    name: String,
    type_tag: String,
    handler: Box<dyn EndpointHandler>,
}

impl Endpoint {
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        handler: impl EndpointHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            handler: Box::new(handler),
        }
    }

    /// Build an endpoint from a configuration entry.
    ///
    /// Reads the required `name`, the `type` tag and, when present, hands the
    /// `extra` block to the handler.
    pub fn from_entry<H>(mut handler: H, entry: &ConfigNode) -> Result<Self, LoadError>
    where
        H: EndpointHandler + 'static,
    {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| LoadError::MissingField {
                field: "name".to_string(),
                type_name: entry_type(entry).to_string(),
            })?;

        if let Some(extra) = entry.get("extra").filter(|extra| !extra.is_null()) {
            handler.load_extra(extra)?;
        }

        Ok(Self::new(name, entry_type(entry), handler))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn kind(&self) -> EndpointKind {
        self.handler.kind()
    }

    /// Run the handler's pre-process hook, containing panics.
    pub fn pre_process(&self, message: &mut TargetedMessage) -> Result<(), EndpointError> {
        contain(|| self.handler.pre_process(message))
            .unwrap_or_else(|message| Err(EndpointError::Panicked { message }))
    }

    /// Run the handler's delivery hook, containing panics.
    pub fn receive(&self, message: &TargetedMessage) -> Result<(), EndpointError> {
        contain(|| self.handler.receive(message))
            .unwrap_or_else(|message| Err(EndpointError::Panicked { message }))
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("type", &self.type_tag)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Read an optional `kind` override from an endpoint's `extra` block.
pub fn kind_from_extra(extra: &ConfigNode) -> Result<Option<EndpointKind>, LoadError> {
    match extra.get("kind").and_then(Value::as_str) {
        Some(kind) => EndpointKind::parse(kind)
            .map(Some)
            .ok_or_else(|| LoadError::InvalidValue {
                field: "kind".to_string(),
                message: format!("unknown endpoint kind '{}'", kind),
            }),
        None => Ok(None),
    }
}

fn entry_type(entry: &ConfigNode) -> &str {
    entry.get("type").and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Handlers shared by tests across the crate.

    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Handler that accepts and discards everything.
    pub struct NullHandler(pub EndpointKind);

    impl EndpointHandler for NullHandler {
        fn kind(&self) -> EndpointKind {
            self.0
        }

        fn receive(&self, _message: &TargetedMessage) -> Result<(), EndpointError> {
            Ok(())
        }
    }

    pub fn null_endpoint(name: &str) -> Arc<Endpoint> {
        Arc::new(Endpoint::new(name, "null", NullHandler(EndpointKind::Game)))
    }

    pub fn irc_endpoint(name: &str) -> Arc<Endpoint> {
        Arc::new(Endpoint::new(name, "null", NullHandler(EndpointKind::Irc)))
    }

    /// What a recording handler saw for one delivery.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Delivery {
        pub target: String,
        pub text: String,
        pub data: Option<Value>,
    }

    /// Handler forwarding every delivery to a channel.
    pub struct RecordingHandler {
        sender: Mutex<mpsc::Sender<Delivery>>,
        watch_key: Option<String>,
    }

    impl RecordingHandler {
        pub fn new(watch_key: Option<&str>) -> (Self, mpsc::Receiver<Delivery>) {
            let (sender, receiver) = mpsc::channel();
            let handler = Self {
                sender: Mutex::new(sender),
                watch_key: watch_key.map(str::to_string),
            };
            (handler, receiver)
        }
    }

    impl EndpointHandler for RecordingHandler {
        fn receive(&self, message: &TargetedMessage) -> Result<(), EndpointError> {
            let delivery = Delivery {
                target: message.target().name().to_string(),
                text: message.text().to_string(),
                data: self
                    .watch_key
                    .as_deref()
                    .and_then(|key| message.data().get(key).cloned()),
            };
            self.sender
                .lock()
                .unwrap()
                .send(delivery)
                .map_err(|e| EndpointError::Delivery {
                    message: e.to_string(),
                })
        }
    }
}
