//! Immutable messages published onto the bus.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Key/value payload carried by a message.
pub type MessageData = HashMap<String, Value>;

/// A message published by an endpoint.
///
/// Once published the message is never mutated; every destination sees the
/// same data through a shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Name of the endpoint the message came from.
    source: String,
    /// Text used when no filter rewrites it.
    default_text: String,
    data: Arc<MessageData>,
}

impl Message {
    pub fn new(source: impl Into<String>, default_text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            default_text: default_text.into(),
            data: Arc::new(MessageData::new()),
        }
    }

    /// Replace the payload with an owned copy of `data`.
    pub fn with_data(mut self, data: MessageData) -> Self {
        self.data = Arc::new(data);
        self
    }

    /// Add a single payload entry.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.data).insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn default_text(&self) -> &str {
        &self.default_text
    }

    pub fn data(&self) -> &Arc<MessageData> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}
