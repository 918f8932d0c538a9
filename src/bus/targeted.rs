//! Per-destination view of a published message.

use std::fmt;
use std::sync::Arc;

use crate::bus::message::Message;
use crate::bus::overlay::DataOverlay;
use crate::endpoint::Endpoint;

/// A message on its way to one destination endpoint.
///
/// Filters rewrite the text and data of this view; the origin message and
/// the views built for other destinations are unaffected.
pub struct TargetedMessage {
    origin: Arc<Message>,
    target: Arc<Endpoint>,
    text: String,
    data: DataOverlay,
    rejected: bool,
}

impl TargetedMessage {
    pub fn new(origin: Arc<Message>, target: Arc<Endpoint>) -> Self {
        let text = origin.default_text().to_string();
        let data = DataOverlay::new(origin.data().clone());
        Self {
            origin,
            target,
            text,
            data,
            rejected: false,
        }
    }

    pub fn origin(&self) -> &Message {
        &self.origin
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    /// Current text, as rewritten by filters so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the current text, returning the previous one.
    pub fn set_text(&mut self, text: impl Into<String>) -> String {
        std::mem::replace(&mut self.text, text.into())
    }

    pub fn data(&self) -> &DataOverlay {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataOverlay {
        &mut self.data
    }

    /// Drop the message for this destination. Remaining filters are skipped.
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }
}

impl fmt::Debug for TargetedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetedMessage")
            .field("source", &self.origin.source())
            .field("target", &self.target.name())
            .field("text", &self.text)
            .field("rejected", &self.rejected)
            .finish()
    }
}
