//! Copy-on-write view over a message's data.

use std::sync::Arc;

use serde_json::Value;

use crate::bus::message::MessageData;

/// Two-layer map: reads fall through to the shared base, writes land in a
/// private overlay. The base is never modified.
#[derive(Debug, Clone)]
pub struct DataOverlay {
    base: Arc<MessageData>,
    overlay: MessageData,
}

impl DataOverlay {
    pub fn new(base: Arc<MessageData>) -> Self {
        Self {
            base,
            overlay: MessageData::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.overlay.get(key).or_else(|| self.base.get(key))
    }

    /// Text value of `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.overlay.contains_key(key) || self.base.contains_key(key)
    }

    /// Write `value` into the overlay, returning the value it shadows.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let previous = self.get(&key).cloned();
        self.overlay.insert(key, value.into());
        previous
    }

    /// Remove `key` from the overlay only. Base values become visible again.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.overlay.remove(key)
    }

    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.overlay
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Number of distinct keys across both layers.
    pub fn len(&self) -> usize {
        self.base.len()
            + self
                .overlay
                .keys()
                .filter(|key| !self.base.contains_key(*key))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn base(&self) -> &MessageData {
        &self.base
    }

    pub fn overlay(&self) -> &MessageData {
        &self.overlay
    }
}
