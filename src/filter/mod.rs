//! Filters applied to messages as they travel along a link.
//!
//! Built-in filter types:
//! - `regex` - allow, drop, rewrite or capture based on a pattern
//! - `datamapper` - render the text from a `%variable%` template
//! - `color` - translate between IRC colors and legacy `§` codes
//! - `antihighlight` - break up a name so IRC clients do not highlight it

pub mod anti_highlight;
pub mod colors;
pub mod data_mapper;
pub mod manager;
pub mod regex;

use std::fmt;

use serde_json::Value;

use crate::bus::TargetedMessage;
use crate::common::{FilterError, LoadError};
use crate::loadable::ConfigNode;

pub use anti_highlight::AntiHighlight;
pub use colors::ColorFilter;
pub use data_mapper::DataMapper;
pub use manager::FilterManager;
pub use regex::RegexFilter;

/// A single step of a link's filter chain.
pub trait Filter: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Inspect or rewrite `message`. Call [`TargetedMessage::reject`] to drop it.
    fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError>;
}

impl fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.name()).finish()
    }
}

/// Erase a loaded filter for the filter registry.
pub(crate) fn boxed<F: Filter + 'static>(
    filter: F,
    _entry: &ConfigNode,
) -> Result<Box<dyn Filter>, LoadError> {
    Ok(Box::new(filter))
}

/// Render a data value as text. Strings are used as-is.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("plain")), "plain");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(true)), "true");
    }
}
