//! Directed links between endpoints and their filter chains.

pub mod manager;

use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::bus::TargetedMessage;
use crate::common::guard::contain;
use crate::filter::Filter;

pub use manager::{load_links, LinkLoadReport};

/// Ordered filters attached to one link.
///
/// Filters can still be appended after the link is live, which happens when a
/// filter type referenced by the configuration is registered late.
#[derive(Default)]
pub struct FilterChain {
    filters: RwLock<Vec<Box<dyn Filter>>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the end of the chain.
    pub fn attach(&self, filter: Box<dyn Filter>) {
        self.filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the attached filters, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|filter| filter.name())
            .collect()
    }

    /// Run every filter in order against `message`.
    ///
    /// A failing or panicking filter is logged and skipped. The chain stops at
    /// the first filter that rejects the message.
    pub fn run(&self, message: &mut TargetedMessage) {
        let filters = self.filters.read().unwrap_or_else(PoisonError::into_inner);

        for filter in filters.iter() {
            let outcome = contain(|| filter.process(message));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    filter = filter.name(),
                    target = message.target().name(),
                    "Unable to process a received message: {}",
                    e
                ),
                Err(panic) => warn!(
                    filter = filter.name(),
                    target = message.target().name(),
                    "Filter panicked while processing a message: {}",
                    panic
                ),
            }

            if message.is_rejected() {
                debug!(filter = filter.name(), target = message.target().name(), "Message rejected");
                return;
            }
        }
    }
}

/// A directed connection from one endpoint name to another.
///
/// Endpoints are referenced by name and resolved at dispatch time, so a link
/// may point at an endpoint that loads later or never loads at all.
pub struct Link {
    source: String,
    target: String,
    chain: FilterChain,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            chain: FilterChain::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("filters", &self.chain.names())
            .finish()
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::bus::Message;
    use crate::common::FilterError;
    use crate::endpoint::testing::null_endpoint;
    use crate::endpoint::MESSAGE_TEXT;
    use crate::filter::regex::{RegexFilter, REGEX_FILTER_TYPE};
    use serde_json::json;

    struct Append(&'static str, Arc<AtomicUsize>);

    impl Filter for Append {
        fn name(&self) -> &'static str {
            "append"
        }

        fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            let text = format!("{}{}", message.text(), self.0);
            message.set_text(text);
            Ok(())
        }
    }

    struct Reject;

    impl Filter for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
            message.reject();
            Ok(())
        }
    }

    struct Failing;

    impl Filter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn process(&self, _message: &mut TargetedMessage) -> Result<(), FilterError> {
            Err(FilterError::MissingValue {
                key: "nope".to_string(),
            })
        }
    }

    struct Panicking;

    impl Filter for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn process(&self, _message: &mut TargetedMessage) -> Result<(), FilterError> {
            panic!("filter bug");
        }
    }

    fn targeted(text: &str) -> TargetedMessage {
        TargetedMessage::new(Arc::new(Message::new("src", text)), null_endpoint("dst"))
    }

    #[test]
    fn test_filters_run_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FilterChain::new();
        chain.attach(Box::new(Append("a", calls.clone())));
        chain.attach(Box::new(Append("b", calls.clone())));

        let mut message = targeted(">");
        chain.run(&mut message);

        assert_eq!(message.text(), ">ab");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reject_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FilterChain::new();
        chain.attach(Box::new(Reject));
        chain.attach(Box::new(Append("late", calls.clone())));

        let mut message = targeted("x");
        chain.run(&mut message);

        assert!(message.is_rejected());
        assert_eq!(message.text(), "x");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_matching_drop_regex_stops_later_filters() {
        let drop_spam = RegexFilter::descriptor()
            .instantiate(
                REGEX_FILTER_TYPE,
                &Default::default(),
                &json!({"type": "regex", "pattern": "spam", "action": "drop"}),
            )
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FilterChain::new();
        chain.attach(drop_spam);
        chain.attach(Box::new(Append("late", calls.clone())));

        let origin = Message::new("src", "buy spam").with_field(MESSAGE_TEXT, "buy spam");
        let mut message = TargetedMessage::new(Arc::new(origin), null_endpoint("dst"));
        chain.run(&mut message);

        assert!(message.is_rejected());
        assert_eq!(message.text(), "buy spam");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_errors_and_panics_are_no_ops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FilterChain::new();
        chain.attach(Box::new(Failing));
        chain.attach(Box::new(Panicking));
        chain.attach(Box::new(Append("!", calls.clone())));

        let mut message = targeted("ok");
        chain.run(&mut message);

        assert!(!message.is_rejected());
        assert_eq!(message.text(), "ok!");
        assert_eq!(chain.names(), vec!["failing", "panicking", "append"]);
    }

    #[test]
    fn test_link_display() {
        let link = Link::new("game", "irc");
        assert_eq!(link.to_string(), "game -> irc");
        assert!(link.chain().is_empty());
    }
}
