//! Filter registry and repeatable filter templates.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::common::LoadError;
use crate::filter::anti_highlight::{AntiHighlight, ANTI_HIGHLIGHT_TYPE};
use crate::filter::colors::{ColorFilter, COLOR_FILTER_TYPE};
use crate::filter::data_mapper::{DataMapper, DATA_MAPPER_TYPE};
use crate::filter::regex::{RegexFilter, REGEX_FILTER_TYPE};
use crate::filter::Filter;
use crate::link::Link;
use crate::loadable::{ConfigNode, LoadOutcome, TypeDescriptor, TypeRegistry};

/// Loads filters onto links.
///
/// A link's filter list may contain inline filter definitions or the bare
/// name of a template from `repeatable-filters`; each use of a template
/// produces its own filter instance.
pub struct FilterManager {
    registry: TypeRegistry<Box<dyn Filter>, Arc<Link>>,
    templates: HashMap<String, ConfigNode>,
}

impl FilterManager {
    /// Create a manager with the built-in filter types registered.
    pub fn new(templates: HashMap<String, ConfigNode>) -> Result<Self, LoadError> {
        let registry = TypeRegistry::new("Filter", |filter: Box<dyn Filter>, link: &Arc<Link>| {
            debug!(link = %link, filter = filter.name(), "Attached filter");
            link.chain().attach(filter);
            Ok(())
        });

        registry.register(ANTI_HIGHLIGHT_TYPE, AntiHighlight::descriptor())?;
        registry.register(COLOR_FILTER_TYPE, ColorFilter::descriptor())?;
        registry.register(DATA_MAPPER_TYPE, DataMapper::descriptor())?;
        registry.register(REGEX_FILTER_TYPE, RegexFilter::descriptor())?;

        Ok(Self {
            registry,
            templates,
        })
    }

    /// Register an additional filter type.
    pub fn register(
        &self,
        name: &str,
        descriptor: TypeDescriptor<Box<dyn Filter>>,
    ) -> Result<(), LoadError> {
        self.registry.register(name, descriptor)
    }

    pub fn registry(&self) -> &TypeRegistry<Box<dyn Filter>, Arc<Link>> {
        &self.registry
    }

    pub fn template(&self, name: &str) -> Option<&ConfigNode> {
        self.templates.get(name)
    }

    /// Load one entry of a link's filter list onto `link`.
    ///
    /// Returns `None` when a template name does not resolve.
    pub fn load(&self, entry: &ConfigNode, link: &Arc<Link>) -> Option<LoadOutcome> {
        let definition = match entry {
            Value::String(name) => match self.templates.get(name) {
                Some(template) => template.clone(),
                None => {
                    warn!(link = %link, template = %name, "Unknown repeatable filter, skipping");
                    return None;
                }
            },
            other => other.clone(),
        };
        Some(self.registry.load(definition, link.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Message, TargetedMessage};
    use crate::common::FilterError;
    use crate::endpoint::testing::null_endpoint;
    use crate::endpoint::MESSAGE_TEXT;
    use crate::loadable::{DescriptorBuilder, Loadable};
    use serde_json::json;

    fn templates() -> HashMap<String, ConfigNode> {
        let mut templates = HashMap::new();
        templates.insert(
            "no-spam".to_string(),
            json!({"type": "regex", "pattern": "spam", "action": "drop"}),
        );
        templates
    }

    struct Shout;

    impl Loadable for Shout {}

    impl Filter for Shout {
        fn name(&self) -> &'static str {
            "shout"
        }

        fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
            let loud = message.text().to_uppercase();
            message.set_text(loud);
            Ok(())
        }
    }

    #[test]
    fn test_builtins_are_registered() {
        let manager = FilterManager::new(HashMap::new()).unwrap();
        assert_eq!(
            manager.registry().registered_types(),
            vec!["antihighlight", "color", "datamapper", "regex"]
        );
    }

    #[test]
    fn test_templates_expand_to_separate_instances() {
        let manager = FilterManager::new(templates()).unwrap();
        let first = Arc::new(Link::new("game", "irc"));
        let second = Arc::new(Link::new("game", "log"));

        assert_eq!(manager.load(&json!("no-spam"), &first), Some(LoadOutcome::Loaded));
        assert_eq!(manager.load(&json!("no-spam"), &second), Some(LoadOutcome::Loaded));
        assert_eq!(first.chain().names(), vec!["regex"]);
        assert_eq!(second.chain().names(), vec!["regex"]);
        assert!(manager.template("no-spam").is_some());

        let origin = Message::new("game", "spam").with_field(MESSAGE_TEXT, "spam");
        let mut message = TargetedMessage::new(Arc::new(origin), null_endpoint("irc"));
        first.chain().run(&mut message);
        assert!(message.is_rejected());
    }

    #[test]
    fn test_unknown_template_is_skipped() {
        let manager = FilterManager::new(templates()).unwrap();
        let link = Arc::new(Link::new("game", "irc"));
        assert_eq!(manager.load(&json!("missing"), &link), None);
        assert!(link.chain().is_empty());
    }

    #[test]
    fn test_late_filter_type_attaches_in_order() {
        let manager = FilterManager::new(HashMap::new()).unwrap();
        let link = Arc::new(Link::new("game", "irc"));

        assert_eq!(
            manager.load(&json!({"type": "shout"}), &link),
            Some(LoadOutcome::Queued)
        );
        assert_eq!(
            manager.load(&json!({"type": "color"}), &link),
            Some(LoadOutcome::Loaded)
        );

        let shout = DescriptorBuilder::new(|_| Ok(Shout)).finish(crate::filter::boxed);
        manager.register("shout", shout).unwrap();

        assert_eq!(link.chain().names(), vec!["color", "shout"]);
    }

    #[test]
    fn test_invalid_inline_filter_fails() {
        let manager = FilterManager::new(HashMap::new()).unwrap();
        let link = Arc::new(Link::new("game", "irc"));
        assert_eq!(
            manager.load(&json!({"type": "regex"}), &link),
            Some(LoadOutcome::Failed)
        );
        assert_eq!(
            manager.load(&json!({"pattern": "x"}), &link),
            Some(LoadOutcome::Invalid)
        );
        assert!(link.chain().is_empty());
    }
}
