//! Named type registry with deferred loading.
//!
//! Configuration entries carry a `type` key. When the type is already
//! registered the entry is instantiated immediately; otherwise it is parked
//! until the type shows up, so plugins may register their types after the
//! configuration has been read.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::common::guard::contain;
use crate::common::LoadError;
use crate::loadable::arguments::Arguments;
use crate::loadable::descriptor::TypeDescriptor;
use crate::loadable::ConfigNode;

/// Result of handing one configuration entry to a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Instantiated and passed to the completion hook.
    Loaded,
    /// Parked until its type is registered.
    Queued,
    /// Not a map, or no `type` key.
    Invalid,
    /// Construction, binding or completion failed.
    Failed,
}

type CompletionHook<T, Ctx> = Box<dyn Fn(T, &Ctx) -> Result<(), LoadError> + Send + Sync>;

struct RegistryState<T, Ctx> {
    types: HashMap<String, Arc<TypeDescriptor<T>>>,
    pending: HashMap<String, VecDeque<(ConfigNode, Ctx)>>,
}

/// Registry of loadable types producing `T`.
///
/// `Ctx` travels with each entry to the completion hook; filters use it to
/// carry the link they belong to.
pub struct TypeRegistry<T, Ctx = ()> {
    /// Human-readable kind used in log lines ("Endpoint", "Filter").
    kind: &'static str,
    state: Mutex<RegistryState<T, Ctx>>,
    arguments: RwLock<Arguments>,
    on_complete: CompletionHook<T, Ctx>,
}

impl<T: 'static, Ctx: 'static> TypeRegistry<T, Ctx> {
    /// Create a registry. `on_complete` receives every successfully built instance.
    pub fn new<F>(kind: &'static str, on_complete: F) -> Self
    where
        F: Fn(T, &Ctx) -> Result<(), LoadError> + Send + Sync + 'static,
    {
        Self {
            kind,
            state: Mutex::new(RegistryState {
                types: HashMap::new(),
                pending: HashMap::new(),
            }),
            arguments: RwLock::new(Arguments::default()),
            on_complete: Box::new(on_complete),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register a type under `name`.
    ///
    /// Entries queued for `name` are loaded right away, oldest first.
    pub fn register(&self, name: &str, descriptor: TypeDescriptor<T>) -> Result<(), LoadError> {
        let descriptor = Arc::new(descriptor);
        let queued = {
            let mut state = self.lock_state();
            if state.types.contains_key(name) {
                return Err(LoadError::DuplicateType {
                    kind: self.kind,
                    name: name.to_string(),
                });
            }
            state.types.insert(name.to_string(), descriptor.clone());
            state.pending.remove(name).unwrap_or_default()
        };

        debug!(type_name = name, "Registered {} type", self.kind);
        if !queued.is_empty() {
            info!(
                type_name = name,
                count = queued.len(),
                "Loading queued {} entries",
                self.kind
            );
        }
        for (entry, ctx) in queued {
            self.instantiate(name, &descriptor, &entry, &ctx);
        }
        Ok(())
    }

    /// Make values of type `A` available to constructors.
    pub fn register_argument_provider<A, F>(&self, supplier: F)
    where
        A: std::any::Any + Send,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.arguments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .provide(supplier);
    }

    /// Load one configuration entry.
    pub fn load(&self, entry: ConfigNode, ctx: Ctx) -> LoadOutcome {
        let Some(type_name) = entry.get("type").and_then(Value::as_str).map(str::to_string) else {
            warn!("Encountered invalid {}: {}", self.kind, LoadError::NoType);
            return LoadOutcome::Invalid;
        };

        let descriptor = {
            let mut state = self.lock_state();
            match state.types.get(&type_name).cloned() {
                Some(descriptor) => descriptor,
                None => {
                    debug!(type_name = %type_name, "Queueing {} until its type is registered", self.kind);
                    state
                        .pending
                        .entry(type_name)
                        .or_default()
                        .push_back((entry, ctx));
                    return LoadOutcome::Queued;
                }
            }
        };

        self.instantiate(&type_name, &descriptor, &entry, &ctx)
    }

    /// Load a batch of entries sharing one context.
    pub fn load_all<I>(&self, entries: I, ctx: Ctx) -> Vec<LoadOutcome>
    where
        I: IntoIterator<Item = ConfigNode>,
        Ctx: Clone,
    {
        entries
            .into_iter()
            .map(|entry| self.load(entry, ctx.clone()))
            .collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.lock_state().types.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lock_state().types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of entries waiting for an unregistered type.
    pub fn pending_count(&self) -> usize {
        self.lock_state().pending.values().map(VecDeque::len).sum()
    }

    /// Warn about every type that still has entries waiting on it.
    pub fn report_pending(&self) {
        let state = self.lock_state();
        for (type_name, entries) in &state.pending {
            warn!(
                type_name = %type_name,
                count = entries.len(),
                "{} entries are waiting for an unregistered type",
                self.kind
            );
        }
    }

    fn instantiate(
        &self,
        type_name: &str,
        descriptor: &TypeDescriptor<T>,
        entry: &ConfigNode,
        ctx: &Ctx,
    ) -> LoadOutcome {
        let arguments = self
            .arguments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let result = contain(|| {
            descriptor
                .instantiate(type_name, &arguments, entry)
                .and_then(|instance| (self.on_complete)(instance, ctx))
        })
        .unwrap_or_else(|message| Err(LoadError::Panicked { message }));

        match result {
            Ok(()) => {
                debug!(type_name, "Loaded {}", self.kind);
                LoadOutcome::Loaded
            }
            Err(e) => {
                warn!(type_name, "Failed to load {}: {}", self.kind, e);
                LoadOutcome::Failed
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState<T, Ctx>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadable::{DescriptorBuilder, Loadable};
    use serde_json::json;
    use std::thread;

    #[derive(Default)]
    struct Named {
        name: String,
    }

    impl Loadable for Named {}

    #[derive(Clone)]
    struct Greeting(String);

    struct Greeter {
        greeting: String,
    }

    impl Loadable for Greeter {}

    fn named_type(tag: &'static str) -> TypeDescriptor<String> {
        DescriptorBuilder::new(|_| Ok(Named::default()))
            .required("name", |n: &mut Named, v: String| n.name = v)
            .finish(move |n, _| Ok(format!("{}:{}", tag, n.name)))
    }

    fn recording_registry() -> (TypeRegistry<String>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let registry = TypeRegistry::new("Widget", move |item: String, _: &()| {
            if item.ends_with(":reject") {
                return Err(LoadError::DuplicateEndpoint { name: item });
            }
            sink.lock().unwrap().push(item);
            Ok(())
        });
        (registry, seen)
    }

    #[test]
    fn test_registered_type_loads_immediately() {
        let (registry, seen) = recording_registry();
        registry.register("plain", named_type("plain")).unwrap();

        let outcome = registry.load(json!({"type": "plain", "name": "a"}), ());
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(*seen.lock().unwrap(), vec!["plain:a"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let (registry, _) = recording_registry();
        registry.register("plain", named_type("plain")).unwrap();
        let err = registry.register("plain", named_type("other")).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateType { ref name, .. } if name == "plain"));
        assert_eq!(registry.registered_types(), vec!["plain"]);
    }

    #[test]
    fn test_entries_without_type_are_invalid() {
        let (registry, seen) = recording_registry();
        assert_eq!(registry.load(json!({"name": "a"}), ()), LoadOutcome::Invalid);
        assert_eq!(registry.load(json!("plain"), ()), LoadOutcome::Invalid);
        assert_eq!(registry.load(json!({"type": 4}), ()), LoadOutcome::Invalid);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_forward_references_load_in_fifo_order() {
        let (registry, seen) = recording_registry();
        registry.register("early", named_type("early")).unwrap();

        let outcomes = registry.load_all(
            vec![
                json!({"type": "late", "name": "1"}),
                json!({"type": "early", "name": "2"}),
                json!({"type": "late", "name": "3"}),
            ],
            (),
        );
        assert_eq!(
            outcomes,
            vec![LoadOutcome::Queued, LoadOutcome::Loaded, LoadOutcome::Queued]
        );
        assert_eq!(registry.pending_count(), 2);

        registry.register("late", named_type("late")).unwrap();

        assert_eq!(registry.pending_count(), 0);
        assert_eq!(*seen.lock().unwrap(), vec!["early:2", "late:1", "late:3"]);
    }

    #[test]
    fn test_missing_required_field_fails_entry() {
        let (registry, seen) = recording_registry();
        registry.register("plain", named_type("plain")).unwrap();
        assert_eq!(
            registry.load(json!({"type": "plain"}), ()),
            LoadOutcome::Failed
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_completion_failure_is_reported() {
        let (registry, seen) = recording_registry();
        registry.register("plain", named_type("plain")).unwrap();
        assert_eq!(
            registry.load(json!({"type": "plain", "name": "reject"}), ()),
            LoadOutcome::Failed
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_constructor_panic_is_contained() {
        let (registry, _) = recording_registry();
        let exploding: TypeDescriptor<String> =
            DescriptorBuilder::new(|_| -> Result<Named, LoadError> { panic!("no") })
                .finish(|n, _| Ok(n.name));
        registry.register("exploding", exploding).unwrap();
        assert_eq!(
            registry.load(json!({"type": "exploding"}), ()),
            LoadOutcome::Failed
        );
    }

    #[test]
    fn test_argument_providers_feed_constructors() {
        let (registry, seen) = recording_registry();
        let greeter: TypeDescriptor<String> = DescriptorBuilder::new(|args| {
            let Greeting(greeting) = args.require::<Greeting>()?;
            Ok(Greeter { greeting })
        })
        .finish(|g, _| Ok(g.greeting));
        registry.register("greeter", greeter).unwrap();

        assert_eq!(
            registry.load(json!({"type": "greeter"}), ()),
            LoadOutcome::Failed
        );

        registry.register_argument_provider(|| Greeting("hello".to_string()));
        assert_eq!(
            registry.load(json!({"type": "greeter"}), ()),
            LoadOutcome::Loaded
        );
        assert_eq!(*seen.lock().unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_concurrent_loads_and_registration() {
        let (registry, seen) = recording_registry();
        let registry = Arc::new(registry);

        let loaders: Vec<_> = (0..4)
            .map(|t| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        registry.load(json!({"type": "late", "name": format!("{}-{}", t, i)}), ());
                    }
                })
            })
            .collect();

        registry.register("late", named_type("late")).unwrap();
        for loader in loaders {
            loader.join().unwrap();
        }

        assert_eq!(registry.pending_count(), 0);
        assert_eq!(seen.lock().unwrap().len(), 100);
    }
}
