//! Constructor argument providers.
//!
//! Types registered with a registry can ask for externally-owned values
//! (the bus publisher, an application handle) when they are constructed.
//! Providers are keyed by the Rust type they produce.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::common::LoadError;

type Provider = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Set of argument providers consulted while constructing an instance.
#[derive(Clone, Default)]
pub struct Arguments {
    providers: HashMap<TypeId, Provider>,
}

impl Arguments {
    /// Register a supplier for values of type `A`, replacing any earlier one.
    pub fn provide<A, F>(&mut self, supplier: F)
    where
        A: Any + Send,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.providers.insert(
            TypeId::of::<A>(),
            Arc::new(move || Box::new(supplier()) as Box<dyn Any + Send>),
        );
    }

    /// Produce a value of type `A` if a provider exists.
    pub fn get<A: Any + Send>(&self) -> Option<A> {
        let provider = self.providers.get(&TypeId::of::<A>())?;
        provider().downcast::<A>().ok().map(|value| *value)
    }

    /// Produce a value of type `A` or fail the load.
    pub fn require<A: Any + Send>(&self) -> Result<A, LoadError> {
        self.get().ok_or(LoadError::MissingArgument {
            argument: type_name::<A>(),
        })
    }

    pub fn contains<A: Any + Send>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<A>())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("providers", &self.providers.len())
            .finish()
    }
}
