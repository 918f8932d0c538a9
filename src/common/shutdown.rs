//! Shutdown coordination for background resources.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::common::guard::contain;

/// A resource that owns background work and must be stopped on exit.
pub trait Shutdownable: Send + Sync {
    /// Stop the resource. Must be safe to call more than once.
    fn shutdown(&self);
}

/// Ordered set of resources stopped together when the relay exits.
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Mutex<Vec<Arc<dyn Shutdownable>>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a resource. Resources are stopped in the order they were tracked.
    pub fn track(&self, hook: Arc<dyn Shutdownable>) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every tracked resource and forget them.
    ///
    /// A panicking hook is logged and does not prevent the remaining hooks from running.
    pub fn run_all(&self) {
        let hooks: Vec<_> = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        debug!(count = hooks.len(), "Running shutdown hooks");
        for hook in hooks {
            if let Err(message) = contain(|| hook.shutdown()) {
                warn!("Shutdown hook panicked: {}", message);
            }
        }
    }
}
