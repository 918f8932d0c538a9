//! Panic containment for user-supplied hooks.
//!
//! Filters and endpoint handlers run on the distributor thread. A panic in one
//! of them must not take the thread down, so every call is wrapped here.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `work`, converting a panic into its message.
pub fn contain<R, F>(work: F) -> Result<R, String>
where
    F: FnOnce() -> R,
{
    catch_unwind(AssertUnwindSafe(work)).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
