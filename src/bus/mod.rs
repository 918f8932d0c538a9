//! Message bus: published messages, per-destination views and the distributor.

pub mod distributor;
pub mod message;
pub mod overlay;
pub mod targeted;

pub use distributor::{MessageBus, Publisher, DEFAULT_CYCLE_FLOOR};
pub use message::{Message, MessageData};
pub use overlay::DataOverlay;
pub use targeted::TargetedMessage;
