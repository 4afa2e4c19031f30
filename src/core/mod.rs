//! Core modules - event plumbing, independent of UI.

pub mod event_bus;

// Re-exports for convenience
pub use event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};
