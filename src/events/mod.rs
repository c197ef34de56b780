//! In-process lifecycle events emitted during resolution and execution.

pub mod publisher;

pub use publisher::{EventPublisher, LifecycleEvent};
