//! # System Constants
//!
//! Core constants shared across the dispatcher: the terminal pseudo-state,
//! the audit-log action tags, and the lifecycle event names published by the
//! engine.

/// Terminal pseudo-state. Once a chain reaches `DONE`, transition discovery
/// only ever returns the configured DONE-final transition, without
/// validation, and no callback is invoked.
pub const DONE: &str = "done";

/// Audit-log action tags recorded through [`crate::storage::ChainStore::append_event`].
pub mod actions {
    /// A chain moved from one state to another.
    pub const STATE_TRANSITION: &str = "state_transition";
}

/// Lifecycle events published in-process through the
/// [`EventPublisher`](crate::events::EventPublisher).
pub mod events {
    /// A new chain was created during resolution.
    pub const CHAIN_CREATED: &str = "chain.created";
    /// A chain moved to a new state via a successful transition.
    pub const CHAIN_STATE_TRANSITION: &str = "chain.state_transition";
    /// A chain reached the terminal `DONE` state.
    pub const CHAIN_COMPLETED: &str = "chain.completed";
}

/// Default actor recorded on audit events when the caller supplies none.
pub const SYSTEM_ACTOR: &str = "system";
