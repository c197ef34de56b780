//! Data layer: the chain entity, its owned resource references, and the
//! append-only audit record.

pub mod chain;
pub mod chain_event;
pub mod chain_resource;

pub use chain::{Chain, ChainSummary};
pub use chain_event::ChainEvent;
pub use chain_resource::{ChainResource, ResourcePair};
