//! # Dispatcher Error Types
//!
//! Structured error handling for chain resolution and execution using
//! thiserror instead of `Box<dyn Error>` patterns.
//!
//! Validation failures of individual transition candidates are *not* errors:
//! they are accumulated on the execution report, since a candidate declining
//! to fire is normal flow. Everything here is raised to the direct caller.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::state_machine::TransitionError;
use crate::storage::StorageError;

/// Errors surfaced by chain resolution and execution.
#[derive(Error, Debug)]
pub enum DispatcherError {
    /// A resource mapping entry was malformed (empty type or id, or an empty
    /// mapping list).
    #[error("Invalid resource mapping: {message}")]
    InvalidResource { message: String },

    /// No chain configuration registered for the requested chain type.
    #[error("No configuration found for chain_type: {chain_type}")]
    UnknownChainType { chain_type: String },

    /// A chain configuration is registered but unusable.
    #[error("Invalid configuration for chain_type {chain_type}: {message}")]
    Configuration { chain_type: String, message: String },

    /// More than one stored chain matched the requested resources under the
    /// active match mode. Data-integrity signal; never auto-resolved. May
    /// also surface transiently when overlapping chains are created
    /// concurrently, in which case the caller can retry.
    #[error("Multiple chains of type {chain_type} match the requested resources ({matched} matched)")]
    AmbiguousChain { chain_type: String, matched: usize },

    /// The chain is locked by another execution.
    #[error("Chain {chain_id} is locked, exiting early")]
    ChainLocked { chain_id: Uuid },

    /// The chain's next-update timestamp is still in the future.
    #[error("Chain {chain_id} is not scheduled to update until {date_next_update}")]
    NotScheduled {
        chain_id: Uuid,
        date_next_update: DateTime<Utc>,
    },

    /// A transition candidate failed hard while validating. The lock is
    /// released before this is raised.
    #[error("Error while finding transition (candidate {kind}): {source}")]
    TransitionDiscovery {
        kind: String,
        #[source]
        source: TransitionError,
    },

    /// The chosen transition's callback failed. The chain state is not
    /// advanced and the lock is released.
    #[error("Error executing transition {kind}: {source}")]
    TransitionExecution {
        kind: String,
        #[source]
        source: TransitionError,
    },

    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DispatcherError {
    /// Create an invalid-resource error.
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Create an unknown-chain-type error.
    pub fn unknown_chain_type(chain_type: impl Into<String>) -> Self {
        Self::UnknownChainType {
            chain_type: chain_type.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(chain_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            chain_type: chain_type.into(),
            message: message.into(),
        }
    }

    /// Create an ambiguous-chain error.
    pub fn ambiguous_chain(chain_type: impl Into<String>, matched: usize) -> Self {
        Self::AmbiguousChain {
            chain_type: chain_type.into(),
            matched,
        }
    }
}

/// Result type alias for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatcherError>;
