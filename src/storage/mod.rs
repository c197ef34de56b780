//! # Storage Collaborator
//!
//! Persistence is external to the core: everything the engine needs from a
//! backend is expressed as the [`ChainStore`] trait. Implementations are
//! expected to make [`ChainStore::try_lock`] an atomic conditional update
//! ("set locked only where currently unlocked, report whether a row
//! changed") — the advisory lock is only as safe as that operation.
//!
//! [`memory::InMemoryChainStore`] is provided for tests and embedded use.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Chain, ChainEvent, ResourcePair};

pub use memory::InMemoryChainStore;

/// Errors raised by storage implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Chain not found: {chain_id}")]
    ChainNotFound { chain_id: Uuid },

    #[error("Storage backend error: {message}")]
    Backend { message: String },
}

impl StorageError {
    /// Create a chain-not-found error.
    pub fn chain_not_found(chain_id: Uuid) -> Self {
        Self::ChainNotFound { chain_id }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A chain with its resource set eagerly loaded, as returned by
/// [`ChainStore::find_chains`] for set comparison during resolution.
#[derive(Debug, Clone)]
pub struct StoredChain {
    pub chain: Chain,
    pub resources: Vec<ResourcePair>,
}

/// Field set for a single-chain update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ChainUpdate {
    pub state: Option<String>,
    pub date_next_update: Option<DateTime<Utc>>,
    pub is_locked: Option<bool>,
    pub disabled: Option<bool>,
}

impl ChainUpdate {
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn date_next_update(mut self, when: DateTime<Utc>) -> Self {
        self.date_next_update = Some(when);
        self
    }

    pub fn is_locked(mut self, locked: bool) -> Self {
        self.is_locked = Some(locked);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

/// Persistence operations the engine depends on.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// All chains of `chain_type` whose resource set intersects `resources`,
    /// with resources loaded. Match-mode filtering happens in the dispatcher.
    async fn find_chains(
        &self,
        chain_type: &str,
        resources: &[ResourcePair],
    ) -> StorageResult<Vec<StoredChain>>;

    /// Persist a new chain in the given initial state.
    async fn create_chain(&self, chain_type: &str, initial_state: &str) -> StorageResult<Chain>;

    /// Attach resource pairs to an existing chain.
    async fn attach_resources(
        &self,
        chain_id: Uuid,
        resources: &[ResourcePair],
    ) -> StorageResult<()>;

    /// Apply a field update to a single chain, returning the updated entity.
    /// Implementations bump `date_modified`.
    async fn update_chain(&self, chain_id: Uuid, update: ChainUpdate) -> StorageResult<Chain>;

    /// Atomically set `is_locked` where it is currently false. Returns true
    /// if this caller acquired the lock.
    async fn try_lock(&self, chain_id: Uuid) -> StorageResult<bool>;

    /// Clear `is_locked`.
    async fn unlock(&self, chain_id: Uuid) -> StorageResult<()>;

    /// Append one audit-log record for the chain.
    async fn append_event(
        &self,
        chain_id: Uuid,
        action: &str,
        value: &str,
        requested_by: &str,
    ) -> StorageResult<()>;

    /// Audit-log records for a chain, oldest first.
    async fn list_events(&self, chain_id: Uuid) -> StorageResult<Vec<ChainEvent>>;
}
