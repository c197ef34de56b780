//! In-memory [`ChainStore`] implementation backing the test suite and
//! embedded single-process use.
//!
//! All record maps sit behind one mutex, so `try_lock` is atomic with
//! respect to every other store operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::{Chain, ChainEvent, ChainResource, ResourcePair};

use super::{ChainStore, ChainUpdate, StorageError, StorageResult, StoredChain};

#[derive(Default)]
struct Records {
    chains: HashMap<Uuid, Chain>,
    resources: Vec<ChainResource>,
    events: Vec<ChainEvent>,
}

/// Thread-safe in-memory chain store.
#[derive(Clone, Default)]
pub struct InMemoryChainStore {
    records: Arc<Mutex<Records>>,
}

impl InMemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a chain by id, mostly useful for test assertions.
    pub fn get_chain(&self, chain_id: Uuid) -> Option<Chain> {
        self.records.lock().chains.get(&chain_id).cloned()
    }

    /// Number of stored chains.
    pub fn chain_count(&self) -> usize {
        self.records.lock().chains.len()
    }

    /// Resource pairs attached to a chain.
    pub fn resources_for(&self, chain_id: Uuid) -> Vec<ResourcePair> {
        self.records
            .lock()
            .resources
            .iter()
            .filter(|r| r.chain_id == chain_id)
            .map(ChainResource::pair)
            .collect()
    }
}

#[async_trait]
impl ChainStore for InMemoryChainStore {
    async fn find_chains(
        &self,
        chain_type: &str,
        resources: &[ResourcePair],
    ) -> StorageResult<Vec<StoredChain>> {
        let records = self.records.lock();

        let mut matched = Vec::new();
        for chain in records.chains.values() {
            if chain.chain_type != chain_type {
                continue;
            }
            let owned: Vec<ResourcePair> = records
                .resources
                .iter()
                .filter(|r| r.chain_id == chain.chain_id)
                .map(ChainResource::pair)
                .collect();
            if owned.iter().any(|pair| resources.contains(pair)) {
                matched.push(StoredChain {
                    chain: chain.clone(),
                    resources: owned,
                });
            }
        }

        // Stable order for deterministic tests
        matched.sort_by_key(|stored| stored.chain.date_created);
        Ok(matched)
    }

    async fn create_chain(&self, chain_type: &str, initial_state: &str) -> StorageResult<Chain> {
        let chain = Chain::new(chain_type, initial_state);
        self.records
            .lock()
            .chains
            .insert(chain.chain_id, chain.clone());
        Ok(chain)
    }

    async fn attach_resources(
        &self,
        chain_id: Uuid,
        resources: &[ResourcePair],
    ) -> StorageResult<()> {
        let mut records = self.records.lock();
        if !records.chains.contains_key(&chain_id) {
            return Err(StorageError::chain_not_found(chain_id));
        }
        for pair in resources {
            let already_attached = records
                .resources
                .iter()
                .any(|r| r.chain_id == chain_id && &r.pair() == pair);
            if !already_attached {
                records.resources.push(ChainResource::new(chain_id, pair));
            }
        }
        Ok(())
    }

    async fn update_chain(&self, chain_id: Uuid, update: ChainUpdate) -> StorageResult<Chain> {
        let mut records = self.records.lock();
        let chain = records
            .chains
            .get_mut(&chain_id)
            .ok_or(StorageError::ChainNotFound { chain_id })?;

        if let Some(state) = update.state {
            chain.state = state;
        }
        if let Some(when) = update.date_next_update {
            chain.date_next_update = when;
        }
        if let Some(locked) = update.is_locked {
            chain.is_locked = locked;
        }
        if let Some(disabled) = update.disabled {
            chain.disabled = disabled;
        }
        chain.date_modified = Utc::now();

        Ok(chain.clone())
    }

    async fn try_lock(&self, chain_id: Uuid) -> StorageResult<bool> {
        let mut records = self.records.lock();
        let chain = records
            .chains
            .get_mut(&chain_id)
            .ok_or(StorageError::ChainNotFound { chain_id })?;

        if chain.is_locked {
            return Ok(false);
        }
        chain.is_locked = true;
        chain.date_modified = Utc::now();
        Ok(true)
    }

    async fn unlock(&self, chain_id: Uuid) -> StorageResult<()> {
        let mut records = self.records.lock();
        let chain = records
            .chains
            .get_mut(&chain_id)
            .ok_or(StorageError::ChainNotFound { chain_id })?;
        chain.is_locked = false;
        chain.date_modified = Utc::now();
        Ok(())
    }

    async fn append_event(
        &self,
        chain_id: Uuid,
        action: &str,
        value: &str,
        requested_by: &str,
    ) -> StorageResult<()> {
        let mut records = self.records.lock();
        if !records.chains.contains_key(&chain_id) {
            return Err(StorageError::chain_not_found(chain_id));
        }
        records
            .events
            .push(ChainEvent::new(chain_id, action, value, requested_by));
        Ok(())
    }

    async fn list_events(&self, chain_id: Uuid) -> StorageResult<Vec<ChainEvent>> {
        Ok(self
            .records
            .lock()
            .events
            .iter()
            .filter(|e| e.chain_id == chain_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn try_lock_is_exclusive() {
        let store = InMemoryChainStore::new();
        let chain = store.create_chain("sample_chain", "new").await.unwrap();

        assert!(store.try_lock(chain.chain_id).await.unwrap());
        assert!(!store.try_lock(chain.chain_id).await.unwrap());

        store.unlock(chain.chain_id).await.unwrap();
        assert!(store.try_lock(chain.chain_id).await.unwrap());
    }

    #[tokio::test]
    async fn find_chains_requires_intersection() {
        let store = InMemoryChainStore::new();
        let chain = store.create_chain("sample_chain", "new").await.unwrap();
        store
            .attach_resources(
                chain.chain_id,
                &[ResourcePair::new("rsc1", "123"), ResourcePair::new("rsc2", "456")],
            )
            .await
            .unwrap();

        let hits = store
            .find_chains("sample_chain", &[ResourcePair::new("rsc1", "123")])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].resources.len(), 2);

        let misses = store
            .find_chains("sample_chain", &[ResourcePair::new("rsc9", "999")])
            .await
            .unwrap();
        assert!(misses.is_empty());

        let wrong_type = store
            .find_chains("other_chain", &[ResourcePair::new("rsc1", "123")])
            .await
            .unwrap();
        assert!(wrong_type.is_empty());
    }

    #[tokio::test]
    async fn attach_resources_is_idempotent_per_pair() {
        let store = InMemoryChainStore::new();
        let chain = store.create_chain("sample_chain", "new").await.unwrap();
        let pair = ResourcePair::new("rsc1", "123");

        store.attach_resources(chain.chain_id, &[pair.clone()]).await.unwrap();
        store.attach_resources(chain.chain_id, &[pair]).await.unwrap();

        assert_eq!(store.resources_for(chain.chain_id).len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_chain_fails() {
        let store = InMemoryChainStore::new();
        let result = store
            .update_chain(Uuid::new_v4(), ChainUpdate::default().state("done"))
            .await;
        assert!(matches!(result, Err(StorageError::ChainNotFound { .. })));
    }

    // The store has no runtime requirements of its own; embedders may drive
    // it from a synchronous context.
    #[test]
    fn store_is_usable_from_a_sync_context() {
        let store = InMemoryChainStore::new();
        let chain = tokio_test::block_on(store.create_chain("sample_chain", "new")).unwrap();
        tokio_test::block_on(
            store.attach_resources(chain.chain_id, &[ResourcePair::new("rsc1", "123")]),
        )
        .unwrap();

        assert!(tokio_test::block_on(store.try_lock(chain.chain_id)).unwrap());
        assert!(!tokio_test::block_on(store.try_lock(chain.chain_id)).unwrap());
        assert_eq!(store.resources_for(chain.chain_id).len(), 1);
    }
}
