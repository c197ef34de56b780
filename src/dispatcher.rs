//! # Dispatcher
//!
//! Resolution service: given a chain type and a set of resource references,
//! return exactly one chain — existing or freshly created — with its
//! transition table attached.
//!
//! Matching is explicit: [`MatchMode::Exact`] requires the stored resource
//! set to equal the request, [`MatchMode::Subset`] requires every requested
//! pair to be present on the chain while tolerating extras. More than one
//! match is a data-integrity signal and always raises; the dispatcher never
//! silently picks one.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::DispatcherConfig;
use crate::constants::events;
use crate::error::{DispatcherError, Result};
use crate::events::EventPublisher;
use crate::models::ResourcePair;
use crate::state_machine::ChainStateMachine;
use crate::storage::{ChainStore, StoredChain};

/// Policy controlling whether extra resources on a stored chain disqualify a
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The chain's resource set must be set-equal to the request.
    Exact,
    /// Every requested pair must be present on the chain; the chain may
    /// carry additional untouched resources.
    Subset,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Subset => write!(f, "subset"),
        }
    }
}

/// Chain resolution front door.
pub struct Dispatcher {
    config: DispatcherConfig,
    store: Arc<dyn ChainStore>,
    event_publisher: EventPublisher,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig, store: Arc<dyn ChainStore>) -> Self {
        Self {
            config,
            store,
            event_publisher: EventPublisher::default(),
        }
    }

    pub fn with_event_publisher(
        config: DispatcherConfig,
        store: Arc<dyn ChainStore>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            config,
            store,
            event_publisher,
        }
    }

    pub fn event_publisher(&self) -> &EventPublisher {
        &self.event_publisher
    }

    /// Resolve the chain identified by `resource_mappings` under `mode`,
    /// creating it when nothing matches.
    ///
    /// The returned machine carries the chain type's transition table;
    /// resolving the same mapping twice under [`MatchMode::Exact`] lands on
    /// the same chain.
    pub async fn resolve(
        &self,
        chain_type: &str,
        resource_mappings: &[ResourcePair],
        mode: MatchMode,
    ) -> Result<ChainStateMachine> {
        if resource_mappings.is_empty() {
            return Err(DispatcherError::invalid_resource(
                "at least one resource mapping is required",
            ));
        }
        for pair in resource_mappings {
            pair.validate()?;
        }

        let config = self
            .config
            .get(chain_type)
            .ok_or_else(|| DispatcherError::unknown_chain_type(chain_type))?;

        let candidates = self.store.find_chains(chain_type, resource_mappings).await?;
        let requested: HashSet<&ResourcePair> = resource_mappings.iter().collect();
        let matched: Vec<&StoredChain> = candidates
            .iter()
            .filter(|stored| {
                let owned: HashSet<&ResourcePair> = stored.resources.iter().collect();
                match mode {
                    MatchMode::Exact => owned == requested,
                    MatchMode::Subset => requested.is_subset(&owned),
                }
            })
            .collect();

        let chain = match matched.as_slice() {
            [] => {
                let initial_state = config.transitions.initial_state().ok_or_else(|| {
                    DispatcherError::configuration(chain_type, "empty transition table")
                })?;
                let chain = self.store.create_chain(chain_type, initial_state).await?;
                self.store
                    .attach_resources(chain.chain_id, resource_mappings)
                    .await?;
                self.event_publisher.publish(
                    events::CHAIN_CREATED,
                    chain.chain_id,
                    json!({
                        "chain_type": chain_type,
                        "state": chain.state,
                        "resources": resource_mappings,
                    }),
                );
                info!(
                    chain_id = %chain.chain_id,
                    %chain_type,
                    state = %chain.state,
                    "Created new chain"
                );
                chain
            }
            [single] => {
                debug!(
                    chain_id = %single.chain.chain_id,
                    %chain_type,
                    %mode,
                    "Resolved existing chain"
                );
                single.chain.clone()
            }
            many => {
                return Err(DispatcherError::ambiguous_chain(chain_type, many.len()));
            }
        };

        Ok(ChainStateMachine::new(
            chain,
            config.transitions.clone(),
            self.store.clone(),
            self.event_publisher.clone(),
        ))
    }
}
