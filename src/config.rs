//! # Dispatcher Configuration
//!
//! Configuration is code-registered, not persisted: transition tables hold
//! trait objects, so they are constructed at startup and attached to chains
//! during resolution.
//!
//! Declaration order is semantic in two places: a table's *first* declared
//! state is the initial state for newly created chains, and within a state
//! the kinds are tried in the order they were registered.

use std::sync::Arc;

use crate::constants::DONE;
use crate::state_machine::TransitionKind;

/// Ordered state → transition-kinds table for one chain type.
#[derive(Clone, Default)]
pub struct TransitionTable {
    states: Vec<(String, Vec<Arc<dyn TransitionKind>>)>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the ordered candidate list for a state. States are kept in
    /// registration order; registering the same state twice keeps the first
    /// entry authoritative.
    pub fn state(
        mut self,
        state: impl Into<String>,
        kinds: Vec<Arc<dyn TransitionKind>>,
    ) -> Self {
        self.states.push((state.into(), kinds));
        self
    }

    /// Initial state for chains of this type: the first declared state.
    pub fn initial_state(&self) -> Option<&str> {
        self.states.first().map(|(state, _)| state.as_str())
    }

    /// Ordered candidates for a state. Empty when the state has no bucket.
    pub fn for_state(&self, state: &str) -> &[Arc<dyn TransitionKind>] {
        self.states
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, kinds)| kinds.as_slice())
            .unwrap_or(&[])
    }

    /// The terminal marker: the first kind across all buckets whose final
    /// state is [`DONE`].
    pub fn done_kind(&self) -> Option<Arc<dyn TransitionKind>> {
        self.states
            .iter()
            .flat_map(|(_, kinds)| kinds.iter())
            .find(|kind| kind.final_state() == DONE)
            .cloned()
    }

    /// Declared states in registration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(state, _)| state.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl std::fmt::Debug for TransitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (state, kinds) in &self.states {
            map.entry(
                state,
                &kinds.iter().map(|k| k.name()).collect::<Vec<_>>(),
            );
        }
        map.finish()
    }
}

/// Configuration for one chain type.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_type: String,
    pub transitions: TransitionTable,
}

impl ChainConfig {
    pub fn new(chain_type: impl Into<String>, transitions: TransitionTable) -> Self {
        Self {
            chain_type: chain_type.into(),
            transitions,
        }
    }
}

/// Top-level configuration: the set of chain types the dispatcher serves.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    chains: Vec<ChainConfig>,
}

impl DispatcherConfig {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    /// Builder-style registration of one chain type.
    pub fn chain(mut self, config: ChainConfig) -> Self {
        self.chains.push(config);
        self
    }

    /// Configuration for a chain type, if registered.
    pub fn get(&self, chain_type: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_type == chain_type)
    }

    pub fn chain_types(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|c| c.chain_type.as_str())
    }
}
