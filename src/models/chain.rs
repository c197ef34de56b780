//! # Chain Model
//!
//! The state-machine entity. A chain is identified by a set of external
//! resource references (see [`ChainResource`](super::ChainResource)) and
//! progresses through the states of its configured transition table.
//!
//! The transition table itself, the dry-run flag and the validation-error
//! accumulator are engine concerns and never live on the entity; storage only
//! ever sees the fields below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DONE;

/// A stateful workflow instance.
///
/// `is_locked` is the advisory mutual-exclusion flag persisted alongside the
/// chain; while it is set, no other `execute` call may proceed for this
/// chain. `date_next_update` is the earliest time the chain may execute
/// again; it is consumed here, never computed (scheduling is an external
/// collaborator's job).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: Uuid,
    /// Tag selecting the transition table for this chain.
    pub chain_type: String,
    /// Current node in the state machine.
    pub state: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    /// Earliest time this chain may execute again.
    pub date_next_update: DateTime<Utc>,
    /// Soft retirement marker; execution is a no-op while set.
    pub disabled: bool,
    /// Advisory single-writer lock flag.
    pub is_locked: bool,
}

impl Chain {
    /// Create a fresh chain in the given initial state.
    pub fn new(chain_type: impl Into<String>, initial_state: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            chain_id: Uuid::new_v4(),
            chain_type: chain_type.into(),
            state: initial_state.into(),
            date_created: now,
            date_modified: now,
            date_next_update: now,
            disabled: false,
            is_locked: false,
        }
    }

    /// Check if the chain has reached the terminal pseudo-state.
    pub fn is_done(&self) -> bool {
        self.state == DONE
    }
}

/// Condensed chain view carried on execution reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub id: Uuid,
    pub state: String,
}

impl From<&Chain> for ChainSummary {
    fn from(chain: &Chain) -> Self {
        Self {
            id: chain.chain_id,
            state: chain.state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chain_starts_unlocked_and_enabled() {
        let chain = Chain::new("sample_chain", "new");
        assert_eq!(chain.state, "new");
        assert!(!chain.is_locked);
        assert!(!chain.disabled);
        assert!(!chain.is_done());
    }

    #[test]
    fn done_state_is_terminal() {
        let chain = Chain::new("sample_chain", DONE);
        assert!(chain.is_done());
    }
}
