//! Append-only audit records owned by a chain. Events are written once on
//! each successful state transition and never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audit-log entry for a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub chain_id: Uuid,
    /// Action tag, e.g. [`actions::STATE_TRANSITION`](crate::constants::actions::STATE_TRANSITION).
    pub action: String,
    /// Recorded value; for state transitions, the new state.
    pub value: String,
    /// Actor that requested the execution.
    pub requested_by: String,
    pub date_created: DateTime<Utc>,
}

impl ChainEvent {
    pub fn new(
        chain_id: Uuid,
        action: impl Into<String>,
        value: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            action: action.into(),
            value: value.into(),
            requested_by: requested_by.into(),
            date_created: Utc::now(),
        }
    }
}
