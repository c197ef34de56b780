//! # Transition Contract
//!
//! A [`TransitionKind`] is a registered, polymorphic unit of work: it names
//! the state the chain reaches if chosen, validates its own applicability,
//! and optionally carries a side-effecting callback and a next-update
//! override. Kinds are registered per state in a
//! [`TransitionTable`](crate::config::TransitionTable); the engine tries them
//! in declaration order and the first valid one wins.
//!
//! Per attempt, the engine builds a [`CandidateTransition`]: the kind plus a
//! merged context and a *fresh* error list. Error lists are never shared
//! between attempts, so one candidate's failure reasons cannot bleed into
//! another's.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::models::Chain;

/// Error raised from within a transition kind: a hard validation failure or
/// a failed callback. Wrapped by the dispatcher error taxonomy with the
/// original cause preserved.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransitionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransitionError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias for transition-kind operations.
pub type TransitionResult<T> = std::result::Result<T, TransitionError>;

/// Keyword arguments forwarded verbatim to the chosen callback.
pub type CallbackKwargs = Map<String, Value>;

/// Arbitrary key/value data flowing into a transition attempt.
///
/// Built by merging the caller-supplied initial context over the kind's
/// static defaults; caller values win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionContext(Map<String, Value>);

impl TransitionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `overrides` on top of `self`, overrides winning on key clashes.
    pub fn merged_over(&self, overrides: &TransitionContext) -> TransitionContext {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            merged.insert(key.clone(), value.clone());
        }
        TransitionContext(merged)
    }
}

impl From<Map<String, Value>> for TransitionContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A registered transition kind.
///
/// `is_valid` must not mutate chain state; it records the reasons a
/// candidate declined into the per-attempt error list and reserves `Err` for
/// hard failures (e.g. a collaborator lookup blowing up), which abort
/// discovery entirely.
#[async_trait]
pub trait TransitionKind: Send + Sync {
    /// Stable identifier, used to key accumulated validation errors.
    fn name(&self) -> &'static str;

    /// State the chain moves to if this transition is chosen. A kind whose
    /// final state is [`DONE`](crate::constants::DONE) is the chain's
    /// terminal marker.
    fn final_state(&self) -> &str;

    /// Static context defaults for this kind. The caller-supplied initial
    /// context is merged over these.
    fn default_context(&self) -> TransitionContext {
        TransitionContext::new()
    }

    /// Whether this transition applies to the chain right now. Push failure
    /// reasons into `errors`.
    async fn is_valid(
        &self,
        chain: &Chain,
        context: &TransitionContext,
        errors: &mut Vec<String>,
    ) -> TransitionResult<bool>;

    /// Optional override for the chain's next-eligible-execution timestamp,
    /// adopted after a successful transition.
    fn date_next_update(&self, _chain: &Chain, _context: &TransitionContext) -> Option<DateTime<Utc>> {
        None
    }

    /// Whether this kind carries its own callback. When false, the engine
    /// falls back to the caller-supplied callback, if any.
    fn has_callback(&self) -> bool {
        false
    }

    /// Side-effecting action executed exactly once when this transition is
    /// chosen outside a dry run. Only called when `has_callback()` is true.
    async fn callback(
        &self,
        _chain: &Chain,
        _context: &TransitionContext,
        _kwargs: &CallbackKwargs,
    ) -> TransitionResult<()> {
        Ok(())
    }
}

/// Caller-supplied fallback callback, invoked when the chosen transition has
/// none of its own.
#[async_trait]
pub trait ExecutionCallback: Send + Sync {
    async fn call(
        &self,
        transition: &TransitionSnapshot,
        kwargs: &CallbackKwargs,
    ) -> TransitionResult<()>;
}

/// One transition attempt: a kind plus its merged context and an error list
/// exclusive to this attempt.
pub struct CandidateTransition {
    pub kind: Arc<dyn TransitionKind>,
    pub context: TransitionContext,
    pub errors: Vec<String>,
}

impl CandidateTransition {
    /// Build a fresh candidate, merging the caller context over the kind's
    /// defaults.
    pub fn new(kind: Arc<dyn TransitionKind>, initial_context: &TransitionContext) -> Self {
        let context = kind.default_context().merged_over(initial_context);
        Self {
            kind,
            context,
            errors: Vec::new(),
        }
    }

    /// Serializable view of this candidate for reports and callbacks.
    pub fn snapshot(&self) -> TransitionSnapshot {
        TransitionSnapshot {
            name: self.kind.name().to_string(),
            final_state: self.kind.final_state().to_string(),
            context: self.context.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl std::fmt::Debug for CandidateTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateTransition")
            .field("kind", &self.kind.name())
            .field("final_state", &self.kind.final_state())
            .field("errors", &self.errors)
            .finish()
    }
}

/// Serializable view of a (selected or attempted) transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSnapshot {
    pub name: String,
    pub final_state: String,
    pub context: TransitionContext,
    pub errors: Vec<String>,
}
