//! # Chain State Machine
//!
//! The execution engine for a resolved chain: acquire the advisory lock,
//! discover the first valid transition for the current state, run exactly
//! one callback, persist the new state, append the audit event, and release
//! the lock on every exit path.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::TransitionTable;
use crate::constants::{actions, events, DONE, SYSTEM_ACTOR};
use crate::error::{DispatcherError, Result};
use crate::events::EventPublisher;
use crate::models::chain::ChainSummary;
use crate::models::Chain;
use crate::storage::{ChainStore, ChainUpdate};

use super::transition::{
    CallbackKwargs, CandidateTransition, ExecutionCallback, TransitionContext, TransitionSnapshot,
};

/// Options for one `execute` call.
#[derive(Default)]
pub struct ExecuteOptions {
    /// Discover and validate without locking, transitioning, or calling back.
    pub dry_run: bool,
    /// Fallback callback, used when the chosen transition has none of its own.
    pub callback: Option<Arc<dyn ExecutionCallback>>,
    /// Keyword arguments forwarded to whichever callback runs.
    pub callback_kwargs: CallbackKwargs,
    /// Actor recorded on the audit event; defaults to the system actor.
    pub requested_by: Option<String>,
    /// Caller-supplied context merged over each kind's defaults.
    pub initial_context: TransitionContext,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn callback(mut self, callback: Arc<dyn ExecutionCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn callback_kwargs(mut self, kwargs: CallbackKwargs) -> Self {
        self.callback_kwargs = kwargs;
        self
    }

    pub fn requested_by(mut self, actor: impl Into<String>) -> Self {
        self.requested_by = Some(actor.into());
        self
    }

    pub fn initial_context(mut self, context: TransitionContext) -> Self {
        self.initial_context = context;
        self
    }
}

/// Outcome of one `execute` call.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Validation errors accumulated from candidates that declined, keyed by
    /// the candidate's stable name.
    pub errors: BTreeMap<String, Vec<String>>,
    pub dry_run: bool,
    /// The chosen transition, or `None` when nothing validated ("not ready").
    pub transition: Option<TransitionSnapshot>,
    pub chain: ChainSummary,
}

/// A resolved chain bound to its transition table and storage.
///
/// Produced by [`Dispatcher::resolve`](crate::dispatcher::Dispatcher::resolve);
/// the transition table is configuration attached per resolution, never
/// persisted with the chain.
pub struct ChainStateMachine {
    chain: Chain,
    transitions: TransitionTable,
    store: Arc<dyn ChainStore>,
    event_publisher: EventPublisher,
}

impl std::fmt::Debug for ChainStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainStateMachine")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl ChainStateMachine {
    pub fn new(
        chain: Chain,
        transitions: TransitionTable,
        store: Arc<dyn ChainStore>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            chain,
            transitions,
            store,
            event_publisher,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn chain_id(&self) -> uuid::Uuid {
        self.chain.chain_id
    }

    pub fn current_state(&self) -> &str {
        &self.chain.state
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Run one step of the state machine.
    ///
    /// Fails fast with [`DispatcherError::ChainLocked`] on a concurrent
    /// execution and [`DispatcherError::NotScheduled`] before the chain's
    /// next-update time. A chain with no valid candidate is not an error:
    /// the report comes back with `transition: None`.
    pub async fn execute(&mut self, options: ExecuteOptions) -> Result<ExecutionReport> {
        let dry_run = options.dry_run;
        let chain_id = self.chain.chain_id;
        let requested_by = options
            .requested_by
            .clone()
            .unwrap_or_else(|| SYSTEM_ACTOR.to_string());

        if self.chain.disabled {
            warn!(%chain_id, "Chain is disabled, skipping execution");
            return Ok(self.report(BTreeMap::new(), dry_run, None));
        }

        // Prevents duplicate runs should any process take a long time
        if self.chain.is_locked && !dry_run {
            warn!(%chain_id, "Chain is locked, exiting early");
            return Err(DispatcherError::ChainLocked { chain_id });
        }

        if self.chain.date_next_update > Utc::now() {
            warn!(
                %chain_id,
                date_next_update = %self.chain.date_next_update,
                "Chain is not scheduled to update yet"
            );
            return Err(DispatcherError::NotScheduled {
                chain_id,
                date_next_update: self.chain.date_next_update,
            });
        }

        if !dry_run {
            if !self.store.try_lock(chain_id).await? {
                warn!(%chain_id, "Lost the lock race, exiting early");
                return Err(DispatcherError::ChainLocked { chain_id });
            }
            self.chain.is_locked = true;
        }

        let mut accumulated = BTreeMap::new();
        let found = match self
            .find_transition(&options.initial_context, &mut accumulated)
            .await
        {
            Ok(found) => found,
            Err(err) => {
                error!(%chain_id, error = %err, "Error while finding transition");
                if !dry_run {
                    self.release_lock_after_failure().await;
                }
                return Err(err);
            }
        };

        let Some(selected) = found else {
            debug!(%chain_id, state = %self.chain.state, "No transition validated, chain is not ready");
            self.unlock(dry_run).await?;
            return Ok(self.report(accumulated, dry_run, None));
        };

        if dry_run {
            info!(%chain_id, "Dry run, exiting without executing or transitioning");
            let snapshot = selected.snapshot();
            return Ok(self.report(accumulated, dry_run, Some(snapshot)));
        }

        if selected.kind.final_state() == DONE {
            let snapshot = selected.snapshot();
            self.close_out(&requested_by).await?;
            return Ok(self.report(accumulated, dry_run, Some(snapshot)));
        }

        let callback_result = if selected.kind.has_callback() {
            debug!(
                %chain_id,
                kind = selected.kind.name(),
                "Callback found on transition, executing"
            );
            selected
                .kind
                .callback(&self.chain, &selected.context, &options.callback_kwargs)
                .await
        } else if let Some(fallback) = options.callback.as_ref() {
            debug!(%chain_id, "Fallback callback found, executing");
            fallback
                .call(&selected.snapshot(), &options.callback_kwargs)
                .await
        } else {
            warn!(%chain_id, "Nothing configured to happen during execution");
            Ok(())
        };

        if let Err(source) = callback_result {
            error!(
                %chain_id,
                kind = selected.kind.name(),
                error = %source,
                "Error executing chain callback"
            );
            self.release_lock_after_failure().await;
            return Err(DispatcherError::TransitionExecution {
                kind: selected.kind.name().to_string(),
                source,
            });
        }

        let mut update = ChainUpdate::default()
            .state(selected.kind.final_state())
            .is_locked(false);
        if let Some(next) = selected.kind.date_next_update(&self.chain, &selected.context) {
            update = update.date_next_update(next);
        }

        match self.store.update_chain(chain_id, update).await {
            Ok(updated) => self.chain = updated,
            Err(err) => {
                self.release_lock_after_failure().await;
                return Err(err.into());
            }
        }

        self.store
            .append_event(
                chain_id,
                actions::STATE_TRANSITION,
                &self.chain.state,
                &requested_by,
            )
            .await?;
        self.event_publisher.publish(
            events::CHAIN_STATE_TRANSITION,
            chain_id,
            json!({ "state": self.chain.state, "requested_by": requested_by }),
        );
        info!(%chain_id, state = %self.chain.state, "Chain transitioned");

        let snapshot = selected.snapshot();
        Ok(self.report(accumulated, dry_run, Some(snapshot)))
    }

    /// Find the first valid transition for the current state.
    ///
    /// At `DONE`, the one kind whose final state is `DONE` is returned
    /// without validation and without touching the error accumulator. For
    /// every candidate that declines, its failure reasons land in
    /// `accumulated` under the candidate's name.
    async fn find_transition(
        &self,
        initial_context: &TransitionContext,
        accumulated: &mut BTreeMap<String, Vec<String>>,
    ) -> Result<Option<CandidateTransition>> {
        if self.chain.is_done() {
            return Ok(self
                .transitions
                .done_kind()
                .map(|kind| CandidateTransition::new(kind, initial_context)));
        }

        for kind in self.transitions.for_state(&self.chain.state) {
            let mut candidate = CandidateTransition::new(kind.clone(), initial_context);
            let valid = candidate
                .kind
                .is_valid(&self.chain, &candidate.context, &mut candidate.errors)
                .await
                .map_err(|source| DispatcherError::TransitionDiscovery {
                    kind: kind.name().to_string(),
                    source,
                })?;

            if valid {
                debug!(
                    chain_id = %self.chain.chain_id,
                    kind = kind.name(),
                    final_state = kind.final_state(),
                    "Transition validated"
                );
                return Ok(Some(candidate));
            }

            // why it did not transition
            accumulated.insert(kind.name().to_string(), std::mem::take(&mut candidate.errors));
        }

        Ok(None)
    }

    /// Persist the terminal close-out: the chain adopts `DONE`, the lock is
    /// released, and the transition is logged. Already-done chains only shed
    /// the lock, keeping repeated calls at `DONE` idempotent.
    async fn close_out(&mut self, requested_by: &str) -> Result<()> {
        let chain_id = self.chain.chain_id;

        if self.chain.is_done() {
            self.unlock(false).await?;
            return Ok(());
        }

        let update = ChainUpdate::default().state(DONE).is_locked(false);
        match self.store.update_chain(chain_id, update).await {
            Ok(updated) => self.chain = updated,
            Err(err) => {
                self.release_lock_after_failure().await;
                return Err(err.into());
            }
        }

        self.store
            .append_event(chain_id, actions::STATE_TRANSITION, DONE, requested_by)
            .await?;
        self.event_publisher.publish(
            events::CHAIN_COMPLETED,
            chain_id,
            json!({ "requested_by": requested_by }),
        );
        info!(%chain_id, "Chain completed");
        Ok(())
    }

    async fn unlock(&mut self, dry_run: bool) -> Result<()> {
        if dry_run || !self.chain.is_locked {
            return Ok(());
        }
        self.store.unlock(self.chain.chain_id).await?;
        self.chain.is_locked = false;
        Ok(())
    }

    /// Best-effort release while an error is already in flight; never masks
    /// the original failure.
    async fn release_lock_after_failure(&mut self) {
        match self.store.unlock(self.chain.chain_id).await {
            Ok(()) => self.chain.is_locked = false,
            Err(err) => error!(
                chain_id = %self.chain.chain_id,
                error = %err,
                "Failed to release lock while handling an execution failure"
            ),
        }
    }

    fn report(
        &self,
        errors: BTreeMap<String, Vec<String>>,
        dry_run: bool,
        transition: Option<TransitionSnapshot>,
    ) -> ExecutionReport {
        ExecutionReport {
            errors,
            dry_run,
            transition,
            chain: ChainSummary::from(&self.chain),
        }
    }
}
