#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatcher Core
//!
//! A generic finite-state-machine execution engine for multi-step workflows.
//!
//! ## Overview
//!
//! Entities ("chains") are identified by a set of opaque external resource
//! references, progress through configured states via validated transitions,
//! and invoke a callback on each successful transition. Chain lookup and
//! creation are idempotent, and an advisory persisted lock protects against
//! concurrent duplicate execution.
//!
//! ## Architecture
//!
//! The [`Dispatcher`](dispatcher::Dispatcher) resolves a chain type plus a
//! resource mapping to exactly one [`ChainStateMachine`](state_machine::ChainStateMachine)
//! — existing or newly created — with the chain type's transition table
//! attached. `execute` then locks the chain, tries the configured
//! [`TransitionKind`](state_machine::TransitionKind)s for the current state
//! in declaration order, runs exactly one callback for the first valid
//! candidate, persists the new state, appends an audit event, and releases
//! the lock on every exit path.
//!
//! Persistence is an external collaborator behind the
//! [`ChainStore`](storage::ChainStore) trait;
//! [`InMemoryChainStore`](storage::InMemoryChainStore) serves tests and
//! embedded use.
//!
//! ## Module Organization
//!
//! - [`models`] - Chain entity, resource references, audit records
//! - [`config`] - Chain-type configuration and ordered transition tables
//! - [`dispatcher`] - Resource-based chain resolution (exact/subset match)
//! - [`state_machine`] - Transition contract and the execution engine
//! - [`storage`] - Storage collaborator trait and in-memory implementation
//! - [`events`] - In-process lifecycle event publisher
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dispatcher_core::config::{ChainConfig, DispatcherConfig, TransitionTable};
//! use dispatcher_core::dispatcher::{Dispatcher, MatchMode};
//! use dispatcher_core::models::ResourcePair;
//! use dispatcher_core::state_machine::{ExecuteOptions, TransitionKind};
//! use dispatcher_core::storage::InMemoryChainStore;
//!
//! # async fn example(welcome: Arc<dyn TransitionKind>) -> dispatcher_core::Result<()> {
//! let config = DispatcherConfig::default().chain(ChainConfig::new(
//!     "signup_emails",
//!     TransitionTable::new().state("new", vec![welcome]),
//! ));
//! let dispatcher = Dispatcher::new(config, Arc::new(InMemoryChainStore::new()));
//!
//! let mut machine = dispatcher
//!     .resolve(
//!         "signup_emails",
//!         &[ResourcePair::new("traveller", "123")],
//!         MatchMode::Exact,
//!     )
//!     .await?;
//! let report = machine.execute(ExecuteOptions::new()).await?;
//! println!("chain {} is now {}", report.chain.id, report.chain.state);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod models;
pub mod state_machine;
pub mod storage;

pub use config::{ChainConfig, DispatcherConfig, TransitionTable};
pub use dispatcher::{Dispatcher, MatchMode};
pub use error::{DispatcherError, Result};
pub use events::{EventPublisher, LifecycleEvent};
pub use models::{Chain, ChainEvent, ChainResource, ChainSummary, ResourcePair};
pub use state_machine::{
    ChainStateMachine, ExecuteOptions, ExecutionCallback, ExecutionReport, TransitionContext,
    TransitionError, TransitionKind, TransitionSnapshot,
};
pub use storage::{ChainStore, ChainUpdate, InMemoryChainStore, StorageError, StoredChain};
