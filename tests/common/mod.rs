//! Shared fixtures: configurable transition kinds, a counting fallback
//! callback, and the sample chain configuration used across the scenario
//! tests.
#![allow(dead_code)] // not every test binary exercises every fixture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use dispatcher_core::{
    Chain, ChainConfig, DispatcherConfig, ExecutionCallback, TransitionContext, TransitionKind,
    TransitionSnapshot, TransitionTable,
};
use dispatcher_core::state_machine::{CallbackKwargs, TransitionResult};

static TRACING: Once = Once::new();

/// Install a per-test tracing subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const NEW: &str = "new";
pub const T1_DONE: &str = "t1_done";
pub const T2_DONE: &str = "t2_done";
pub const T3_DONE: &str = "t3_done";
pub const T4_DONE: &str = "t4_done";

/// A transition kind with fixed validity and no callback of its own. Counts
/// how often it is asked to validate, so tests can assert discovery
/// short-circuits after the first valid candidate.
pub struct FixtureTransition {
    name: &'static str,
    final_state: &'static str,
    valid: bool,
    evaluations: AtomicUsize,
}

impl FixtureTransition {
    pub fn new(name: &'static str, final_state: &'static str, valid: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            final_state,
            valid,
            evaluations: AtomicUsize::new(0),
        })
    }

    /// How many times `is_valid` was invoked.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransitionKind for FixtureTransition {
    fn name(&self) -> &'static str {
        self.name
    }

    fn final_state(&self) -> &str {
        self.final_state
    }

    async fn is_valid(
        &self,
        _chain: &Chain,
        _context: &TransitionContext,
        errors: &mut Vec<String>,
    ) -> TransitionResult<bool> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        if !self.valid {
            errors.push(format!("{} declined", self.name));
        }
        Ok(self.valid)
    }
}

/// Fallback callback that counts its invocations.
#[derive(Default)]
pub struct CountingCallback {
    calls: AtomicUsize,
}

impl CountingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionCallback for CountingCallback {
    async fn call(
        &self,
        _transition: &TransitionSnapshot,
        _kwargs: &CallbackKwargs,
    ) -> TransitionResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The sample configuration driving the scenario walks:
///
/// ```text
/// new:     [T1, T2]
/// t1_done: [T3]
/// t2_done: [T4]
/// ```
///
/// with T1/T2 validity controlled per test.
pub fn sample_config(t1_valid: bool, t2_valid: bool) -> DispatcherConfig {
    sample_config_with_handles(t1_valid, t2_valid).0
}

/// Like [`sample_config`], but also hands back the T1/T2 fixtures so tests
/// can inspect their evaluation counts.
pub fn sample_config_with_handles(
    t1_valid: bool,
    t2_valid: bool,
) -> (DispatcherConfig, Arc<FixtureTransition>, Arc<FixtureTransition>) {
    let t1 = FixtureTransition::new("T1", T1_DONE, t1_valid);
    let t2 = FixtureTransition::new("T2", T2_DONE, t2_valid);
    let config = DispatcherConfig::default().chain(ChainConfig::new(
        "sample_chain",
        TransitionTable::new()
            .state(
                NEW,
                vec![t1.clone() as Arc<dyn TransitionKind>, t2.clone()],
            )
            .state(
                T1_DONE,
                vec![FixtureTransition::new("T3", T3_DONE, true) as Arc<dyn TransitionKind>],
            )
            .state(
                T2_DONE,
                vec![FixtureTransition::new("T4", T4_DONE, true) as Arc<dyn TransitionKind>],
            ),
    ));
    (config, t1, t2)
}
