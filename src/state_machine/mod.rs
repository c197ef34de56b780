// State machine module for chain execution
//
// The transition contract lives in `transition`; the execute engine (lock,
// discovery, callback, persistence, unlock) lives in `chain_state_machine`.

pub mod chain_state_machine;
pub mod transition;

pub use chain_state_machine::{ChainStateMachine, ExecuteOptions, ExecutionReport};
pub use transition::{
    CallbackKwargs, CandidateTransition, ExecutionCallback, TransitionContext, TransitionError,
    TransitionKind, TransitionResult, TransitionSnapshot,
};
