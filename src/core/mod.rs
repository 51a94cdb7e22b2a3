//! Core state machine types.
//!
//! This module holds the data the engine works on:
//! - Triggers and the state lifecycle traits
//! - Type-erased state instances
//! - The transition table and its reverse index
//! - Hooks and the transition history

mod history;
mod hook;
mod instance;
mod state;
mod table;
mod trigger;

pub(crate) use instance::ErasedPayload;

pub use history::{TransitionHistory, TransitionRecord, DEFAULT_HISTORY_LIMIT};
pub use hook::{HookEnterPayload, HookExitPayload, HookRegistry, SharedHook, StateMachineHook};
pub use instance::StateInstance;
pub use state::{PayloadState, PayloadType, PureState, State, StateKind, StateType};
pub use table::{ReverseLookup, TransitionTable};
pub use trigger::Trigger;
