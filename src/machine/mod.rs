//! The state machine engine and its state-changed notifications.

mod engine;
mod subscribers;

pub use engine::StateMachine;
pub use subscribers::{StateChange, StateChangedCallback};
