//! Issues reported by the graph lint.

use thiserror::Error;

/// A configuration defect found in the transition table.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphIssue {
    #[error("Transition '{from}' -> '{to}' starts at a trigger with no registered state")]
    UnregisteredSource { from: String, to: String },

    #[error("Transition '{from}' -> '{to}' targets a trigger with no registered state")]
    UnregisteredTarget { from: String, to: String },

    #[error("State '{state}' is bound to several triggers {triggers:?}; it cannot be mapped back once current")]
    SharedStateType {
        state: &'static str,
        triggers: Vec<String>,
    },
}
