//! Build errors for the state machine builder.

use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("State factory not specified. Call .factory(..) before .build()")]
    MissingFactory,

    #[error("Scope manager not specified. Call .scopes(..) before .build()")]
    MissingScopeManager,

    #[error("Machine name must not be empty")]
    EmptyName,
}
