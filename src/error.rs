//! Error types reported by the state machine and its collaborators.

use std::fmt;
use thiserror::Error;

/// Boxed error returned by lifecycle and hook callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a single lifecycle or hook callback.
pub type CallbackResult = Result<(), BoxError>;

/// Step of the transition sequence a callback failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Outgoing state's pre-exit callback
    BeforeExit,
    /// Incoming state's pre-enter callback
    BeforeEnter,
    HookBeforeExit,
    /// Outgoing state's exit callback
    Exit,
    HookAfterExit,
    HookBeforeEnter,
    /// Incoming state's enter callback
    Enter,
    HookAfterEnter,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeforeExit => "before-exit",
            Self::BeforeEnter => "before-enter",
            Self::HookBeforeExit => "hook before-exit",
            Self::Exit => "exit",
            Self::HookAfterExit => "hook after-exit",
            Self::HookBeforeEnter => "hook before-enter",
            Self::Enter => "enter",
            Self::HookAfterEnter => "hook after-enter",
        };
        f.write_str(name)
    }
}

/// Errors raised by [`StateFactory`](crate::resources::StateFactory) implementations.
#[derive(Debug, Error)]
pub enum InstantiationError {
    #[error("No constructor registered for state '{state}'")]
    NotRegistered { state: &'static str },

    #[error("Constructing state '{state}' failed: {source}")]
    Construction {
        state: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Factory produced '{produced}' when '{expected}' was requested")]
    TypeMismatch {
        expected: &'static str,
        produced: &'static str,
    },
}

/// Errors raised by [`ScopeManager`](crate::resources::ScopeManager) implementations.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Scope {0} is not live (never created or already released)")]
    UnknownScope(uuid::Uuid),

    #[error("Scope operation failed: {0}")]
    Failed(#[source] BoxError),
}

/// Errors reported to callers of the state machine.
///
/// Validation failures (`UnknownTrigger`, `UntrackedCurrentState`,
/// `TransitionNotAllowed`, `CapabilityMismatch`) never mutate the machine.
/// Failures raised while the lifecycle sequence runs may leave the transition
/// partially applied; the transition guard is always released.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("State machine '{machine}' has no registered state for trigger '{trigger}'")]
    UnknownTrigger { machine: String, trigger: String },

    #[error(
        "State machine '{machine}' cannot map current state '{state}' to a trigger ({matches} registered triggers match)"
    )]
    UntrackedCurrentState {
        machine: String,
        state: &'static str,
        matches: usize,
    },

    #[error("State machine '{machine}' does not allow a transition from '{from}' to '{to}'")]
    TransitionNotAllowed {
        machine: String,
        from: String,
        to: String,
    },

    #[error("Hook is already attached to the state machine")]
    DuplicateHook,

    #[error("Trigger '{trigger}' targets a {expected} state but was fired with {found}")]
    CapabilityMismatch {
        trigger: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Instantiation(#[from] InstantiationError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("{phase} callback failed: {source}")]
    Callback {
        phase: Phase,
        #[source]
        source: BoxError,
    },

    #[error("Transition was cancelled")]
    Cancelled,

    #[error("State machine has been disposed")]
    Disposed,
}

impl MachineError {
    pub(crate) fn callback(phase: Phase) -> impl FnOnce(BoxError) -> Self {
        move |source| Self::Callback { phase, source }
    }

    /// True for failures detected before any state was touched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownTrigger { .. }
                | Self::UntrackedCurrentState { .. }
                | Self::TransitionNotAllowed { .. }
                | Self::CapabilityMismatch { .. }
                | Self::Disposed
        )
    }
}
