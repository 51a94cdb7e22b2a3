//! Cross-cutting observers notified around every enter and exit.

use super::state::StateType;
use crate::error::{CallbackResult, MachineError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Passed to hooks around an enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookEnterPayload {
    pub target: StateType,
}

/// Passed to hooks around an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookExitPayload {
    pub current: StateType,
    pub target: StateType,
}

/// Observer of the transition sequence, independent of any specific state.
///
/// All methods default to doing nothing. Returning an error aborts the
/// transition at that point; the error reaches the `fire` caller.
#[async_trait]
pub trait StateMachineHook: Send + Sync {
    async fn on_before_enter(
        &self,
        _payload: &HookEnterPayload,
        _cancel: &CancellationToken,
    ) -> CallbackResult {
        Ok(())
    }

    async fn on_after_enter(
        &self,
        _payload: &HookEnterPayload,
        _cancel: &CancellationToken,
    ) -> CallbackResult {
        Ok(())
    }

    async fn on_before_exit(
        &self,
        _payload: &HookExitPayload,
        _cancel: &CancellationToken,
    ) -> CallbackResult {
        Ok(())
    }

    async fn on_after_exit(
        &self,
        _payload: &HookExitPayload,
        _cancel: &CancellationToken,
    ) -> CallbackResult {
        Ok(())
    }
}

pub type SharedHook = Arc<dyn StateMachineHook>;

fn same_hook(a: &SharedHook, b: &SharedHook) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Set of hooks keyed by `Arc` identity.
///
/// Iteration happens over a snapshot, so adding or removing hooks while a
/// transition runs only affects later phases.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<SharedHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, hook: SharedHook) -> Result<(), MachineError> {
        let mut hooks = self.hooks.write();
        if hooks.iter().any(|existing| same_hook(existing, &hook)) {
            return Err(MachineError::DuplicateHook);
        }
        hooks.push(hook);
        Ok(())
    }

    /// Remove `hook` if attached. Returns whether anything was removed.
    pub fn remove(&self, hook: &SharedHook) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|existing| !same_hook(existing, hook));
        hooks.len() != before
    }

    pub fn snapshot(&self) -> Vec<SharedHook> {
        self.hooks.read().clone()
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }
}
