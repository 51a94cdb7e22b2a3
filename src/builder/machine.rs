//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{TransitionHistory, Trigger, DEFAULT_HISTORY_LIMIT};
use crate::machine::StateMachine;
use crate::resources::{ScopeManager, StateFactory};
use std::sync::Arc;

/// Name used in log events and errors when none is configured.
pub const DEFAULT_MACHINE_NAME: &str = "StateMachine";

/// Builder for constructing state machines with a fluent API.
///
/// The factory and scope manager are required; everything else has a
/// default.
pub struct StateMachineBuilder<T: Trigger> {
    factory: Option<Arc<dyn StateFactory<T>>>,
    scopes: Option<Arc<dyn ScopeManager>>,
    name: String,
    history_limit: usize,
}

impl<T: Trigger> StateMachineBuilder<T> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            factory: None,
            scopes: None,
            name: DEFAULT_MACHINE_NAME.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Set the state factory (required).
    pub fn factory<F: StateFactory<T> + 'static>(self, factory: F) -> Self {
        self.shared_factory(Arc::new(factory))
    }

    /// Set a state factory shared with other owners.
    pub fn shared_factory(mut self, factory: Arc<dyn StateFactory<T>>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the scope manager (required).
    pub fn scopes<S: ScopeManager + 'static>(self, scopes: S) -> Self {
        self.shared_scopes(Arc::new(scopes))
    }

    /// Set a scope manager shared with other owners.
    pub fn shared_scopes(mut self, scopes: Arc<dyn ScopeManager>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Label used in log events and error messages.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of transitions kept in the in-memory history. Zero disables it.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build the state machine.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<StateMachine<T>, BuildError> {
        let factory = self.factory.ok_or(BuildError::MissingFactory)?;
        let scopes = self.scopes.ok_or(BuildError::MissingScopeManager)?;
        if self.name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }

        Ok(StateMachine::from_parts(
            self.name,
            factory,
            scopes,
            TransitionHistory::with_limit(self.history_limit),
        ))
    }
}

impl<T: Trigger> Default for StateMachineBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{FactoryRegistry, ScopeArena};

    crate::trigger_enum! {
        enum Flow {
            Idle,
        }
    }

    #[test]
    fn builder_requires_factory() {
        let result = StateMachineBuilder::<Flow>::new()
            .scopes(ScopeArena::new())
            .build();

        assert!(matches!(result, Err(BuildError::MissingFactory)));
    }

    #[test]
    fn builder_requires_scope_manager() {
        let result = StateMachineBuilder::<Flow>::new()
            .factory(FactoryRegistry::<Flow>::new())
            .build();

        assert!(matches!(result, Err(BuildError::MissingScopeManager)));
    }

    #[test]
    fn builder_rejects_blank_name() {
        let result = StateMachineBuilder::<Flow>::new()
            .factory(FactoryRegistry::<Flow>::new())
            .scopes(ScopeArena::new())
            .name("  ")
            .build();

        assert!(matches!(result, Err(BuildError::EmptyName)));
    }

    #[test]
    fn fluent_api_builds_machine() {
        let scopes = Arc::new(ScopeArena::new());
        let machine = StateMachine::<Flow>::builder()
            .factory(FactoryRegistry::<Flow>::new())
            .shared_scopes(scopes)
            .name("gameplay")
            .history_limit(4)
            .build()
            .unwrap();

        assert_eq!(machine.name(), "gameplay");
        assert_eq!(machine.history().limit(), 4);
        assert_eq!(machine.current_trigger(), None);
    }
}
