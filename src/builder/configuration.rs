//! Fluent configuration handle bound to one trigger.

use crate::core::Trigger;
use crate::machine::StateMachine;

/// Handle returned by registration calls, scoped to a single trigger.
///
/// Each call applies to the machine immediately; the handle only remembers
/// which trigger further `allow_transition` calls start from.
///
/// ```rust,ignore
/// machine
///     .register::<Lobby>(Flow::Lobby)
///     .allow_transition(Flow::Match)
///     .allow_transition(Flow::Settings);
/// ```
pub struct StateConfiguration<'a, T: Trigger> {
    machine: &'a StateMachine<T>,
    trigger: T,
}

impl<'a, T: Trigger> StateConfiguration<'a, T> {
    pub(crate) fn new(machine: &'a StateMachine<T>, trigger: T) -> Self {
        Self { machine, trigger }
    }

    /// Allow a transition from this handle's trigger to `to`.
    pub fn allow_transition(self, to: T) -> Self {
        self.machine.allow_transition(self.trigger.clone(), to);
        self
    }

    /// Allow transitions from this handle's trigger to each of `to`.
    pub fn allow_transitions<I>(self, to: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.machine.allow_transitions(self.trigger.clone(), to);
        self
    }

    /// The trigger this handle configures.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{PureState, State};
    use crate::error::CallbackResult;
    use crate::machine::StateMachine;
    use crate::resources::{FactoryRegistry, ScopeArena};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    crate::trigger_enum! {
        enum Flow {
            Title,
            Lobby,
            Match,
            Settings,
        }
    }

    struct Screen;

    impl State<Flow> for Screen {}

    #[async_trait]
    impl PureState<Flow> for Screen {
        async fn on_enter(&mut self, _trigger: &Flow, _cancel: &CancellationToken) -> CallbackResult {
            Ok(())
        }
    }

    fn machine() -> StateMachine<Flow> {
        StateMachine::new(
            Arc::new(FactoryRegistry::<Flow>::new().provide(|_| Screen)),
            Arc::new(ScopeArena::new()),
        )
    }

    #[test]
    fn chained_transitions_apply_to_bound_trigger() {
        let machine = machine();
        let handle = machine
            .register::<Screen>(Flow::Lobby)
            .allow_transition(Flow::Match)
            .allow_transition(Flow::Settings);

        assert_eq!(handle.trigger(), &Flow::Lobby);
        assert!(machine.can_transition(&Flow::Lobby, &Flow::Match));
        assert!(machine.can_transition(&Flow::Lobby, &Flow::Settings));
        assert!(!machine.can_transition(&Flow::Match, &Flow::Lobby));
    }

    #[test]
    fn allow_transition_returns_handle_for_source() {
        let machine = machine();
        let handle = machine
            .allow_transition(Flow::Title, Flow::Lobby)
            .allow_transition(Flow::Settings);

        assert_eq!(handle.trigger(), &Flow::Title);
        assert!(machine.can_transition(&Flow::Title, &Flow::Settings));
    }

    #[test]
    fn bulk_transitions_skip_source() {
        let machine = machine();
        machine.allow_transitions(Flow::Title, Flow::ALL.iter().copied());

        let mut targets = machine.allowed_transitions(&Flow::Title);
        targets.sort_by_key(|t| *t as u8);
        assert_eq!(targets, vec![Flow::Lobby, Flow::Match, Flow::Settings]);
    }

    #[test]
    fn self_transition_still_returns_handle() {
        let machine = machine();
        let handle = machine.allow_transition(Flow::Match, Flow::Match);

        assert_eq!(handle.trigger(), &Flow::Match);
        assert!(machine.allowed_transitions(&Flow::Match).is_empty());
    }
}
