//! Trigger to state-type bindings and the allow-listed transition edges.

use super::state::StateType;
use super::trigger::Trigger;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};

/// Outcome of mapping a live state's type back to the trigger that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseLookup<T> {
    /// Exactly one trigger is bound to the type.
    Found(T),
    /// Zero or several triggers are bound to the type.
    Untracked { matches: usize },
}

/// Bidirectional trigger/state-type map plus the transition adjacency sets.
///
/// Bindings follow last-write-wins; edges are append-only and self-loops are
/// never stored.
#[derive(Debug, Clone)]
pub struct TransitionTable<T: Trigger> {
    states: HashMap<T, StateType>,
    triggers_by_type: HashMap<TypeId, HashSet<T>>,
    edges: HashMap<T, HashSet<T>>,
}

impl<T: Trigger> Default for TransitionTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trigger> TransitionTable<T> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            triggers_by_type: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// Bind `trigger` to `state_type`, replacing any earlier binding.
    pub fn register(&mut self, trigger: T, state_type: StateType) {
        if let Some(previous) = self.states.insert(trigger.clone(), state_type) {
            if let Some(owners) = self.triggers_by_type.get_mut(&previous.type_id()) {
                owners.remove(&trigger);
                if owners.is_empty() {
                    self.triggers_by_type.remove(&previous.type_id());
                }
            }
        }
        self.triggers_by_type
            .entry(state_type.type_id())
            .or_default()
            .insert(trigger);
    }

    /// Add the edge `from -> to`. Returns false when nothing was added
    /// (self-loop or already present).
    pub fn allow(&mut self, from: &T, to: &T) -> bool {
        if from == to {
            return false;
        }
        self.edges
            .entry(from.clone())
            .or_default()
            .insert(to.clone())
    }

    pub fn state_type(&self, trigger: &T) -> Option<StateType> {
        self.states.get(trigger).copied()
    }

    /// Map a live state's type back to its trigger.
    pub fn trigger_for(&self, state_type: &StateType) -> ReverseLookup<T> {
        match self.triggers_by_type.get(&state_type.type_id()) {
            Some(owners) if owners.len() == 1 => match owners.iter().next() {
                Some(trigger) => ReverseLookup::Found(trigger.clone()),
                None => ReverseLookup::Untracked { matches: 0 },
            },
            Some(owners) => ReverseLookup::Untracked {
                matches: owners.len(),
            },
            None => ReverseLookup::Untracked { matches: 0 },
        }
    }

    pub fn is_allowed(&self, from: &T, to: &T) -> bool {
        self.edges.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// Triggers reachable from `from`, in unspecified order.
    pub fn targets(&self, from: &T) -> Vec<T> {
        self.edges
            .get(from)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn triggers(&self) -> impl Iterator<Item = (&T, &StateType)> {
        self.states.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    /// State types bound to more than one trigger, with their triggers.
    pub fn shared_types(&self) -> Vec<(StateType, Vec<T>)> {
        self.triggers_by_type
            .values()
            .filter(|owners| owners.len() > 1)
            .filter_map(|owners| {
                let first = owners.iter().next()?;
                let state_type = self.states.get(first).copied()?;
                Some((state_type, owners.iter().cloned().collect()))
            })
            .collect()
    }

    pub fn is_registered(&self, trigger: &T) -> bool {
        self.states.contains_key(trigger)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{PureState, State};
    use crate::error::CallbackResult;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Flow {
        Idle,
        Loading,
        Ready,
    }

    impl Trigger for Flow {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Loading => "Loading",
                Self::Ready => "Ready",
            }
        }
    }

    struct TypeA;
    struct TypeB;

    impl State<Flow> for TypeA {}
    impl State<Flow> for TypeB {}

    #[async_trait]
    impl PureState<Flow> for TypeA {
        async fn on_enter(&mut self, _trigger: &Flow, _cancel: &CancellationToken) -> CallbackResult {
            Ok(())
        }
    }

    #[async_trait]
    impl PureState<Flow> for TypeB {
        async fn on_enter(&mut self, _trigger: &Flow, _cancel: &CancellationToken) -> CallbackResult {
            Ok(())
        }
    }

    fn type_a() -> StateType {
        StateType::pure::<TypeA, Flow>()
    }

    fn type_b() -> StateType {
        StateType::pure::<TypeB, Flow>()
    }

    #[test]
    fn register_last_write_wins() {
        let mut table = TransitionTable::new();
        table.register(Flow::Idle, type_a());
        table.register(Flow::Idle, type_b());

        assert_eq!(table.state_type(&Flow::Idle), Some(type_b()));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.trigger_for(&type_a()),
            ReverseLookup::Untracked { matches: 0 }
        );
        assert_eq!(table.trigger_for(&type_b()), ReverseLookup::Found(Flow::Idle));
    }

    #[test]
    fn self_loops_are_never_stored() {
        let mut table: TransitionTable<Flow> = TransitionTable::new();
        assert!(!table.allow(&Flow::Idle, &Flow::Idle));
        assert!(!table.is_allowed(&Flow::Idle, &Flow::Idle));
        assert_eq!(table.edges().count(), 0);
    }

    #[test]
    fn edges_are_idempotent() {
        let mut table: TransitionTable<Flow> = TransitionTable::new();
        assert!(table.allow(&Flow::Idle, &Flow::Loading));
        assert!(!table.allow(&Flow::Idle, &Flow::Loading));
        assert_eq!(table.targets(&Flow::Idle), vec![Flow::Loading]);
    }

    #[test]
    fn edges_are_directed() {
        let mut table: TransitionTable<Flow> = TransitionTable::new();
        table.allow(&Flow::Loading, &Flow::Ready);

        assert!(table.is_allowed(&Flow::Loading, &Flow::Ready));
        assert!(!table.is_allowed(&Flow::Ready, &Flow::Loading));
    }

    #[test]
    fn shared_type_is_ambiguous_in_reverse() {
        let mut table = TransitionTable::new();
        table.register(Flow::Idle, type_a());
        table.register(Flow::Loading, type_a());

        assert_eq!(
            table.trigger_for(&type_a()),
            ReverseLookup::Untracked { matches: 2 }
        );
        let shared = table.shared_types();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].1.len(), 2);
    }
}
