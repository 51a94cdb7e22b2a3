//! Lifecycle traits implemented by state objects, and the type identity
//! the transition table stores for each of them.
//!
//! Every state can be exited ([`State`]). How it is entered depends on its
//! capability: a [`PureState`] enters from the trigger alone, a
//! [`PayloadState`] also receives a typed payload. The capability is recorded
//! in [`StateType`] when the state is registered.

use super::trigger::Trigger;
use crate::error::CallbackResult;
use async_trait::async_trait;
use std::any::{type_name, TypeId};
use std::hash::{Hash, Hasher};
use tokio_util::sync::CancellationToken;

/// Exit side of a state's lifecycle.
///
/// A fresh instance is created for every entry and dropped once its exit
/// sequence completes and its resource scope is released.
#[async_trait]
pub trait State<T: Trigger>: Send + 'static {
    /// Called when a transition away from this state has been committed,
    /// before any exit work happens. `to` is the trigger being entered.
    async fn on_before_exit(&mut self, _to: &T, _cancel: &CancellationToken) -> CallbackResult {
        Ok(())
    }

    /// Called after the before-exit hooks, while this state is still current.
    async fn on_exit(&mut self, _to: &T, _cancel: &CancellationToken) -> CallbackResult {
        Ok(())
    }
}

/// State entered from its trigger alone.
///
/// # Example
///
/// ```rust
/// use switchyard::core::{PureState, State, Trigger};
/// use switchyard::error::CallbackResult;
/// use switchyard::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Menu { Main }
///
/// impl Trigger for Menu {
///     fn name(&self) -> &str { "Main" }
/// }
///
/// struct MainMenu { opened: bool }
///
/// impl State<Menu> for MainMenu {}
///
/// #[async_trait]
/// impl PureState<Menu> for MainMenu {
///     async fn on_enter(&mut self, _trigger: &Menu, _cancel: &CancellationToken) -> CallbackResult {
///         self.opened = true;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PureState<T: Trigger>: State<T> {
    /// Called on the incoming instance before the outgoing state exits.
    async fn on_before_enter(&mut self, _trigger: &T, _cancel: &CancellationToken) -> CallbackResult {
        Ok(())
    }

    /// Called once the instance is current.
    async fn on_enter(&mut self, trigger: &T, cancel: &CancellationToken) -> CallbackResult;
}

/// State entered with a payload of type `P`.
#[async_trait]
pub trait PayloadState<T: Trigger, P: Send + Sync + 'static>: State<T> {
    /// Called on the incoming instance before the outgoing state exits.
    async fn on_before_enter(
        &mut self,
        _trigger: &T,
        _payload: &P,
        _cancel: &CancellationToken,
    ) -> CallbackResult {
        Ok(())
    }

    /// Called once the instance is current.
    async fn on_enter(&mut self, trigger: &T, payload: &P, cancel: &CancellationToken)
        -> CallbackResult;
}

/// Identity of a payload type.
#[derive(Clone, Copy, Debug, Eq)]
pub struct PayloadType {
    id: TypeId,
    name: &'static str,
}

impl PayloadType {
    pub fn of<P: 'static>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: type_name::<P>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for PayloadType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for PayloadType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// How a state expects to be entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    Pure,
    Payload(PayloadType),
}

impl StateKind {
    /// Human-readable form used in capability mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Pure => "pure-entry".to_string(),
            Self::Payload(payload) => format!("payload-entry ({})", payload.name()),
        }
    }
}

/// Type identity of a state, bound to triggers in the transition table.
///
/// Two `StateType`s are equal when they refer to the same Rust type.
#[derive(Clone, Copy, Debug, Eq)]
pub struct StateType {
    id: TypeId,
    name: &'static str,
    kind: StateKind,
}

impl StateType {
    /// Identity of a pure-entry state.
    pub fn pure<S, T>() -> Self
    where
        S: PureState<T>,
        T: Trigger,
    {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
            kind: StateKind::Pure,
        }
    }

    /// Identity of a state entered with a `P` payload.
    pub fn with_payload<S, T, P>() -> Self
    where
        S: PayloadState<T, P>,
        T: Trigger,
        P: Send + Sync + 'static,
    {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
            kind: StateKind::Payload(PayloadType::of::<P>()),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(index) => &self.name[index + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for StateType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for StateType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
