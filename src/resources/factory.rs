//! Producing state instances from their declared type.

use super::scope::ScopeHandle;
use crate::core::{PayloadState, PureState, StateInstance, StateType, Trigger};
use crate::error::{BoxError, InstantiationError};
use async_trait::async_trait;
use std::any::TypeId;
use std::collections::HashMap;

/// Builds a fresh state instance for a registered [`StateType`].
///
/// `scope` is the resource scope created for the instance; anything the
/// state owns for its active lifetime should be tied to it.
#[async_trait]
pub trait StateFactory<T: Trigger>: Send + Sync {
    async fn instantiate(
        &self,
        state_type: &StateType,
        scope: &ScopeHandle,
    ) -> Result<StateInstance<T>, InstantiationError>;
}

type Constructor<T> =
    Box<dyn Fn(&ScopeHandle) -> Result<StateInstance<T>, BoxError> + Send + Sync>;

/// [`StateFactory`] backed by constructor closures keyed by state type.
///
/// # Example
///
/// ```rust
/// use switchyard::core::{PureState, State, StateType, Trigger};
/// use switchyard::error::CallbackResult;
/// use switchyard::resources::FactoryRegistry;
/// use switchyard::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Flow { Idle }
///
/// impl Trigger for Flow {
///     fn name(&self) -> &str { "Idle" }
/// }
///
/// struct Idle;
///
/// impl State<Flow> for Idle {}
///
/// #[async_trait]
/// impl PureState<Flow> for Idle {
///     async fn on_enter(&mut self, _: &Flow, _: &CancellationToken) -> CallbackResult {
///         Ok(())
///     }
/// }
///
/// let factory = FactoryRegistry::<Flow>::new().provide(|_scope| Idle);
/// assert!(factory.provides(&StateType::pure::<Idle, Flow>()));
/// ```
pub struct FactoryRegistry<T: Trigger> {
    constructors: HashMap<TypeId, Constructor<T>>,
}

impl<T: Trigger> Default for FactoryRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trigger> FactoryRegistry<T> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register an infallible constructor for a pure-entry state.
    pub fn provide<S, F>(mut self, constructor: F) -> Self
    where
        S: PureState<T>,
        F: Fn(&ScopeHandle) -> S + Send + Sync + 'static,
    {
        let build: Constructor<T> =
            Box::new(move |scope: &ScopeHandle| Ok(StateInstance::pure(constructor(scope))));
        self.constructors
            .insert(StateType::pure::<S, T>().type_id(), build);
        self
    }

    /// Register a fallible constructor for a pure-entry state.
    pub fn try_provide<S, F>(mut self, constructor: F) -> Self
    where
        S: PureState<T>,
        F: Fn(&ScopeHandle) -> Result<S, BoxError> + Send + Sync + 'static,
    {
        let build: Constructor<T> =
            Box::new(move |scope: &ScopeHandle| constructor(scope).map(StateInstance::pure));
        self.constructors
            .insert(StateType::pure::<S, T>().type_id(), build);
        self
    }

    /// Register a constructor for a state entered with a `P` payload.
    pub fn provide_with_payload<S, P, F>(mut self, constructor: F) -> Self
    where
        S: PayloadState<T, P>,
        P: Send + Sync + 'static,
        F: Fn(&ScopeHandle) -> S + Send + Sync + 'static,
    {
        let build: Constructor<T> = Box::new(move |scope: &ScopeHandle| {
            Ok(StateInstance::with_payload::<S, P>(constructor(scope)))
        });
        self.constructors
            .insert(StateType::with_payload::<S, T, P>().type_id(), build);
        self
    }

    pub fn provides(&self, state_type: &StateType) -> bool {
        self.constructors.contains_key(&state_type.type_id())
    }
}

#[async_trait]
impl<T: Trigger> StateFactory<T> for FactoryRegistry<T> {
    async fn instantiate(
        &self,
        state_type: &StateType,
        scope: &ScopeHandle,
    ) -> Result<StateInstance<T>, InstantiationError> {
        let constructor = self
            .constructors
            .get(&state_type.type_id())
            .ok_or(InstantiationError::NotRegistered {
                state: state_type.name(),
            })?;
        constructor(scope).map_err(|source| InstantiationError::Construction {
            state: state_type.name(),
            source,
        })
    }
}
