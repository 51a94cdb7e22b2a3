//! The transition engine.
//!
//! Every `fire` call takes the transition guard, validates the request
//! against the transition table, then drives the lifecycle sequence:
//!
//! 1. build the incoming state inside a fresh resource scope
//! 2. outgoing `on_before_exit`, incoming `on_before_enter`
//! 3. hooks before-exit, outgoing `on_exit`, hooks after-exit, release the
//!    outgoing scope
//! 4. commit the incoming state as current
//! 5. hooks before-enter, incoming `on_enter`, hooks after-enter
//! 6. publish the state change to subscribers
//!
//! The guard is held for the whole sequence and released when the call
//! returns, whatever the outcome.

use super::subscribers::{StateChange, StateChangedCallback, Subscribers};
use crate::builder::{StateConfiguration, StateMachineBuilder};
use crate::core::{
    ErasedPayload, HookEnterPayload, HookExitPayload, HookRegistry, PayloadState, PayloadType,
    PureState, ReverseLookup, SharedHook, StateInstance, StateKind, StateType, TransitionHistory,
    TransitionRecord, TransitionTable, Trigger,
};
use crate::error::{InstantiationError, MachineError, Phase};
use crate::lint::{self, GraphIssue};
use crate::resources::{ScopeHandle, ScopeManager, StateFactory};
use chrono::Utc;
use parking_lot::RwLock;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The state currently owned by the engine.
struct Active<T: Trigger> {
    trigger: T,
    instance: StateInstance<T>,
    scope: ScopeHandle,
}

/// Data protected by the transition guard.
struct Slot<T: Trigger> {
    active: Option<Active<T>>,
}

/// Lock-free-to-read view of the machine for introspection. Only written
/// while the transition guard is held.
struct Observed<T: Trigger> {
    current: Option<(T, StateType)>,
    disposed: bool,
}

/// Shape of a `fire` call.
enum Entry {
    Pure,
    Payload {
        value: Box<dyn Any + Send + Sync>,
        payload_type: PayloadType,
    },
}

impl Entry {
    fn payload(&self) -> Option<ErasedPayload<'_>> {
        match self {
            Self::Pure => None,
            Self::Payload { value, .. } => Some(value.as_ref()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Pure => "no payload".to_string(),
            Self::Payload { payload_type, .. } => format!("a {} payload", payload_type.name()),
        }
    }

    fn check<T: Trigger>(&self, trigger: &T, target: &StateType) -> Result<(), MachineError> {
        let fits = match (self, target.kind()) {
            (Self::Pure, StateKind::Pure) => true,
            (Self::Payload { payload_type, .. }, StateKind::Payload(expected)) => {
                *payload_type == expected
            }
            _ => false,
        };
        if fits {
            Ok(())
        } else {
            Err(MachineError::CapabilityMismatch {
                trigger: trigger.name().to_string(),
                expected: target.kind().describe(),
                found: self.describe(),
            })
        }
    }
}

#[derive(Clone, Copy)]
enum HookCall<'a> {
    BeforeExit(&'a HookExitPayload),
    AfterExit(&'a HookExitPayload),
    BeforeEnter(&'a HookEnterPayload),
    AfterEnter(&'a HookEnterPayload),
}

impl HookCall<'_> {
    fn phase(&self) -> Phase {
        match self {
            Self::BeforeExit(_) => Phase::HookBeforeExit,
            Self::AfterExit(_) => Phase::HookAfterExit,
            Self::BeforeEnter(_) => Phase::HookBeforeEnter,
            Self::AfterEnter(_) => Phase::HookAfterEnter,
        }
    }
}

/// Await `operation` unless `cancel` fires first.
async fn guarded<F, O, E>(cancel: &CancellationToken, operation: F) -> Result<O, MachineError>
where
    F: Future<Output = Result<O, E>>,
    E: Into<MachineError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MachineError::Cancelled),
        outcome = operation => outcome.map_err(Into::into),
    }
}

/// Asynchronous trigger-driven state machine.
///
/// Configuration (`register`, `allow_transition`, hooks, subscribers) and
/// execution (`fire`, `fire_with`) all take `&self`, so a machine is usually
/// shared behind an `Arc`. Concurrent `fire` calls are served one at a time
/// in arrival order.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use switchyard::{async_trait, trigger_enum, CancellationToken, StateMachine};
/// use switchyard::core::{PureState, State};
/// use switchyard::error::CallbackResult;
/// use switchyard::resources::{FactoryRegistry, ScopeArena};
///
/// trigger_enum! {
///     enum Flow { Idle, Loading }
/// }
///
/// struct Idle;
/// impl State<Flow> for Idle {}
/// #[async_trait]
/// impl PureState<Flow> for Idle {
///     async fn on_enter(&mut self, _: &Flow, _: &CancellationToken) -> CallbackResult { Ok(()) }
/// }
///
/// struct Loading;
/// impl State<Flow> for Loading {}
/// #[async_trait]
/// impl PureState<Flow> for Loading {
///     async fn on_enter(&mut self, _: &Flow, _: &CancellationToken) -> CallbackResult { Ok(()) }
/// }
///
/// let factory = FactoryRegistry::<Flow>::new().provide(|_| Idle).provide(|_| Loading);
/// let machine = StateMachine::new(Arc::new(factory), Arc::new(ScopeArena::new()));
/// machine.register::<Idle>(Flow::Idle).allow_transition(Flow::Loading);
/// machine.register::<Loading>(Flow::Loading);
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let cancel = CancellationToken::new();
///     machine.fire(Flow::Idle, &cancel).await.unwrap();
///     machine.fire(Flow::Loading, &cancel).await.unwrap();
/// });
/// assert_eq!(machine.current_trigger(), Some(Flow::Loading));
/// ```
pub struct StateMachine<T: Trigger> {
    name: String,
    table: RwLock<TransitionTable<T>>,
    hooks: HookRegistry,
    subscribers: Subscribers<T>,
    factory: Arc<dyn StateFactory<T>>,
    scopes: Arc<dyn ScopeManager>,
    guard: Mutex<Slot<T>>,
    observed: RwLock<Observed<T>>,
    history: RwLock<TransitionHistory<T>>,
}

impl<T: Trigger> StateMachine<T> {
    /// Machine with default name and history limit.
    pub fn new(factory: Arc<dyn StateFactory<T>>, scopes: Arc<dyn ScopeManager>) -> Self {
        Self::from_parts(
            crate::builder::DEFAULT_MACHINE_NAME.to_string(),
            factory,
            scopes,
            TransitionHistory::default(),
        )
    }

    pub fn builder() -> StateMachineBuilder<T> {
        StateMachineBuilder::new()
    }

    pub(crate) fn from_parts(
        name: String,
        factory: Arc<dyn StateFactory<T>>,
        scopes: Arc<dyn ScopeManager>,
        history: TransitionHistory<T>,
    ) -> Self {
        Self {
            name,
            table: RwLock::new(TransitionTable::new()),
            hooks: HookRegistry::new(),
            subscribers: Subscribers::new(),
            factory,
            scopes,
            guard: Mutex::new(Slot { active: None }),
            observed: RwLock::new(Observed {
                current: None,
                disposed: false,
            }),
            history: RwLock::new(history),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `trigger` to the pure-entry state `S`. Re-registering a trigger
    /// replaces its previous binding.
    pub fn register<S: PureState<T>>(&self, trigger: T) -> StateConfiguration<'_, T> {
        self.bind(trigger, StateType::pure::<S, T>())
    }

    /// Bind `trigger` to the state `S`, entered with a `P` payload.
    pub fn register_with_payload<S, P>(&self, trigger: T) -> StateConfiguration<'_, T>
    where
        S: PayloadState<T, P>,
        P: Send + Sync + 'static,
    {
        self.bind(trigger, StateType::with_payload::<S, T, P>())
    }

    fn bind(&self, trigger: T, state_type: StateType) -> StateConfiguration<'_, T> {
        debug!(
            machine = %self.name,
            trigger = trigger.name(),
            state = state_type.short_name(),
            "registered state"
        );
        self.table.write().register(trigger.clone(), state_type);
        StateConfiguration::new(self, trigger)
    }

    /// Allow `from -> to`. Self-transitions are ignored; repeats are no-ops.
    pub fn allow_transition(&self, from: T, to: T) -> StateConfiguration<'_, T> {
        if self.table.write().allow(&from, &to) {
            debug!(machine = %self.name, from = from.name(), to = to.name(), "allowed transition");
        } else if from == to {
            debug!(machine = %self.name, trigger = from.name(), "ignored self-transition");
        }
        StateConfiguration::new(self, from)
    }

    /// Allow `from -> t` for every `t` in `to`, skipping `from` itself.
    pub fn allow_transitions<I>(&self, from: T, to: I) -> StateConfiguration<'_, T>
    where
        I: IntoIterator<Item = T>,
    {
        for target in to {
            self.allow_transition(from.clone(), target);
        }
        StateConfiguration::new(self, from)
    }

    /// Attach `hook`. Fails with [`MachineError::DuplicateHook`] if this
    /// exact `Arc` is already attached.
    pub fn add_hook(&self, hook: SharedHook) -> Result<(), MachineError> {
        self.hooks.add(hook)?;
        debug!(machine = %self.name, hooks = self.hooks.len(), "hook attached");
        Ok(())
    }

    /// Detach `hook` if attached.
    pub fn remove_hook(&self, hook: &SharedHook) {
        if self.hooks.remove(hook) {
            debug!(machine = %self.name, hooks = self.hooks.len(), "hook detached");
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Subscribe to state changes. Subscribing the same `Arc` again keeps a
    /// single subscription.
    pub fn subscribe_on_state_changed(&self, callback: StateChangedCallback<T>) {
        self.subscribers.subscribe(callback);
    }

    pub fn unsubscribe_on_state_changed(&self, callback: &StateChangedCallback<T>) {
        self.subscribers.unsubscribe(callback);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn current_trigger(&self) -> Option<T> {
        self.observed
            .read()
            .current
            .as_ref()
            .map(|(trigger, _)| trigger.clone())
    }

    /// Type identity of the current state.
    pub fn current_state(&self) -> Option<StateType> {
        self.observed.read().current.as_ref().map(|(_, state)| *state)
    }

    pub fn registered_triggers(&self) -> Vec<T> {
        self.table
            .read()
            .triggers()
            .map(|(trigger, _)| trigger.clone())
            .collect()
    }

    pub fn state_type(&self, trigger: &T) -> Option<StateType> {
        self.table.read().state_type(trigger)
    }

    pub fn allowed_transitions(&self, from: &T) -> Vec<T> {
        self.table.read().targets(from)
    }

    pub fn can_transition(&self, from: &T, to: &T) -> bool {
        self.table.read().is_allowed(from, to)
    }

    /// Snapshot of the retained transition history.
    pub fn history(&self) -> TransitionHistory<T> {
        self.history.read().clone()
    }

    /// Check the configured graph, reporting every issue found.
    pub fn lint(&self) -> Validation<(), NonEmptyVec<GraphIssue>> {
        lint::check_table(&self.table.read())
    }

    /// Transition to the pure-entry state bound to `trigger`.
    pub async fn fire(&self, trigger: T, cancel: &CancellationToken) -> Result<(), MachineError> {
        self.fire_entry(trigger, Entry::Pure, cancel).await
    }

    /// Transition to the payload-entry state bound to `trigger`, handing it
    /// `payload`.
    pub async fn fire_with<P>(
        &self,
        trigger: T,
        payload: P,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError>
    where
        P: Send + Sync + 'static,
    {
        let entry = Entry::Payload {
            value: Box::new(payload),
            payload_type: PayloadType::of::<P>(),
        };
        self.fire_entry(trigger, entry, cancel).await
    }

    /// Release the current scope without running exit callbacks. Later
    /// `fire` calls fail with [`MachineError::Disposed`].
    pub async fn dispose(&self) -> Result<(), MachineError> {
        let mut slot = self.guard.lock().await;
        let retired = slot.active.take();
        {
            let mut observed = self.observed.write();
            observed.disposed = true;
            observed.current = None;
        }
        if let Some(active) = retired {
            info!(machine = %self.name, trigger = active.trigger.name(), "disposing current state");
            self.scopes.release_scope(active.scope).await?;
        }
        Ok(())
    }

    /// Whether [`dispose`](Self::dispose) has completed. Does not wait for
    /// a transition in flight.
    pub fn is_disposed(&self) -> bool {
        self.observed.read().disposed
    }

    async fn fire_entry(
        &self,
        trigger: T,
        entry: Entry,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let mut slot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MachineError::Cancelled),
            slot = self.guard.lock() => slot,
        };
        if self.is_disposed() {
            return Err(MachineError::Disposed);
        }

        let target = match self.validate(&slot, &trigger, &entry) {
            Ok(target) => target,
            Err(err) => {
                warn!(machine = %self.name, trigger = trigger.name(), error = %err, "transition rejected");
                return Err(err);
            }
        };

        let outcome = self
            .transition(&mut slot, trigger.clone(), target, &entry, cancel)
            .await;
        if let Err(err) = &outcome {
            warn!(machine = %self.name, trigger = trigger.name(), error = %err, "transition failed");
        }
        outcome
    }

    fn validate(
        &self,
        slot: &Slot<T>,
        trigger: &T,
        entry: &Entry,
    ) -> Result<StateType, MachineError> {
        let table = self.table.read();
        let target = table
            .state_type(trigger)
            .ok_or_else(|| MachineError::UnknownTrigger {
                machine: self.name.clone(),
                trigger: trigger.name().to_string(),
            })?;

        if let Some(active) = &slot.active {
            let state = active.instance.state_type();
            let from = match table.trigger_for(&state) {
                ReverseLookup::Found(from) => from,
                ReverseLookup::Untracked { matches } => {
                    return Err(MachineError::UntrackedCurrentState {
                        machine: self.name.clone(),
                        state: state.name(),
                        matches,
                    })
                }
            };
            if !table.is_allowed(&from, trigger) {
                return Err(MachineError::TransitionNotAllowed {
                    machine: self.name.clone(),
                    from: from.name().to_string(),
                    to: trigger.name().to_string(),
                });
            }
        }

        entry.check(trigger, &target)?;
        Ok(target)
    }

    async fn transition(
        &self,
        slot: &mut Slot<T>,
        trigger: T,
        target: StateType,
        entry: &Entry,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let from = slot.active.as_ref().map(|active| active.trigger.clone());
        debug!(machine = %self.name, from = ?from, to = trigger.name(), "transition started");

        let scope = guarded(cancel, self.scopes.create_scope()).await?;
        let incoming = match self
            .prepare(slot, &trigger, &target, entry, &scope, cancel)
            .await
        {
            Ok(incoming) => incoming,
            Err(err) => {
                self.discard(scope).await;
                return Err(err);
            }
        };
        let released = match self.retire(slot, &trigger, &target, cancel).await {
            Ok(Some(outgoing)) => self.release(outgoing).await,
            Ok(None) => Ok(()),
            Err(err) => {
                self.discard(scope).await;
                return Err(err);
            }
        };

        // committed even when the outgoing release failed; once a state has
        // been entered the machine is never stateless
        let active = slot.active.insert(Active {
            trigger: trigger.clone(),
            instance: incoming,
            scope,
        });
        self.observed.write().current = Some((trigger.clone(), target));
        self.record(from.clone(), trigger.clone());
        info!(
            machine = %self.name,
            from = ?from,
            to = trigger.name(),
            state = target.short_name(),
            "state committed"
        );
        released?;

        let payload = HookEnterPayload { target };
        self.notify_hooks(HookCall::BeforeEnter(&payload), cancel)
            .await?;
        guarded(cancel, active.instance.enter(&trigger, entry.payload(), cancel)).await?;
        self.notify_hooks(HookCall::AfterEnter(&payload), cancel)
            .await?;

        self.subscribers.publish(&StateChange {
            from,
            to: trigger,
            state: target,
        });
        Ok(())
    }

    /// Build the incoming state and run both pre-callbacks.
    async fn prepare(
        &self,
        slot: &mut Slot<T>,
        trigger: &T,
        target: &StateType,
        entry: &Entry,
        scope: &ScopeHandle,
        cancel: &CancellationToken,
    ) -> Result<StateInstance<T>, MachineError> {
        let mut incoming = guarded(cancel, self.factory.instantiate(target, scope)).await?;
        debug!(machine = %self.name, state = target.short_name(), scope = %scope, "state instantiated");
        let produced = incoming.state_type();
        if produced != *target || produced.kind() != target.kind() {
            return Err(InstantiationError::TypeMismatch {
                expected: target.name(),
                produced: produced.name(),
            }
            .into());
        }

        if let Some(active) = slot.active.as_mut() {
            guarded(cancel, active.instance.before_exit(trigger, cancel)).await?;
        }
        guarded(cancel, incoming.before_enter(trigger, entry.payload(), cancel)).await?;
        Ok(incoming)
    }

    /// Run the exit phase of the current state, if any, and hand back the
    /// exited entry. It stays observable as current until the incoming
    /// state is committed.
    async fn retire(
        &self,
        slot: &mut Slot<T>,
        trigger: &T,
        target: &StateType,
        cancel: &CancellationToken,
    ) -> Result<Option<Active<T>>, MachineError> {
        let Some(active) = slot.active.as_mut() else {
            return Ok(None);
        };
        let payload = HookExitPayload {
            current: active.instance.state_type(),
            target: *target,
        };

        self.notify_hooks(HookCall::BeforeExit(&payload), cancel)
            .await?;
        guarded(cancel, active.instance.exit(trigger, cancel)).await?;
        self.notify_hooks(HookCall::AfterExit(&payload), cancel)
            .await?;

        Ok(slot.active.take())
    }

    /// Drop an exited state and release its scope.
    async fn release(&self, outgoing: Active<T>) -> Result<(), MachineError> {
        let Active { trigger, instance, scope } = outgoing;
        drop(instance);
        debug!(machine = %self.name, trigger = trigger.name(), scope = %scope, "releasing scope");
        if let Err(err) = self.scopes.release_scope(scope).await {
            warn!(machine = %self.name, trigger = trigger.name(), error = %err, "failed to release scope of exited state");
            return Err(err.into());
        }
        Ok(())
    }

    async fn notify_hooks(
        &self,
        call: HookCall<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let hooks = self.hooks.snapshot();
        if !hooks.is_empty() {
            debug!(machine = %self.name, phase = %call.phase(), hooks = hooks.len(), "notifying hooks");
        }
        for hook in hooks {
            guarded(cancel, async {
                let outcome = match call {
                    HookCall::BeforeExit(payload) => hook.on_before_exit(payload, cancel).await,
                    HookCall::AfterExit(payload) => hook.on_after_exit(payload, cancel).await,
                    HookCall::BeforeEnter(payload) => hook.on_before_enter(payload, cancel).await,
                    HookCall::AfterEnter(payload) => hook.on_after_enter(payload, cancel).await,
                };
                outcome.map_err(MachineError::callback(call.phase()))
            })
            .await?;
        }
        Ok(())
    }

    /// Release a scope that never got committed.
    async fn discard(&self, scope: ScopeHandle) {
        let id = scope.id();
        match self.scopes.release_scope(scope).await {
            Ok(()) => debug!(machine = %self.name, scope = %id, "released uncommitted scope"),
            Err(err) => {
                warn!(machine = %self.name, scope = %id, error = %err, "failed to release uncommitted scope")
            }
        }
    }

    fn record(&self, from: Option<T>, to: T) {
        let mut history = self.history.write();
        let next = history.record(TransitionRecord {
            from,
            to,
            timestamp: Utc::now(),
        });
        *history = next;
    }
}

impl<T: Trigger> Drop for StateMachine<T> {
    fn drop(&mut self) {
        if let Some(active) = &self.guard.get_mut().active {
            warn!(
                machine = %self.name,
                trigger = active.trigger.name(),
                scope = %active.scope,
                "state machine dropped without dispose; scope was not released"
            );
        }
    }
}
