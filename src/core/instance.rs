//! Type-erased live state instances.

use super::state::{PayloadState, PayloadType, PureState, State, StateKind, StateType};
use super::trigger::Trigger;
use crate::error::{BoxError, CallbackResult, MachineError, Phase};
use async_trait::async_trait;
use std::any::Any;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// Borrowed payload handed to a payload-entry state.
pub(crate) type ErasedPayload<'a> = &'a (dyn Any + Send + Sync);

#[async_trait]
trait ErasedPayloadState<T: Trigger>: State<T> {
    async fn before_enter(
        &mut self,
        trigger: &T,
        payload: ErasedPayload<'_>,
        cancel: &CancellationToken,
    ) -> CallbackResult;

    async fn enter(
        &mut self,
        trigger: &T,
        payload: ErasedPayload<'_>,
        cancel: &CancellationToken,
    ) -> CallbackResult;
}

struct PayloadAdapter<S, P> {
    state: S,
    _payload: PhantomData<fn() -> P>,
}

fn downcast<P: 'static>(payload: ErasedPayload<'_>) -> Result<&P, BoxError> {
    payload
        .downcast_ref::<P>()
        .ok_or_else(|| format!("payload is not a {}", PayloadType::of::<P>().name()).into())
}

#[async_trait]
impl<T, S, P> State<T> for PayloadAdapter<S, P>
where
    T: Trigger,
    S: PayloadState<T, P>,
    P: Send + Sync + 'static,
{
    async fn on_before_exit(&mut self, to: &T, cancel: &CancellationToken) -> CallbackResult {
        self.state.on_before_exit(to, cancel).await
    }

    async fn on_exit(&mut self, to: &T, cancel: &CancellationToken) -> CallbackResult {
        self.state.on_exit(to, cancel).await
    }
}

#[async_trait]
impl<T, S, P> ErasedPayloadState<T> for PayloadAdapter<S, P>
where
    T: Trigger,
    S: PayloadState<T, P>,
    P: Send + Sync + 'static,
{
    async fn before_enter(
        &mut self,
        trigger: &T,
        payload: ErasedPayload<'_>,
        cancel: &CancellationToken,
    ) -> CallbackResult {
        let payload = downcast::<P>(payload)?;
        PayloadState::<T, P>::on_before_enter(&mut self.state, trigger, payload, cancel).await
    }

    async fn enter(
        &mut self,
        trigger: &T,
        payload: ErasedPayload<'_>,
        cancel: &CancellationToken,
    ) -> CallbackResult {
        let payload = downcast::<P>(payload)?;
        PayloadState::<T, P>::on_enter(&mut self.state, trigger, payload, cancel).await
    }
}

fn mismatch<T: Trigger>(state_type: StateType, trigger: &T, has_payload: bool) -> MachineError {
    let found = if has_payload { "a payload" } else { "no payload" };
    MachineError::CapabilityMismatch {
        trigger: trigger.name().to_string(),
        expected: state_type.kind().describe(),
        found: found.to_string(),
    }
}

enum Body<T: Trigger> {
    Pure(Box<dyn PureState<T>>),
    Payload(Box<dyn ErasedPayloadState<T>>),
}

/// A live state object together with the [`StateType`] it was built as.
///
/// Factories produce instances through [`StateInstance::pure`] or
/// [`StateInstance::with_payload`], which fixes the capability at
/// construction time.
pub struct StateInstance<T: Trigger> {
    state_type: StateType,
    body: Body<T>,
}

impl<T: Trigger> StateInstance<T> {
    pub fn pure<S: PureState<T>>(state: S) -> Self {
        Self {
            state_type: StateType::pure::<S, T>(),
            body: Body::Pure(Box::new(state)),
        }
    }

    pub fn with_payload<S, P>(state: S) -> Self
    where
        S: PayloadState<T, P>,
        P: Send + Sync + 'static,
    {
        Self {
            state_type: StateType::with_payload::<S, T, P>(),
            body: Body::Payload(Box::new(PayloadAdapter {
                state,
                _payload: PhantomData::<fn() -> P>,
            })),
        }
    }

    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    pub(crate) async fn before_enter(
        &mut self,
        trigger: &T,
        payload: Option<ErasedPayload<'_>>,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let state_type = self.state_type;
        let outcome = match (&mut self.body, payload) {
            (Body::Pure(state), None) => state.on_before_enter(trigger, cancel).await,
            (Body::Payload(state), Some(payload)) => {
                state.before_enter(trigger, payload, cancel).await
            }
            (_, payload) => return Err(mismatch(state_type, trigger, payload.is_some())),
        };
        outcome.map_err(MachineError::callback(Phase::BeforeEnter))
    }

    pub(crate) async fn enter(
        &mut self,
        trigger: &T,
        payload: Option<ErasedPayload<'_>>,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let state_type = self.state_type;
        let outcome = match (&mut self.body, payload) {
            (Body::Pure(state), None) => state.on_enter(trigger, cancel).await,
            (Body::Payload(state), Some(payload)) => state.enter(trigger, payload, cancel).await,
            (_, payload) => return Err(mismatch(state_type, trigger, payload.is_some())),
        };
        outcome.map_err(MachineError::callback(Phase::Enter))
    }

    pub(crate) async fn before_exit(
        &mut self,
        to: &T,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let outcome = match &mut self.body {
            Body::Pure(state) => state.on_before_exit(to, cancel).await,
            Body::Payload(state) => state.on_before_exit(to, cancel).await,
        };
        outcome.map_err(MachineError::callback(Phase::BeforeExit))
    }

    pub(crate) async fn exit(
        &mut self,
        to: &T,
        cancel: &CancellationToken,
    ) -> Result<(), MachineError> {
        let outcome = match &mut self.body {
            Body::Pure(state) => state.on_exit(to, cancel).await,
            Body::Payload(state) => state.on_exit(to, cancel).await,
        };
        outcome.map_err(MachineError::callback(Phase::Exit))
    }

    pub fn kind(&self) -> StateKind {
        self.state_type.kind()
    }
}

impl<T: Trigger> std::fmt::Debug for StateInstance<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateInstance")
            .field("state_type", &self.state_type.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Flow {
        Level,
    }

    impl Trigger for Flow {
        fn name(&self) -> &str {
            "Level"
        }
    }

    struct LevelState {
        entered_with: Arc<AtomicU32>,
    }

    impl State<Flow> for LevelState {}

    #[async_trait]
    impl PayloadState<Flow, u32> for LevelState {
        async fn on_enter(
            &mut self,
            _trigger: &Flow,
            payload: &u32,
            _cancel: &CancellationToken,
        ) -> CallbackResult {
            self.entered_with.store(*payload, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn payload_reaches_typed_state() {
        let seen = Arc::new(AtomicU32::new(0));
        let mut instance = StateInstance::<Flow>::with_payload::<_, u32>(LevelState {
            entered_with: seen.clone(),
        });
        let cancel = CancellationToken::new();

        instance
            .enter(&Flow::Level, Some(&7u32 as ErasedPayload<'_>), &cancel)
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn missing_payload_is_a_capability_mismatch() {
        let mut instance = StateInstance::<Flow>::with_payload::<_, u32>(LevelState {
            entered_with: Arc::new(AtomicU32::new(0)),
        });
        let cancel = CancellationToken::new();

        let err = instance.enter(&Flow::Level, None, &cancel).await.unwrap_err();
        assert!(matches!(err, MachineError::CapabilityMismatch { .. }));
    }

    #[tokio::test]
    async fn wrongly_typed_payload_fails_enter() {
        let mut instance = StateInstance::<Flow>::with_payload::<_, u32>(LevelState {
            entered_with: Arc::new(AtomicU32::new(0)),
        });
        let cancel = CancellationToken::new();

        let err = instance
            .enter(&Flow::Level, Some(&"seven" as ErasedPayload<'_>), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MachineError::Callback {
                phase: Phase::Enter,
                ..
            }
        ));
    }
}
