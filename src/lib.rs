//! Switchyard: an async trigger-driven state machine runtime
//!
//! A host declares triggers, binds each one to a state type, and allow-lists
//! the transitions between triggers. Firing a trigger runs a guarded,
//! strictly ordered lifecycle sequence around the switch from the current
//! state to a freshly built one.
//!
//! # Core Concepts
//!
//! - **Trigger**: finite, comparable identifier selecting a target state and
//!   a transition edge
//! - **State**: a unit of behavior active between its enter and the next
//!   exit, entered either from the trigger alone or with a typed payload
//! - **Transition**: a directed, explicitly allowed edge between triggers
//! - **Hook**: an observer notified before and after every enter and exit
//! - **Resource scope**: per-state lifetime container, created on entry and
//!   released after exit
//! - **Guard**: serializes `fire` calls; at most one transition is in flight
//!
//! Collaborators that build states and own their resources are traits in
//! [`resources`], so hosts can bring their own container.
//!
//! # Example
//!
//! ```rust
//! use switchyard::{async_trait, trigger_enum, CancellationToken, MachineError, StateMachine};
//! use switchyard::core::{PayloadState, PureState, State};
//! use switchyard::error::CallbackResult;
//! use switchyard::resources::{FactoryRegistry, ScopeArena};
//!
//! trigger_enum! {
//!     enum Flow { Idle, Loading, Ready }
//! }
//!
//! struct Idle;
//! impl State<Flow> for Idle {}
//! #[async_trait]
//! impl PureState<Flow> for Idle {
//!     async fn on_enter(&mut self, _: &Flow, _: &CancellationToken) -> CallbackResult { Ok(()) }
//! }
//!
//! struct Loading { level: u32 }
//! impl State<Flow> for Loading {}
//! #[async_trait]
//! impl PayloadState<Flow, u32> for Loading {
//!     async fn on_enter(&mut self, _: &Flow, level: &u32, _: &CancellationToken) -> CallbackResult {
//!         self.level = *level;
//!         Ok(())
//!     }
//! }
//!
//! struct Ready;
//! impl State<Flow> for Ready {}
//! #[async_trait]
//! impl PureState<Flow> for Ready {
//!     async fn on_enter(&mut self, _: &Flow, _: &CancellationToken) -> CallbackResult { Ok(()) }
//! }
//!
//! let factory = FactoryRegistry::<Flow>::new()
//!     .provide(|_| Idle)
//!     .provide_with_payload::<Loading, u32, _>(|_| Loading { level: 0 })
//!     .provide(|_| Ready);
//! let machine = StateMachine::builder()
//!     .factory(factory)
//!     .scopes(ScopeArena::new())
//!     .name("session")
//!     .build()
//!     .unwrap();
//!
//! machine.register::<Idle>(Flow::Idle).allow_transition(Flow::Loading);
//! machine.register_with_payload::<Loading, u32>(Flow::Loading).allow_transition(Flow::Ready);
//! machine.register::<Ready>(Flow::Ready);
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let cancel = CancellationToken::new();
//!     machine.fire(Flow::Idle, &cancel).await.unwrap();
//!
//!     let skipped = machine.fire(Flow::Ready, &cancel).await;
//!     assert!(matches!(skipped, Err(MachineError::TransitionNotAllowed { .. })));
//!
//!     machine.fire_with(Flow::Loading, 3u32, &cancel).await.unwrap();
//!     machine.fire(Flow::Ready, &cancel).await.unwrap();
//! });
//! assert_eq!(machine.current_trigger(), Some(Flow::Ready));
//! ```

pub mod builder;
pub mod core;
pub mod error;
pub mod lint;
pub mod machine;
pub mod resources;

// Re-export commonly used types
pub use async_trait::async_trait;
pub use builder::{BuildError, StateConfiguration, StateMachineBuilder};
pub use core::{
    HookEnterPayload, HookExitPayload, PayloadState, PureState, State, StateMachineHook,
    StateType, Trigger,
};
pub use error::{MachineError, Phase};
pub use machine::{StateChange, StateChangedCallback, StateMachine};
pub use tokio_util::sync::CancellationToken;
