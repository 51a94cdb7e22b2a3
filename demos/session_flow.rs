//! Session Flow
//!
//! This example walks a game session through Idle -> Loading -> Ready.
//!
//! Key concepts:
//! - Pure-entry and payload-entry states
//! - A hook observing every enter and exit
//! - Per-state resources owned by a `ScopeArena`
//! - Rejected transitions reported as typed errors
//!
//! Run with: cargo run --example session_flow

use std::sync::Arc;
use switchyard::core::{PayloadState, PureState, State};
use switchyard::error::CallbackResult;
use switchyard::resources::{FactoryRegistry, ScopeArena};
use switchyard::{
    async_trait, trigger_enum, CancellationToken, HookEnterPayload, HookExitPayload,
    StateChange, StateMachine, StateMachineHook,
};

trigger_enum! {
    enum Session {
        Idle,
        Loading,
        Ready,
    }
}

struct Idle;

impl State<Session> for Idle {}

#[async_trait]
impl PureState<Session> for Idle {
    async fn on_enter(&mut self, _trigger: &Session, _cancel: &CancellationToken) -> CallbackResult {
        println!("  [Idle] waiting for the player");
        Ok(())
    }
}

struct Loading;

#[async_trait]
impl State<Session> for Loading {
    async fn on_exit(&mut self, _to: &Session, _cancel: &CancellationToken) -> CallbackResult {
        println!("  [Loading] assets ready");
        Ok(())
    }
}

#[async_trait]
impl PayloadState<Session, u32> for Loading {
    async fn on_enter(&mut self, _trigger: &Session, level: &u32, _cancel: &CancellationToken) -> CallbackResult {
        println!("  [Loading] streaming level {level}");
        Ok(())
    }
}

struct Ready;

impl State<Session> for Ready {}

#[async_trait]
impl PureState<Session> for Ready {
    async fn on_enter(&mut self, _trigger: &Session, _cancel: &CancellationToken) -> CallbackResult {
        println!("  [Ready] go!");
        Ok(())
    }
}

/// Prints every exit and enter the machine performs.
struct Tracer;

#[async_trait]
impl StateMachineHook for Tracer {
    async fn on_before_enter(&self, payload: &HookEnterPayload, _: &CancellationToken) -> CallbackResult {
        println!("  hook: entering {}", payload.target.short_name());
        Ok(())
    }

    async fn on_after_exit(&self, payload: &HookExitPayload, _: &CancellationToken) -> CallbackResult {
        println!(
            "  hook: left {} for {}",
            payload.current.short_name(),
            payload.target.short_name()
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    println!("=== Session Flow Example ===\n");

    let arena = Arc::new(ScopeArena::new());
    let factory = {
        let arena = arena.clone();
        FactoryRegistry::<Session>::new()
            .provide(|_| Idle)
            .provide_with_payload::<Loading, u32, _>(move |scope| {
                // resources tied to the scope are dropped when Loading exits
                if let Err(err) = arena.attach(scope, vec![0u8; 1024]) {
                    eprintln!("could not attach buffer: {err}");
                }
                Loading
            })
            .provide(|_| Ready)
    };

    let machine = StateMachine::builder()
        .factory(factory)
        .shared_scopes(arena.clone())
        .name("session")
        .build()
        .unwrap();

    machine
        .register::<Idle>(Session::Idle)
        .allow_transition(Session::Loading);
    machine
        .register_with_payload::<Loading, u32>(Session::Loading)
        .allow_transition(Session::Ready);
    machine
        .register::<Ready>(Session::Ready)
        .allow_transition(Session::Idle);

    machine.add_hook(Arc::new(Tracer)).unwrap();
    machine.subscribe_on_state_changed(Arc::new(|change: &StateChange<Session>| {
        println!("  changed: {:?} -> {:?}", change.from, change.to);
    }));

    let cancel = CancellationToken::new();

    println!("Fire Idle:");
    machine.fire(Session::Idle, &cancel).await.unwrap();

    println!("\nFire Ready directly:");
    if let Err(err) = machine.fire(Session::Ready, &cancel).await {
        println!("  rejected: {err}");
    }

    println!("\nFire Loading with level 3:");
    machine.fire_with(Session::Loading, 3u32, &cancel).await.unwrap();
    println!("  live scopes: {}", arena.live_scopes());

    println!("\nFire Ready:");
    machine.fire(Session::Ready, &cancel).await.unwrap();
    println!("  live scopes: {}", arena.live_scopes());

    let path: Vec<_> = machine.history().get_path().into_iter().copied().collect();
    println!("\nPath: {path:?}");

    machine.dispose().await.unwrap();
    println!("Disposed, live scopes: {}", arena.live_scopes());

    println!("\n=== Example Complete ===");
}
