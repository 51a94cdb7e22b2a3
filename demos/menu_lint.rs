//! Menu Graph Lint
//!
//! This example shows configuration mistakes being reported all at once.
//!
//! Key concepts:
//! - `lint()` accumulates every graph issue with Stillwater's `Validation`
//! - Edges into unregistered triggers
//! - One state type bound to several triggers
//!
//! Run with: cargo run --example menu_lint

use std::sync::Arc;
use stillwater::validation::Validation;
use switchyard::core::{PureState, State};
use switchyard::error::CallbackResult;
use switchyard::resources::{FactoryRegistry, ScopeArena};
use switchyard::{async_trait, trigger_enum, CancellationToken, StateMachine};

trigger_enum! {
    enum Menu {
        Title,
        Options,
        Credits,
        Quit,
    }
}

struct Screen;

impl State<Menu> for Screen {}

#[async_trait]
impl PureState<Menu> for Screen {
    async fn on_enter(&mut self, _trigger: &Menu, _cancel: &CancellationToken) -> CallbackResult {
        Ok(())
    }
}

fn main() {
    println!("=== Menu Graph Lint Example ===\n");

    let machine = StateMachine::new(
        Arc::new(FactoryRegistry::<Menu>::new().provide(|_| Screen)),
        Arc::new(ScopeArena::new()),
    );

    // Title and Options share the Screen type; Credits and Quit are never registered
    machine
        .register::<Screen>(Menu::Title)
        .allow_transitions([Menu::Options, Menu::Credits]);
    machine
        .register::<Screen>(Menu::Options)
        .allow_transition(Menu::Quit);

    match machine.lint() {
        Validation::Success(()) => println!("Graph is clean"),
        Validation::Failure(issues) => {
            println!("Found {} issues:", issues.len());
            for issue in issues.iter() {
                println!("  - {issue}");
            }
        }
    }

    println!("\n=== Example Complete ===");
}
