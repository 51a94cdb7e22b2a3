//! Collaborators the engine depends on for building states and owning
//! their resources.
//!
//! Both are traits so hosts can plug in their own container or allocator.
//! [`FactoryRegistry`] and [`ScopeArena`] are ready-made implementations.

mod factory;
mod scope;

pub use factory::{FactoryRegistry, StateFactory};
pub use scope::{ScopeArena, ScopeHandle, ScopeManager};
