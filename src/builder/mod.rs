//! Builder API for constructing and configuring state machines.
//!
//! [`StateMachineBuilder`] wires the collaborators and options together;
//! [`StateConfiguration`] is the fluent handle returned by the machine's
//! registration calls.

pub mod configuration;
pub mod error;
pub mod machine;
pub mod macros;

pub use configuration::StateConfiguration;
pub use error::BuildError;
pub use machine::{StateMachineBuilder, DEFAULT_MACHINE_NAME};
