//! Trigger identities.
//!
//! A trigger names both the state to enter and the edge of the transition
//! graph used to get there.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for trigger values driving a state machine.
///
/// Triggers come from a small finite domain supplied by the host, usually a
/// fieldless enum. The [`trigger_enum!`](crate::trigger_enum) macro generates
/// a conforming enum.
///
/// # Example
///
/// ```rust
/// use switchyard::core::Trigger;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Screen {
///     Title,
///     Options,
/// }
///
/// impl Trigger for Screen {
///     fn name(&self) -> &str {
///         match self {
///             Self::Title => "Title",
///             Self::Options => "Options",
///         }
///     }
/// }
///
/// assert_eq!(Screen::Options.name(), "Options");
/// ```
pub trait Trigger: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Name used in log events and error messages.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Flow {
        Idle,
        Loading,
    }

    impl Trigger for Flow {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Loading => "Loading",
            }
        }
    }

    #[test]
    fn triggers_hash_by_value() {
        let set: HashSet<Flow> = [Flow::Idle, Flow::Idle, Flow::Loading].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn name_is_stable() {
        assert_eq!(Flow::Loading.name(), Flow::Loading.name());
        assert_eq!(Flow::Idle.name(), "Idle");
    }
}
