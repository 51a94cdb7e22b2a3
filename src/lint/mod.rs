//! Configuration checks over the transition table.
//!
//! Checks accumulate every issue with Stillwater's `Validation` instead of
//! stopping at the first one, so a misconfigured graph is reported in a
//! single pass.
//!
//! Nothing here is enforced at `fire` time; `fire` reports the same defects
//! as errors when a transition actually runs into them.

mod issues;

pub use issues::GraphIssue;

use crate::core::{TransitionTable, Trigger};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Report edges touching unregistered triggers and state types bound to
/// more than one trigger.
pub fn check_table<T: Trigger>(
    table: &TransitionTable<T>,
) -> Validation<(), NonEmptyVec<GraphIssue>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<GraphIssue>>> = Vec::new();

    for (from, to) in table.edges() {
        if !table.is_registered(from) {
            checks.push(Validation::fail(GraphIssue::UnregisteredSource {
                from: from.name().to_string(),
                to: to.name().to_string(),
            }));
        }
        if !table.is_registered(to) {
            checks.push(Validation::fail(GraphIssue::UnregisteredTarget {
                from: from.name().to_string(),
                to: to.name().to_string(),
            }));
        }
    }

    for (state, triggers) in table.shared_types() {
        let mut triggers: Vec<String> = triggers.iter().map(|t| t.name().to_string()).collect();
        triggers.sort();
        checks.push(Validation::fail(GraphIssue::SharedStateType {
            state: state.short_name(),
            triggers,
        }));
    }

    if checks.is_empty() {
        return Validation::success(());
    }
    Validation::all_vec(checks).map(|_| ())
}
