//! In-memory journal of committed transitions.
//!
//! The journal lives only as long as the machine; it is a diagnostic aid,
//! not a persistence mechanism.

use super::trigger::Trigger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed transition.
///
/// `from` is `None` for the bootstrap transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct TransitionRecord<T: Trigger> {
    pub from: Option<T>,
    pub to: T,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of transitions.
///
/// `record` returns a new history with the transition appended; the oldest
/// entries fall off once `limit` is reached. A limit of zero keeps nothing.
///
/// # Example
///
/// ```rust
/// use switchyard::core::{TransitionHistory, TransitionRecord, Trigger};
/// use chrono::Utc;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Flow { Idle, Loading }
///
/// impl Trigger for Flow {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Loading => "Loading",
///         }
///     }
/// }
///
/// let history = TransitionHistory::with_limit(8)
///     .record(TransitionRecord { from: None, to: Flow::Idle, timestamp: Utc::now() })
///     .record(TransitionRecord { from: Some(Flow::Idle), to: Flow::Loading, timestamp: Utc::now() });
///
/// assert_eq!(history.get_path(), vec![&Flow::Idle, &Flow::Loading]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct TransitionHistory<T: Trigger> {
    records: VecDeque<TransitionRecord<T>>,
    limit: usize,
}

/// Default number of transitions kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

impl<T: Trigger> Default for TransitionHistory<T> {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl<T: Trigger> TransitionHistory<T> {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit,
        }
    }

    pub fn record(&self, record: TransitionRecord<T>) -> Self {
        let mut next = self.clone();
        if next.limit == 0 {
            return next;
        }
        while next.records.len() >= next.limit {
            next.records.pop_front();
        }
        next.records.push_back(record);
        next
    }

    /// Triggers visited, oldest first. Starts with the first recorded
    /// `from` when the bootstrap entry has already been evicted.
    pub fn get_path(&self) -> Vec<&T> {
        let mut path = Vec::new();
        if let Some(from) = self.records.front().and_then(|first| first.from.as_ref()) {
            path.push(from);
        }
        path.extend(self.records.iter().map(|record| &record.to));
        path
    }

    /// Time between the oldest and newest retained transitions.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.front()?;
        let last = self.records.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord<T>> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord<T>> {
        self.records.back()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
