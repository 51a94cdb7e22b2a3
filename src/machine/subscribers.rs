//! State-changed notification fan-out.

use crate::core::{StateType, Trigger};
use parking_lot::RwLock;
use std::sync::Arc;

/// Published after a transition's enter phase completes.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange<T: Trigger> {
    pub from: Option<T>,
    pub to: T,
    pub state: StateType,
}

/// Callback invoked synchronously with every [`StateChange`].
pub type StateChangedCallback<T> = Arc<dyn Fn(&StateChange<T>) + Send + Sync>;

fn same_callback<T: Trigger>(a: &StateChangedCallback<T>, b: &StateChangedCallback<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Ordered subscriber list keyed by `Arc` identity.
pub(crate) struct Subscribers<T: Trigger> {
    callbacks: RwLock<Vec<StateChangedCallback<T>>>,
}

impl<T: Trigger> Subscribers<T> {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Subscribing an already present callback moves it to the end instead
    /// of adding a second entry.
    pub(crate) fn subscribe(&self, callback: StateChangedCallback<T>) {
        let mut callbacks = self.callbacks.write();
        callbacks.retain(|existing| !same_callback(existing, &callback));
        callbacks.push(callback);
    }

    pub(crate) fn unsubscribe(&self, callback: &StateChangedCallback<T>) {
        self.callbacks
            .write()
            .retain(|existing| !same_callback(existing, callback));
    }

    /// Invoke every subscriber. The list is snapshotted first so callbacks
    /// may subscribe or unsubscribe freely.
    pub(crate) fn publish(&self, change: &StateChange<T>) {
        let callbacks = self.callbacks.read().clone();
        for callback in callbacks {
            callback(change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.read().len()
    }
}
