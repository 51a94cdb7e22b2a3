//! Per-state resource scopes.
//!
//! Each entered state gets its own scope, created before the state is built
//! and released once the state has fully exited.

use crate::error::ScopeError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Owned handle to a live resource scope.
///
/// Not `Clone`: releasing consumes the handle, so a scope cannot be released
/// twice through the same handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ScopeHandle(Uuid);

impl ScopeHandle {
    /// Create a handle for a scope the caller has just allocated.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creates and releases resource scopes for the engine.
#[async_trait]
pub trait ScopeManager: Send + Sync {
    async fn create_scope(&self) -> Result<ScopeHandle, ScopeError>;

    async fn release_scope(&self, scope: ScopeHandle) -> Result<(), ScopeError>;
}

type Resource = Box<dyn Any + Send + Sync>;

/// Arena keeping type-erased resources per scope.
///
/// Resources attached to a scope are dropped, in insertion order, when the
/// scope is released.
///
/// # Example
///
/// ```rust
/// use switchyard::resources::{ScopeArena, ScopeManager};
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let arena = ScopeArena::new();
///     let scope = arena.create_scope().await.unwrap();
///     arena.attach(&scope, String::from("level data")).unwrap();
///     assert_eq!(arena.resource_count(&scope), 1);
///
///     arena.release_scope(scope).await.unwrap();
///     assert_eq!(arena.live_scopes(), 0);
/// });
/// ```
#[derive(Default)]
pub struct ScopeArena {
    scopes: Mutex<HashMap<Uuid, Vec<Resource>>>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie `resource` to the lifetime of `scope`.
    pub fn attach<R: Any + Send + Sync>(
        &self,
        scope: &ScopeHandle,
        resource: R,
    ) -> Result<(), ScopeError> {
        let mut scopes = self.scopes.lock();
        let resources = scopes
            .get_mut(&scope.id())
            .ok_or(ScopeError::UnknownScope(scope.id()))?;
        resources.push(Box::new(resource));
        Ok(())
    }

    pub fn resource_count(&self, scope: &ScopeHandle) -> usize {
        self.scopes
            .lock()
            .get(&scope.id())
            .map_or(0, |resources| resources.len())
    }

    pub fn is_live(&self, scope: &ScopeHandle) -> bool {
        self.scopes.lock().contains_key(&scope.id())
    }

    pub fn live_scopes(&self) -> usize {
        self.scopes.lock().len()
    }
}

#[async_trait]
impl ScopeManager for ScopeArena {
    async fn create_scope(&self) -> Result<ScopeHandle, ScopeError> {
        let id = Uuid::new_v4();
        self.scopes.lock().insert(id, Vec::new());
        Ok(ScopeHandle::new(id))
    }

    async fn release_scope(&self, scope: ScopeHandle) -> Result<(), ScopeError> {
        let resources = self
            .scopes
            .lock()
            .remove(&scope.id())
            .ok_or(ScopeError::UnknownScope(scope.id()))?;
        // dropped outside the lock; resource destructors may touch the arena
        drop(resources);
        Ok(())
    }
}
