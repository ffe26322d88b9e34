//! Live session table.
//!
//! Every session registers on connect and deregisters on teardown. Broadcast
//! reads the table, so it sits behind a lock; the lock is only held long
//! enough to copy handles out, never while a session is doing work.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    error::RuntimeError,
    session::{SessionHandle, SessionId},
};

/// Concurrent map of live sessions.
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionHandle>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionHandle>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handle` unless the table already holds `limit` sessions.
    ///
    /// # Errors
    ///
    /// - `SessionLimitReached` if the table is full
    /// - `DuplicateSession` if the id is already registered
    pub fn try_insert(&self, handle: SessionHandle, limit: usize) -> Result<(), RuntimeError> {
        let mut sessions = self.write();
        if sessions.len() >= limit {
            return Err(RuntimeError::SessionLimitReached { limit });
        }

        match sessions.entry(handle.id()) {
            Entry::Occupied(entry) => Err(RuntimeError::DuplicateSession(*entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(handle);
                Ok(())
            },
        }
    }

    /// Deregister a session.
    pub fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        self.write().remove(&id)
    }

    /// Handle for a live session.
    pub fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.read().get(&id).cloned()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: SessionId) -> bool {
        self.read().contains_key(&id)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of every registered handle.
    pub fn snapshot(&self) -> Vec<SessionHandle> {
        self.read().values().cloned().collect()
    }

    /// Queue a re-render on every live session.
    ///
    /// Sessions that close while the broadcast runs are skipped. Returns the
    /// number of sessions the re-render was queued on.
    pub fn broadcast(&self) -> usize {
        self.rerender_where(|_| true)
    }

    /// Queue a re-render on every live session other than `origin`.
    ///
    /// For handlers: the dispatching session already renders once its
    /// handler commits, so it can skip the broadcast copy.
    pub fn broadcast_except(&self, origin: SessionId) -> usize {
        self.rerender_where(|id| id != origin)
    }

    fn rerender_where(&self, include: impl Fn(SessionId) -> bool) -> usize {
        let mut reached = 0;
        for handle in self.snapshot().into_iter().filter(|handle| include(handle.id())) {
            match handle.rerender() {
                Ok(()) => reached += 1,
                Err(err) => tracing::debug!(error = %err, "broadcast skipped session"),
            }
        }
        tracing::debug!(sessions = reached, "broadcast queued");
        reached
    }

    /// Ask every live session to shut down. Returns the handles so the caller
    /// can wait for them.
    pub fn close_all(&self) -> Vec<SessionHandle> {
        let handles = self.snapshot();
        for handle in &handles {
            handle.close();
        }
        handles
    }
}
