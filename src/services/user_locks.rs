//! Per-user serialization of taste updates.
//!
//! Feedback apply and undo are read-modify-write sequences over the stored
//! taste vector. Two of them racing for the same user would lose an update,
//! so each runs while holding that user's lock. Different users get
//! different locks and never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::UserId;

/// A lazily populated map of per-user mutexes.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for a user, creating it on first use.
    #[must_use]
    pub fn handle(&self, user: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user.clone()).or_default())
    }

    /// Runs `f` while holding the user's lock.
    ///
    /// A lock poisoned by a panicking holder is recovered: the guarded value
    /// is `()`, and the stored state it protects is only written through
    /// single atomic store calls.
    pub fn with_lock<T>(&self, user: &UserId, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(user);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
