//! Per-user request serialization.
//!
//! A workspace is read, mutated, and persisted as one unit, so two requests
//! for the same user must not interleave. Requests for different users
//! never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created async mutex per user id.
///
/// The table itself sits behind a `std::sync::Mutex` that is only held for
/// the lookup, never across an await.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s workspace.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

            // Entries only this table references are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            locks.entry(user_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of users with a held or awaited lock.
    pub fn tracked(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
