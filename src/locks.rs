//! Per-game mutual exclusion for read-modify-write requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument};

/// Registry of one mutex per game id.
///
/// Requests that mutate a game hold its mutex from load to commit, so two
/// racing moves on the same game run one after the other. An entry lives
/// only while some request holds or waits on it.
#[derive(Debug, Default)]
pub struct GameLocks {
    locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl GameLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the mutex of `game_id`.
    #[instrument(skip(self, f))]
    pub fn with_lock<T>(&self, game_id: i32, f: impl FnOnce() -> T) -> T {
        let lock = self.handle(game_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(game_id, lock);
        result
    }

    /// Returns the mutex guarding `game_id`, creating it on first use.
    fn handle(&self, game_id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(game_id).or_default())
    }

    /// Drops the entry of `game_id` when no other request holds a handle.
    fn release(&self, game_id: i32, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Handles are only cloned under the table lock, so a count of two
        // (the table and `lock`) means nobody else is holding or waiting.
        let idle = locks
            .get(&game_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(&game_id);
            debug!(game_id, "Game lock released");
        }
    }

    /// Number of games with a registered mutex.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no game has a registered mutex.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
