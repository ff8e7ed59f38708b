//! Key-value cache port.

use derive_more::{Display, Error};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument};

/// Cache key holding the active-games announcement.
pub const ACTIVE_GAMES_KEY: &str = "ACTIVE_GAMES";

/// Cache failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Cache error: {} at {}:{}", message, file, line)]
pub struct CacheError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CacheError {
    /// Creates a new cache error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// String cache shared across requests.
pub trait Cache: Send + Sync + std::fmt::Debug {
    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Reads the value under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}

/// Process-local cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        debug!("Cache entry stored");
        Ok(())
    }

    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }
}
