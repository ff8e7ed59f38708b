//! Cached announcement of how many games are unfinished.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, GameRepository};
use crate::ports::{ACTIVE_GAMES_KEY, Cache, Task};

/// Recomputes and reads the active-games cache entry.
#[derive(Debug, Clone)]
pub struct ActiveGamesCounter {
    repository: GameRepository,
    cache: Arc<dyn Cache>,
}

impl ActiveGamesCounter {
    /// Creates a counter over `repository` publishing into `cache`.
    pub fn new(repository: GameRepository, cache: Arc<dyn Cache>) -> Self {
        Self { repository, cache }
    }

    /// Announcement text for `count` unfinished games.
    pub fn message(count: i64) -> String {
        format!("The number of active game(s) is {}", count)
    }

    /// Counts unfinished games and stores the announcement.
    ///
    /// A cache write failure is logged; only the count query can fail.
    #[instrument(skip(self))]
    pub fn refresh(&self) -> Result<i64, DbError> {
        let count = self.repository.count_active_games()?;
        if let Err(e) = self.cache.set(ACTIVE_GAMES_KEY, Self::message(count)) {
            warn!(error = %e, "Failed to cache active games count");
        }
        info!(count, "Active games count refreshed");
        Ok(count)
    }

    /// Reads the cached announcement, empty when absent or unreadable.
    #[instrument(skip(self))]
    pub fn cached(&self) -> String {
        match self.cache.get(ACTIVE_GAMES_KEY) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read active games count");
                String::new()
            }
        }
    }
}

/// Drains the task queue, running each task off the async runtime.
#[derive(Debug)]
pub struct TaskWorker {
    counter: ActiveGamesCounter,
}

impl TaskWorker {
    /// Creates a worker that services tasks with `counter`.
    pub fn new(counter: ActiveGamesCounter) -> Self {
        Self { counter }
    }

    /// Runs until every sender of `receiver` is dropped.
    #[instrument(skip_all)]
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<Task>) {
        info!("Task worker started");
        while let Some(task) = receiver.recv().await {
            self.handle(task).await;
        }
        info!("Task worker stopped");
    }

    /// Runs one task; failures are logged.
    #[instrument(skip(self))]
    pub async fn handle(&self, task: Task) {
        debug!(%task, "Running task");
        match task {
            Task::CacheActiveGames => {
                let counter = self.counter.clone();
                match tokio::task::spawn_blocking(move || counter.refresh()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!(%task, error = %e, "Task failed"),
                    Err(e) => warn!(%task, error = %e, "Task panicked"),
                }
            }
        }
    }
}
