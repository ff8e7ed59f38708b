//! Background task queue port.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Work that runs after the request that queued it has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Task {
    /// Recount unfinished games and refresh the cached announcement.
    #[display("cache_active_games")]
    CacheActiveGames,
}

/// Task could not be queued.
#[derive(Debug, Clone, Display, Error)]
#[display("Task dispatch error: {} at {}:{}", message, file, line)]
pub struct TaskError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TaskError {
    /// Creates a new dispatch error with caller location tracking.
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

/// Fire-and-forget task dispatch.
pub trait TaskQueue: Send + Sync + std::fmt::Debug {
    /// Queues `task`; returns once it is accepted, not once it has run.
    fn enqueue(&self, task: Task) -> Result<(), TaskError>;
}

/// Queue backed by an unbounded tokio channel.
///
/// The receiving half is drained by [`crate::TaskWorker`].
#[derive(Debug, Clone)]
pub struct ChannelTaskQueue {
    sender: mpsc::UnboundedSender<Task>,
}

impl ChannelTaskQueue {
    /// Creates a queue and the receiver its worker drains.
    #[instrument]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TaskQueue for ChannelTaskQueue {
    #[instrument(skip(self))]
    fn enqueue(&self, task: Task) -> Result<(), TaskError> {
        self.sender
            .send(task)
            .map_err(|e| TaskError::new(format!("Task queue closed, dropped {}", e.0)))?;
        debug!(%task, "Task queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_delivers_to_receiver() {
        let (queue, mut receiver) = ChannelTaskQueue::new();
        queue.enqueue(Task::CacheActiveGames).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), Task::CacheActiveGames);
    }

    #[test]
    fn test_enqueue_fails_once_worker_is_gone() {
        let (queue, receiver) = ChannelTaskQueue::new();
        drop(receiver);
        let err = queue.enqueue(Task::CacheActiveGames).unwrap_err();
        assert!(err.message.contains("cache_active_games"));
    }
}
