//! Tic-tac-toe API library - hosted games against a random opponent
//!
//! Users play tic-tac-toe against an opponent that picks a uniformly random
//! empty square. Finished games are scored and users are ranked.
//!
//! # Architecture
//!
//! - **Games**: pure tic-tac-toe core (board codec, evaluator, turn state machine)
//! - **Db**: diesel/SQLite persistence of users, games, move history and scores
//! - **Service**: the facade every API operation goes through
//! - **Ports**: cache, background tasks and mail behind traits
//! - **Server**: axum REST routes over the facade
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tictactoe_api::{ChannelTaskQueue, GameRepository, GameService, MemoryCache};
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = GameRepository::new("tictactoe.db".to_string())?;
//! repository.run_migrations()?;
//!
//! let (tasks, _receiver) = ChannelTaskQueue::new();
//! let service = GameService::new(repository, Arc::new(MemoryCache::new()), Arc::new(tasks));
//!
//! service.create_user("alice", None)?;
//! let game = service.new_game("alice")?;
//! let game = service.make_move(&game.urlsafe_key, 4)?;
//! println!("{}: {}", game.state, game.message);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod active_games;
mod config;
mod db;
mod error;
mod forms;
mod games;
mod keys;
mod locks;
mod ports;
mod ranking;
mod reminders;
mod server;
mod service;

// Crate-level exports - Game core
pub use games::tictactoe::{
    Board, BoardParseError, EMPTY_SYMBOL, GAME_ALREADY_OVER, GameOutcome, GameState, IllegalTurn,
    InvalidMove, Mark, MoveError, OutOfRange, Position, Square, StateError, Transition, Turn,
    evaluate, is_full, pick_move,
};

// Crate-level exports - Persistence
pub use db::{
    AI_PLAYER, DbError, DbErrorKind, Game, GameRepository, MIGRATIONS, MoveRecord, NewMoveRecord,
    NewScore, NewUser, OutcomeCounts, Score, User,
};

// Crate-level exports - Keys
pub use keys::{EntityKey, EntityKind, KeyError};

// Crate-level exports - Ports
pub use ports::{
    ACTIVE_GAMES_KEY, Cache, CacheError, ChannelTaskQueue, Mail, MailError, Mailer, MemoryCache,
    SpoolMailer, Task, TaskError, TaskQueue,
};

// Crate-level exports - Service
pub use active_games::{ActiveGamesCounter, TaskWorker};
pub use error::ServiceError;
pub use forms::{
    CreateUserRequest, GameForm, GameForms, MakeMoveRequest, MoveRecordForm, MoveRecordForms,
    NewGameRequest, ScoreForm, ScoreForms, StringMessage, UserForm, UserForms,
};
pub use locks::GameLocks;
pub use ranking::ranking_score;
pub use reminders::ReminderJob;
pub use service::GameService;

// Crate-level exports - HTTP and configuration
pub use config::{ConfigError, DATABASE_PATH_ENV, ServiceConfig};
pub use server::{ApiError, AppState, router};
