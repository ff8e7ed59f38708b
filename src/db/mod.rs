//! Database persistence layer for users, games, move history and scores.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use error::{DbError, DbErrorKind};
pub use models::{
    AI_PLAYER, Game, GameChanges, MoveRecord, NewGame, NewMoveRecord, NewScore, NewUser,
    OutcomeCounts, Score, User,
};
pub use repository::GameRepository;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
