//! Error taxonomy of the game service.

use derive_more::{Display, Error, From};

use crate::db::DbError;
use crate::games::tictactoe::InvalidMove;
use crate::keys::KeyError;

/// Failure of a game service operation.
///
/// Wrong-turn and game-over moves are not errors: they are answered with
/// an informational game form.
#[derive(Debug, Clone, Display, Error, From)]
pub enum ServiceError {
    /// Referenced user or game does not exist.
    #[display("{}", _0)]
    #[from(skip)]
    NotFound(#[error(not(source))] String),
    /// Name already taken.
    #[display("{}", _0)]
    #[from(skip)]
    Conflict(#[error(not(source))] String),
    /// Move outside the board or onto an occupied square.
    #[display("Invalid Move: {}", _0)]
    InvalidMove(InvalidMove),
    /// Key does not parse or addresses the wrong kind of entity.
    #[display("{}", _0)]
    MalformedReference(KeyError),
    /// Store failure.
    #[display("{}", _0)]
    Database(DbError),
    /// Write failure surfaced with a fixed message.
    #[display("{}", _0)]
    #[from(skip)]
    Internal(#[error(not(source))] String),
}

impl ServiceError {
    /// User lookup by name failed.
    pub fn user_not_found() -> Self {
        Self::NotFound("A User with that name does not exist!".to_string())
    }

    /// Game lookup failed.
    pub fn game_not_found() -> Self {
        Self::NotFound("Game not found!".to_string())
    }
}
