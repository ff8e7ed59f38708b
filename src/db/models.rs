//! Database models and domain conversions.

use chrono::{NaiveDate, NaiveDateTime};
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::games::tictactoe::{Board, GameOutcome, GameState, Turn};

/// Actor name stored on move records made by the random opponent.
pub const AI_PLAYER: &str = "AIPlayer";

/// User profile database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: i32,
    name: String,
    email: Option<String>,
    ranking_score: i32,
    created_at: NaiveDateTime,
}

/// Insertable user model for creating new users.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    name: String,
    email: Option<String>,
}

/// Game database model.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(belongs_to(User))]
pub struct Game {
    id: i32,
    user_id: i32,
    board: String,
    turn: String,
    move_count: i32,
    game_over: bool,
    result: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Game {
    /// Decodes the stored columns into a checked [`GameState`].
    ///
    /// # Errors
    ///
    /// Returns a [`DbError`] of kind `Corrupt` if any column does not decode
    /// or the columns contradict each other.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn state(&self) -> Result<GameState, DbError> {
        let board: Board = self
            .board
            .parse()
            .map_err(|e| DbError::corrupt(format!("game {} board: {}", self.id, e)))?;
        let turn: Turn = self
            .turn
            .parse()
            .map_err(|_| DbError::corrupt(format!("game {} turn: '{}'", self.id, self.turn)))?;
        let move_count = u8::try_from(self.move_count)
            .map_err(|_| DbError::corrupt(format!("game {} move count {}", self.id, self.move_count)))?;
        let result = self
            .result
            .as_deref()
            .map(parse_outcome)
            .transpose()?;

        GameState::restore(board, turn, move_count, self.game_over, result)
            .map_err(|e| DbError::corrupt(format!("game {}: {}", self.id, e)))
    }
}

/// Insertable game model.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    user_id: i32,
    board: String,
    turn: String,
    move_count: i32,
    game_over: bool,
}

impl NewGame {
    /// Row for a fresh game owned by `user_id`.
    pub fn new(user_id: i32, state: &GameState) -> Self {
        Self {
            user_id,
            board: state.board().to_string(),
            turn: state.turn().to_string(),
            move_count: i32::from(*state.move_count()),
            game_over: *state.game_over(),
        }
    }
}

/// Column updates written after a move.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::games)]
#[diesel(treat_none_as_null = true)]
pub struct GameChanges {
    board: String,
    turn: String,
    move_count: i32,
    game_over: bool,
    result: Option<String>,
    updated_at: NaiveDateTime,
}

impl From<&GameState> for GameChanges {
    fn from(state: &GameState) -> Self {
        Self {
            board: state.board().to_string(),
            turn: state.turn().to_string(),
            move_count: i32::from(*state.move_count()),
            game_over: *state.game_over(),
            result: state.result().map(|r| r.to_db_string().to_string()),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Board snapshot taken after a move.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::move_records)]
#[diesel(belongs_to(Game))]
pub struct MoveRecord {
    id: i32,
    game_id: i32,
    board: String,
    actor: String,
    move_count: i32,
    created_at: NaiveDateTime,
}

/// Insertable move record.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::move_records)]
pub struct NewMoveRecord {
    game_id: i32,
    board: String,
    actor: String,
    move_count: i32,
}

/// Completed-game result for a user.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::scores)]
#[diesel(belongs_to(User))]
pub struct Score {
    id: i32,
    user_id: i32,
    game_id: i32,
    played_on: NaiveDate,
    result: String,
}

impl Score {
    /// Parses the stored result into a [`GameOutcome`].
    #[instrument(skip(self), fields(result = %self.result))]
    pub fn outcome(&self) -> Result<GameOutcome, DbError> {
        parse_outcome(&self.result)
    }
}

/// Insertable score.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::scores)]
pub struct NewScore {
    user_id: i32,
    game_id: i32,
    played_on: NaiveDate,
    result: String,
}

/// Parses an outcome from the string stored in the database.
///
/// # Errors
///
/// Returns [`DbError`] if the string is not a valid outcome value.
#[instrument]
fn parse_outcome(s: &str) -> Result<GameOutcome, DbError> {
    s.parse()
        .map_err(|_| DbError::corrupt(format!("Invalid outcome: '{}'", s)))
}

/// Win/lose/draw counts for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters, new)]
pub struct OutcomeCounts {
    wins: i32,
    draws: i32,
    losses: i32,
}

impl OutcomeCounts {
    /// Number of scored games.
    pub fn total(&self) -> i32 {
        self.wins + self.draws + self.losses
    }

    /// Counts one more outcome.
    pub fn add(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Draw => self.draws += 1,
            GameOutcome::Lose => self.losses += 1,
        }
    }
}
