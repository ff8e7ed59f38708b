//! Request and response messages of the game API.

use serde::{Deserialize, Serialize};

use crate::db::{MoveRecord, Score, User};
use crate::games::tictactoe::{GameOutcome, GameState, Turn};
use crate::keys::EntityKey;

/// Request to register a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Unique user name.
    pub user_name: String,
    /// Address for reminder mail.
    #[serde(default)]
    pub email: Option<String>,
}

/// Request to start a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameRequest {
    /// Owner of the new game.
    pub user_name: String,
}

/// Request to place the human's mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeMoveRequest {
    /// Square index, 0 = top-left through 8 = bottom-right.
    #[serde(rename = "move")]
    pub position: i64,
}

/// Single outbound string message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMessage {
    /// The message.
    pub message: String,
}

impl StringMessage {
    /// Wraps `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameForm {
    /// Opaque key addressing the game.
    pub urlsafe_key: String,
    /// Nine-character board, `-` empty, `O` human, `X` opponent.
    pub state: String,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Human-readable status.
    pub message: String,
    /// Owner of the game.
    pub user_name: String,
    /// Side to move.
    pub turn: Turn,
    /// Marks placed so far.
    pub move_count: i32,
    /// Final result once over.
    pub result: Option<GameOutcome>,
}

impl GameForm {
    /// Builds the form for game `game_id` in `state`, owned by `user_name`.
    pub fn new(game_id: i32, state: &GameState, user_name: &str, message: impl Into<String>) -> Self {
        Self {
            urlsafe_key: EntityKey::game(game_id).urlsafe(),
            state: state.board().to_string(),
            game_over: *state.game_over(),
            message: message.into(),
            user_name: user_name.to_string(),
            turn: *state.turn(),
            move_count: i32::from(*state.move_count()),
            result: *state.result(),
        }
    }
}

/// Several games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameForms {
    /// The games.
    pub items: Vec<GameForm>,
}

/// One entry of a game's move history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecordForm {
    /// User name or `AIPlayer`.
    pub player: String,
    /// Board right after the move.
    pub state: String,
    /// Move count right after the move.
    pub move_count: i32,
}

impl From<&MoveRecord> for MoveRecordForm {
    fn from(record: &MoveRecord) -> Self {
        Self {
            player: record.actor().clone(),
            state: record.board().clone(),
            move_count: *record.move_count(),
        }
    }
}

/// A game's move history in move order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecordForms {
    /// The records.
    pub items: Vec<MoveRecordForm>,
}

/// One completed-game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreForm {
    /// Player the result belongs to.
    pub user_name: String,
    /// Day the game ended, `YYYY-MM-DD`.
    pub date: String,
    /// Result from the player's perspective.
    pub result: GameOutcome,
}

impl ScoreForm {
    /// Builds the form for `score` with its decoded `result`.
    pub fn new(score: &Score, user_name: &str, result: GameOutcome) -> Self {
        Self {
            user_name: user_name.to_string(),
            date: score.played_on().to_string(),
            result,
        }
    }
}

/// Several scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreForms {
    /// The scores.
    pub items: Vec<ScoreForm>,
}

/// A user with their ranking score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    /// User name.
    pub name: String,
    /// Email, if given.
    pub email: Option<String>,
    /// Last computed ranking score.
    pub ranking_score: i32,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            name: user.name().clone(),
            email: user.email().clone(),
            ranking_score: *user.ranking_score(),
        }
    }
}

/// Users in ranking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForms {
    /// The users.
    pub items: Vec<UserForm>,
}
