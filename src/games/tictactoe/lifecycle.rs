//! Turn state machine for a game between a human and the random opponent.
//!
//! A game is `InProgress(Human)`, `InProgress(Ai)` or `Over(outcome)`.
//! Every move-applying call first re-evaluates the current board, so a
//! board that became terminal without being marked over is closed out
//! (exactly once) before anything else happens.

use super::opponent::pick_move;
use super::position::OutOfRange;
use super::rules::{evaluate, is_full};
use super::types::{Board, GameOutcome, Square, Turn};
use super::Position;
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Reply when the game had already ended.
pub const GAME_ALREADY_OVER: &str = "Game already over!";

/// Move rejected because of its target square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum InvalidMove {
    /// Index outside 0-8.
    #[display("{}", _0)]
    OutOfRange(OutOfRange),
    /// Target square already holds a mark.
    #[display("Square {} is already occupied", _0)]
    Occupied(#[error(not(source))] Position),
}

impl From<OutOfRange> for InvalidMove {
    fn from(err: OutOfRange) -> Self {
        Self::OutOfRange(err)
    }
}

/// Move refused because it is not the caller's turn or the game is over.
///
/// This is informational: the request is answered with [`IllegalTurn::message`]
/// and the game is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum IllegalTurn {
    /// Human tried to move on the opponent's turn.
    #[display("This is not your turn")]
    NotYourTurn,
    /// Opponent move requested on the human's turn.
    #[display("Waiting for your move.")]
    WaitingForHuman,
    /// The game has ended.
    #[display("{}", GAME_ALREADY_OVER)]
    GameOver,
}

impl IllegalTurn {
    /// Message returned to the caller.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Why a move was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error, From)]
pub enum MoveError {
    /// Bad target square.
    #[display("Invalid move: {}", _0)]
    InvalidMove(InvalidMove),
    /// Wrong turn or finished game.
    #[display("{}", _0)]
    IllegalTurn(IllegalTurn),
}

/// What a successful call did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A move was applied and play continues with `next`.
    Continued {
        /// Side that moved.
        mover: Turn,
        /// Square that was marked.
        position: Position,
        /// Side to move now.
        next: Turn,
    },
    /// This call ended the game.
    ///
    /// `position` is `None` when the board was already terminal and the
    /// call only recorded the ending.
    Finished {
        /// Square marked by the final move, if this call made one.
        position: Option<Position>,
        /// Result from the human's perspective.
        outcome: GameOutcome,
    },
}

impl Transition {
    /// Message returned to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            Transition::Continued { next: Turn::Ai, .. } => "AI's turn",
            Transition::Continued { next: Turn::Human, .. } => "Your turn",
            Transition::Finished { position: None, .. } => GAME_ALREADY_OVER,
            Transition::Finished { outcome: GameOutcome::Win, .. } => "You win!",
            Transition::Finished { outcome: GameOutcome::Lose, .. } => "You Lose!",
            Transition::Finished { outcome: GameOutcome::Draw, .. } => "This is a Draw.",
        }
    }

    /// Side whose move should be appended to the history, if any.
    ///
    /// Only moves that leave the game in progress are recorded.
    pub fn recorded_mover(&self) -> Option<Turn> {
        match self {
            Transition::Continued { mover, .. } => Some(*mover),
            Transition::Finished { .. } => None,
        }
    }

    /// Outcome to score, if this call ended the game.
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self {
            Transition::Finished { outcome, .. } => Some(*outcome),
            Transition::Continued { .. } => None,
        }
    }
}

/// Stored fields that do not describe a reachable game.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Inconsistent game state: {}", _0)]
pub struct StateError(#[error(not(source))] pub String);

/// Complete state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GameState {
    /// The board.
    board: Board,
    /// Side to move.
    turn: Turn,
    /// Number of marks placed (0-9).
    move_count: u8,
    /// Set once a terminal board has been recorded.
    game_over: bool,
    /// Final result, set together with `game_over`.
    result: Option<GameOutcome>,
}

impl GameState {
    /// Creates a fresh game: empty board, human to move.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Turn::Human,
            move_count: 0,
            game_over: false,
            result: None,
        }
    }

    /// Rebuilds a state from stored fields, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the move count disagrees with the board or
    /// the result disagrees with the game-over flag.
    #[instrument(skip(board), fields(board = %board))]
    pub fn restore(
        board: Board,
        turn: Turn,
        move_count: u8,
        game_over: bool,
        result: Option<GameOutcome>,
    ) -> Result<Self, StateError> {
        if usize::from(move_count) != board.occupied() {
            return Err(StateError(format!(
                "move count {} but {} occupied squares",
                move_count,
                board.occupied()
            )));
        }
        if game_over != result.is_some() {
            return Err(StateError(format!(
                "game_over={} with result {:?}",
                game_over, result
            )));
        }
        Ok(Self {
            board,
            turn,
            move_count,
            game_over,
            result,
        })
    }

    /// Applies the human's move at `index`.
    ///
    /// # Errors
    ///
    /// [`MoveError::IllegalTurn`] when the game is over or it is the
    /// opponent's turn, [`MoveError::InvalidMove`] when `index` is outside
    /// the board or the square is taken. The state is unchanged on error.
    #[instrument(skip(self), fields(turn = %self.turn, move_count = self.move_count))]
    pub fn apply_human_move(&mut self, index: i64) -> Result<Transition, MoveError> {
        if let Some(transition) = self.close_if_terminal()? {
            return Ok(transition);
        }
        if self.turn != Turn::Human {
            debug!("Human move refused on opponent's turn");
            return Err(IllegalTurn::NotYourTurn.into());
        }

        let position = Position::try_from(index).map_err(InvalidMove::from)?;
        if !self.board.is_empty(position) {
            warn!(%position, "Square already occupied");
            return Err(InvalidMove::Occupied(position).into());
        }

        Ok(self.place(position))
    }

    /// Lets the opponent move on a random empty square.
    ///
    /// # Errors
    ///
    /// [`MoveError::IllegalTurn`] when the game is over or it is the
    /// human's turn. The state is unchanged on error.
    #[instrument(skip(self, rng), fields(turn = %self.turn, move_count = self.move_count))]
    pub fn apply_ai_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Transition, MoveError> {
        if let Some(transition) = self.close_if_terminal()? {
            return Ok(transition);
        }
        if self.turn != Turn::Ai {
            debug!("Opponent move refused on human's turn");
            return Err(IllegalTurn::WaitingForHuman.into());
        }

        // Not terminal, so the board has an empty square.
        let position = pick_move(&self.board, rng).ok_or(IllegalTurn::GameOver)?;
        Ok(self.place(position))
    }

    /// Refuses finished games and closes out boards that are terminal but
    /// not yet marked over.
    fn close_if_terminal(&mut self) -> Result<Option<Transition>, MoveError> {
        if self.game_over {
            debug!(result = ?self.result, "Game already over");
            return Err(IllegalTurn::GameOver.into());
        }
        match self.terminal_outcome() {
            Some(outcome) => {
                warn!(?outcome, "Board was terminal but game not marked over");
                self.finish(outcome);
                Ok(Some(Transition::Finished {
                    position: None,
                    outcome,
                }))
            }
            None => Ok(None),
        }
    }

    /// Places the current side's mark and advances the machine.
    fn place(&mut self, position: Position) -> Transition {
        let mover = self.turn;
        self.board.set(position, Square::Occupied(mover.mark()));
        self.move_count += 1;

        if let Some(outcome) = self.terminal_outcome() {
            self.finish(outcome);
            return Transition::Finished {
                position: Some(position),
                outcome,
            };
        }

        self.turn = mover.opponent();
        debug!(%position, next = %self.turn, "Move applied");
        Transition::Continued {
            mover,
            position,
            next: self.turn,
        }
    }

    fn terminal_outcome(&self) -> Option<GameOutcome> {
        if let Some(mark) = evaluate(&self.board) {
            Some(GameOutcome::for_winner(mark))
        } else if is_full(&self.board) {
            Some(GameOutcome::Draw)
        } else {
            None
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        info!(?outcome, move_count = self.move_count, "Game over");
        self.game_over = true;
        self.result = Some(outcome);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
