//! Tic-tac-toe against a random opponent.

mod lifecycle;
mod opponent;
mod position;
mod rules;
mod types;

pub use lifecycle::{
    GAME_ALREADY_OVER, GameState, IllegalTurn, InvalidMove, MoveError, StateError, Transition,
};
pub use opponent::pick_move;
pub use position::{OutOfRange, Position};
pub use rules::{evaluate, is_full};
pub use types::{Board, BoardParseError, EMPTY_SYMBOL, GameOutcome, Mark, Square, Turn};
