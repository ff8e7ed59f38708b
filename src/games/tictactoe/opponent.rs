//! Random opponent: picks a uniformly random empty square.

use super::{Board, Position};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

/// Picks a uniformly random empty position.
///
/// Returns `None` only for a full board; callers check for a terminal
/// board before asking for a move.
#[instrument(skip(board, rng), fields(board = %board))]
pub fn pick_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Position> {
    let choice = Position::valid_moves(board).choose(rng).copied();
    debug!(choice = ?choice, "Opponent chose position");
    choice
}
