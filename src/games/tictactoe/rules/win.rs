//! Win detection logic for tic-tac-toe.

use super::super::{Board, Mark, Position, Square};
use tracing::instrument;

/// Lines checked by [`evaluate`], in order: rows, columns, diagonals.
const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [
        Position::MiddleLeft,
        Position::Center,
        Position::MiddleRight,
    ],
    [
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ],
    // Columns
    [
        Position::TopLeft,
        Position::MiddleLeft,
        Position::BottomLeft,
    ],
    [
        Position::TopCenter,
        Position::Center,
        Position::BottomCenter,
    ],
    [
        Position::TopRight,
        Position::MiddleRight,
        Position::BottomRight,
    ],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Returns the mark that owns a complete line, if any.
///
/// The first winning line in [`LINES`] order decides.
#[instrument(skip(board), fields(board = %board))]
pub fn evaluate(board: &Board) -> Option<Mark> {
    for [a, b, c] in LINES {
        if let Square::Occupied(mark) = board.get(a)
            && board.get(b) == Square::Occupied(mark)
            && board.get(c) == Square::Occupied(mark)
        {
            return Some(mark);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(text: &str) -> Board {
        text.parse().expect("valid board text")
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(evaluate(&Board::new()), None);
    }

    #[test]
    fn test_every_line_wins_for_either_mark() {
        for line in LINES {
            for mark in [Mark::Human, Mark::Ai] {
                let mut b = Board::new();
                for pos in line {
                    b.set(pos, Square::Occupied(mark));
                }
                assert_eq!(evaluate(&b), Some(mark), "line {line:?}");
            }
        }
    }

    #[test]
    fn test_winner_top_row() {
        assert_eq!(evaluate(&board("OOO-X-X--")), Some(Mark::Human));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        assert_eq!(evaluate(&board("O-XOX-X--")), Some(Mark::Ai));
    }

    #[test]
    fn test_full_board_without_line() {
        assert_eq!(evaluate(&board("OXOOXXXOO")), None);
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        assert_eq!(evaluate(&board("OOX------")), None);
    }
}
