//! Core domain types for tic-tac-toe.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{EnumString, IntoStaticStr};

use super::position::Position;

/// Mark placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// The human player's mark, rendered `O`.
    Human,
    /// The random opponent's mark, rendered `X`.
    Ai,
}

impl Mark {
    /// Character used for this mark in the board text.
    pub fn symbol(self) -> char {
        match self {
            Mark::Human => 'O',
            Mark::Ai => 'X',
        }
    }

    /// Parses a board character into a mark.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'O' => Some(Mark::Human),
            'X' => Some(Mark::Ai),
            _ => None,
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

/// Character used for an empty square in the board text.
pub const EMPTY_SYMBOL: char = '-';

/// 3x3 tic-tac-toe board.
///
/// Stored and transported as nine characters in row-major order,
/// `-` for empty, `O` for the human and `X` for the opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub(super) fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for square in &self.squares {
            let c = match square {
                Square::Empty => EMPTY_SYMBOL,
                Square::Occupied(mark) => mark.symbol(),
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Board text that does not describe a 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardParseError {
    /// Wrong number of characters.
    #[display("board must have 9 cells, got {}", _0)]
    Length(#[error(not(source))] usize),
    /// A character other than `-`, `O` or `X`.
    #[display("invalid cell '{}' at index {}", symbol, index)]
    Symbol {
        /// Offending character.
        symbol: char,
        /// Cell index.
        index: usize,
    },
}

impl FromStr for Board {
    type Err = BoardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(BoardParseError::Length(chars.len()));
        }
        let mut board = Board::new();
        for (index, symbol) in chars.into_iter().enumerate() {
            if symbol == EMPTY_SYMBOL {
                continue;
            }
            let mark = Mark::from_symbol(symbol).ok_or(BoardParseError::Symbol { symbol, index })?;
            board.squares[index] = Square::Occupied(mark);
        }
        Ok(board)
    }
}

/// Whose move it is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Turn {
    /// The registered user moves next.
    Human,
    /// The random opponent moves next.
    Ai,
}

impl Turn {
    /// Mark placed by whoever holds this turn.
    pub fn mark(self) -> Mark {
        match self {
            Turn::Human => Mark::Human,
            Turn::Ai => Mark::Ai,
        }
    }

    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Turn::Human => Turn::Ai,
            Turn::Ai => Turn::Human,
        }
    }
}

/// Result of a finished game from the human player's perspective.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum GameOutcome {
    /// Human completed a line.
    Win,
    /// Opponent completed a line.
    Lose,
    /// Board filled without a line.
    Draw,
}

impl GameOutcome {
    /// Converts outcome to the string stored in the database.
    pub fn to_db_string(self) -> &'static str {
        self.into()
    }

    /// Outcome for the human when `mark` completed a line.
    pub fn for_winner(mark: Mark) -> Self {
        match mark {
            Mark::Human => GameOutcome::Win,
            Mark::Ai => GameOutcome::Lose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_text_round_trip() {
        let board: Board = "O-X--O--X".parse().expect("valid board");
        assert_eq!(board.get(Position::TopLeft), Square::Occupied(Mark::Human));
        assert_eq!(board.get(Position::TopRight), Square::Occupied(Mark::Ai));
        assert!(board.is_empty(Position::Center));
        assert_eq!(board.occupied(), 4);
        assert_eq!(board.to_string(), "O-X--O--X");
    }

    #[test]
    fn test_new_board_text() {
        assert_eq!(Board::new().to_string(), "---------");
    }

    #[test]
    fn test_board_rejects_bad_length() {
        assert_eq!("----------".parse::<Board>(), Err(BoardParseError::Length(10)));
    }

    #[test]
    fn test_board_rejects_bad_symbol() {
        let err = "--Z------".parse::<Board>().unwrap_err();
        assert_eq!(err, BoardParseError::Symbol { symbol: 'Z', index: 2 });
    }

    #[test]
    fn test_turn_db_strings() {
        assert_eq!(Turn::Human.to_string(), "human");
        assert_eq!("ai".parse::<Turn>().unwrap(), Turn::Ai);
    }

    #[test]
    fn test_outcome_db_strings() {
        for outcome in [GameOutcome::Win, GameOutcome::Lose, GameOutcome::Draw] {
            let parsed: GameOutcome = outcome.to_db_string().parse().expect("parse");
            assert_eq!(parsed, outcome);
        }
        assert!("loss".parse::<GameOutcome>().is_err());
    }
}
