//! Coordinate notation for squares and moves.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("invalid square notation: {0}")]
    InvalidSquare(String),
    #[error("invalid move notation: {0}")]
    InvalidMove(String),
    #[error("square index out of range: {0}")]
    IndexOutOfRange(i64),
}

/// A board square, 0..63, `a1` = 0 through `h8` = 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub fn new(index: u8) -> Option<Self> {
        (index < 64).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl FromStr for Square {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(NotationError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(NotationError::InvalidSquare(s.to_string()));
        }
        Ok(Self((rank - b'1') * 8 + (file - b'a')))
    }
}

/// A move: either placing a disc on a square, or passing when no legal
/// placement exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Place(Square),
    Pass,
}

/// Text form of a pass, as written in game transcripts.
pub const PASS_STR: &str = "--";

impl Move {
    /// Compact integer encoding used in storage: square index, or -1
    /// for a pass.
    pub fn to_index(self) -> i8 {
        match self {
            Self::Place(sq) => sq.index() as i8,
            Self::Pass => -1,
        }
    }

    pub fn from_index(index: i64) -> Result<Self, NotationError> {
        match index {
            -1 => Ok(Self::Pass),
            0..=63 => Ok(Self::Place(Square(index as u8))),
            other => Err(NotationError::IndexOutOfRange(other)),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Place(sq) => write!(f, "{sq}"),
            Self::Pass => write!(f, "{PASS_STR}"),
        }
    }
}

impl FromStr for Move {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PASS_STR {
            return Ok(Self::Pass);
        }
        s.parse::<Square>()
            .map(Self::Place)
            .map_err(|_| NotationError::InvalidMove(s.to_string()))
    }
}

/// Format a move sequence as a space-separated transcript line.
pub fn format_move_line(moves: &[Move]) -> String {
    moves
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a space-separated transcript line back into moves.
pub fn parse_move_line(line: &str) -> Result<Vec<Move>, NotationError> {
    line.split_whitespace().map(Move::from_str).collect()
}
