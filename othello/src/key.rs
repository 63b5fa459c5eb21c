//! Canonical position identity.
//!
//! A [`PositionKey`] is the wide, collision-free identity used as the
//! primary key throughout the knowledge store: the two color bitboards
//! plus the side to move, rendered as fixed-width hex text. The earlier
//! storage generation keyed rows by [`crate::Board::narrow_hash`], a
//! lossy 64-bit hash; those databases are absorbed by the store's
//! one-way legacy importer rather than supported at runtime.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Side};

/// Canonical identity of a position: `(black, white, side_to_move)`.
///
/// The text encoding is exactly 35 characters:
/// `{black:016x}-{white:016x}-{b|w}`. Encoding and parsing are lossless
/// inverses, so the key can move between binary and textual contexts
/// freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    black: u64,
    white: u64,
    side_to_move: Side,
}

/// Length of the canonical text encoding.
pub const KEY_WIDTH: usize = 35;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid position key: {0}")]
pub struct KeyParseError(String);

impl PositionKey {
    pub fn new(black: u64, white: u64, side_to_move: Side) -> Self {
        Self {
            black,
            white,
            side_to_move,
        }
    }

    pub fn from_board(board: &Board) -> Self {
        Self {
            black: board.black,
            white: board.white,
            side_to_move: board.side_to_move,
        }
    }

    pub fn black(&self) -> u64 {
        self.black
    }

    pub fn white(&self) -> u64 {
        self.white
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Reconstruct the board this key identifies. The ply is not part
    /// of identity and comes back as the supplied value.
    pub fn to_board(&self, ply: u16) -> Board {
        Board::new(self.black, self.white, self.side_to_move, ply)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:016x}-{:016x}-{}",
            self.black,
            self.white,
            self.side_to_move.as_char()
        )
    }
}

impl FromStr for PositionKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || KeyParseError(s.to_string());
        if s.len() != KEY_WIDTH || !s.is_ascii() {
            return Err(err());
        }
        let (black_hex, rest) = s.split_at(16);
        let rest = rest.strip_prefix('-').ok_or_else(err)?;
        let (white_hex, rest) = rest.split_at(16);
        let rest = rest.strip_prefix('-').ok_or_else(err)?;
        let black = u64::from_str_radix(black_hex, 16).map_err(|_| err())?;
        let white = u64::from_str_radix(white_hex, 16).map_err(|_| err())?;
        let mut chars = rest.chars();
        let side = chars
            .next()
            .and_then(Side::from_char)
            .filter(|_| chars.next().is_none())
            .ok_or_else(err)?;
        Ok(Self::new(black, white, side))
    }
}
