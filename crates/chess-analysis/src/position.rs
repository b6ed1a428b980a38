//! Value types shared by the loader, classifier and report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("White"),
            Side::Black => f.write_str("Black"),
        }
    }
}

/// Immutable snapshot of the game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Number of plies played from the start of the record.
    pub ply: usize,
    pub side_to_move: Side,
    pub fen: String,
    /// Polyglot Zobrist key, used for opening-book lookups.
    pub key: u64,
}

/// A single ply of the game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMove {
    /// 0-based index of this ply in the record.
    pub ply: usize,
    /// Full-move number as printed in PGN (`1.` for the first white move).
    pub move_number: u32,
    pub side: Side,
    /// Standard algebraic notation, with check suffix.
    pub san: String,
    /// UCI notation, as engines report moves.
    pub uci: String,
    /// UCI notation with king-takes-rook castling, as Polyglot books store it.
    pub book_uci: String,
    /// Number of legal moves the mover could choose from.
    pub legal_moves: usize,
    pub before: Position,
    pub after: Position,
}

impl GameMove {
    /// True when the mover had no alternative.
    pub fn is_forced(&self) -> bool {
        self.legal_moves == 1
    }
}
