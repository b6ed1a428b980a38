//! Chess position evaluation types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uci::Score;

/// Magnitude that mate scores are normalized to.
///
/// Any centipawn score is clamped strictly inside `(-MATE_SCORE, MATE_SCORE)`
/// so a forced mate always compares as more extreme than material.
pub const MATE_SCORE: i32 = 100_000;

/// Represents a chess position evaluation from the side to move.
///
/// Evaluations can be either centipawn scores (for normal positions)
/// or mate scores (when a forced mate is found).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    /// Centipawn evaluation (positive = side to move is better)
    Centipawns(i32),
    /// Forced mate. `moves` is the distance in moves, `winning` tells
    /// whether the side to move delivers it. `moves == 0` with
    /// `winning == false` is a position where the side to move is mated.
    Mate { moves: u32, winning: bool },
}

impl Evaluation {
    /// Builds a mate score using the UCI sign convention
    /// (positive = side to move mates, zero or negative = gets mated).
    pub fn mate(n: i32) -> Self {
        Evaluation::Mate {
            moves: n.unsigned_abs(),
            winning: n > 0,
        }
    }

    /// The same evaluation seen by the other side.
    pub fn flip(self) -> Self {
        match self {
            Evaluation::Centipawns(cp) => Evaluation::Centipawns(-cp),
            Evaluation::Mate { moves, winning } => Evaluation::Mate {
                moves,
                winning: !winning,
            },
        }
    }

    /// Centipawn value with mates saturated near [`MATE_SCORE`].
    ///
    /// Nearer mates are more extreme than distant ones and the sign of the
    /// input score is preserved.
    pub fn normalized(self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => cp.clamp(-(MATE_SCORE - 1_000), MATE_SCORE - 1_000),
            Evaluation::Mate { moves, winning } => {
                let distance = moves.min(999) as i32;
                if winning {
                    MATE_SCORE - distance
                } else {
                    -(MATE_SCORE - distance)
                }
            }
        }
    }

    /// Returns true for mate scores.
    pub fn is_mate(self) -> bool {
        matches!(self, Evaluation::Mate { .. })
    }
}

impl From<Score> for Evaluation {
    fn from(score: Score) -> Self {
        match score {
            Score::Cp(cp) => Evaluation::Centipawns(cp),
            Score::Mate(n) => Evaluation::mate(n),
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Evaluation::Mate { moves, winning: true } => write!(f, "#{}", moves),
            Evaluation::Mate {
                moves,
                winning: false,
            } => write!(f, "#-{}", moves),
        }
    }
}

/// What the engine reported for one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvaluation {
    /// Score for the side to move; `None` when the engine gave none.
    pub score: Option<Evaluation>,
    /// Suggested move in UCI notation; `None` in terminal positions.
    pub best_move: Option<String>,
    /// Depth the reported score was searched to.
    pub depth: Option<u32>,
}
