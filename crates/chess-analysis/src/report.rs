//! Report rows and per-player summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classifier::Classification;
use crate::evaluation::{EngineEvaluation, Evaluation};
use crate::position::{GameMove, Side};

/// Per-move loss is capped here before averaging, so one missed mate does
/// not dominate a player's average.
pub const MAX_CP_LOSS: i32 = 1_000;

/// One classified move, as produced by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedMove {
    pub game_move: GameMove,
    pub classification: Classification,
    /// Engine result for the position before the move.
    pub before: EngineEvaluation,
    /// Engine result for the position after the move.
    pub after: EngineEvaluation,
    /// Mover's swing in centipawns, absent on a first move without a prior
    /// evaluation.
    pub swing: Option<i32>,
    /// Engine suggestion in SAN, when it parses in the position before.
    pub best_move_san: Option<String>,
}

/// One line of the move table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub ply: usize,
    pub move_number: u32,
    pub side: Side,
    pub san: String,
    /// Score before the move, mover's point of view.
    pub eval_before: Option<Evaluation>,
    /// Score after the move, mover's point of view.
    pub eval_after: Option<Evaluation>,
    pub swing: Option<i32>,
    pub classification: Classification,
    /// Engine's preferred move in SAN, only when the player chose otherwise.
    pub best_move: Option<String>,
    pub depth: Option<u32>,
}

impl ReportRow {
    /// Centipawns given away by this move.
    pub fn cp_loss(&self) -> i32 {
        self.swing.map_or(0, |s| (-s).clamp(0, MAX_CP_LOSS))
    }
}

impl From<&AnalyzedMove> for ReportRow {
    fn from(entry: &AnalyzedMove) -> Self {
        let mv = &entry.game_move;
        let played_best = entry.before.best_move.as_deref() == Some(mv.uci.as_str());

        ReportRow {
            ply: mv.ply,
            move_number: mv.move_number,
            side: mv.side,
            san: mv.san.clone(),
            eval_before: entry.before.score,
            eval_after: entry.after.score.map(Evaluation::flip),
            swing: entry.swing,
            classification: entry.classification,
            best_move: if played_best {
                None
            } else {
                entry.best_move_san.clone()
            },
            depth: entry.before.depth.or(entry.after.depth),
        }
    }
}

/// Label counts and centipawn loss for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub side: Side,
    /// Every label is present, zero when it never occurred.
    pub counts: BTreeMap<Classification, usize>,
    pub moves: usize,
    pub total_cp_loss: i64,
}

impl PlayerSummary {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            counts: Classification::ALL.iter().map(|&c| (c, 0)).collect(),
            moves: 0,
            total_cp_loss: 0,
        }
    }

    /// Summarizes the rows belonging to `side`. Row order does not matter.
    pub fn from_rows<'a>(side: Side, rows: impl IntoIterator<Item = &'a ReportRow>) -> Self {
        let mut summary = Self::new(side);
        for row in rows.into_iter().filter(|row| row.side == side) {
            summary.record(row);
        }
        summary
    }

    fn record(&mut self, row: &ReportRow) {
        *self.counts.entry(row.classification).or_insert(0) += 1;
        self.moves += 1;
        self.total_cp_loss += i64::from(row.cp_loss());
    }

    pub fn count(&self, label: Classification) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Average centipawn loss per move, 0 when the side has not moved.
    pub fn average_cp_loss(&self) -> f64 {
        if self.moves == 0 {
            0.0
        } else {
            self.total_cp_loss as f64 / self.moves as f64
        }
    }
}

/// Final per-move table plus both summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub white: PlayerSummary,
    pub black: PlayerSummary,
}

impl Report {
    pub fn summary(&self, side: Side) -> &PlayerSummary {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

/// Builds the report. Rows keep the input order.
pub fn assemble(entries: &[AnalyzedMove]) -> Report {
    let rows: Vec<ReportRow> = entries.iter().map(ReportRow::from).collect();
    let white = PlayerSummary::from_rows(Side::White, &rows);
    let black = PlayerSummary::from_rows(Side::Black, &rows);
    Report { rows, white, black }
}
