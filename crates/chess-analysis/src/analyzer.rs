//! Game analysis with move quality classification.
//!
//! This module provides the [`GameAnalyzer`], which drives an engine over
//! every position of a game, classifies each move and assembles the
//! [`Report`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::book::PolyglotBook;
use crate::classifier::{MoveClassifier, MoveContext};
use crate::engine::PositionEvaluator;
use crate::error::AnalysisError;
use crate::game::{best_move_san, LoadedGame};
use crate::report::{assemble, AnalyzedMove, Report};

/// Configuration for game analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Search depth for every position.
    pub depth: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { depth: 15 }
    }
}

/// Emitted after each move is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub ply: usize,
    pub total: usize,
    pub swing: Option<i32>,
}

/// Analyzes chess games to classify move quality.
pub struct GameAnalyzer {
    classifier: MoveClassifier,
    config: AnalysisConfig,
    book: Option<PolyglotBook>,
}

impl GameAnalyzer {
    /// Creates an analyzer without an opening book.
    pub fn new(classifier: MoveClassifier, config: AnalysisConfig) -> Self {
        Self {
            classifier,
            config,
            book: None,
        }
    }

    /// Moves found in `book` are eligible for the `InBook` rule.
    pub fn with_book(mut self, book: PolyglotBook) -> Self {
        self.book = Some(book);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyzes a complete game.
    ///
    /// The start position and every position after a move are evaluated
    /// exactly once, in order. The evaluation after move `n` doubles as the
    /// evaluation before move `n + 1`.
    ///
    /// # Errors
    ///
    /// Any engine failure or unclassifiable move aborts the analysis; no
    /// partial report is returned.
    pub fn analyze<E: PositionEvaluator>(
        &self,
        engine: &mut E,
        game: &LoadedGame,
        mut progress: impl FnMut(ProgressEvent),
    ) -> Result<Report, AnalysisError> {
        let depth = self.config.depth;
        let total = game.moves.len();
        info!(plies = total, depth, "analyzing game");

        engine.new_game()?;
        let mut before = engine.evaluate(&game.start, depth)?;
        let mut entries = Vec::with_capacity(total);

        for mv in &game.moves {
            let after = engine.evaluate(&mv.after, depth)?;

            let in_book = self
                .book
                .as_ref()
                .is_some_and(|book| book.contains(mv.before.key, &mv.book_uci));
            let ctx = MoveContext {
                ply: mv.ply,
                before: before.score,
                after: after.score,
                matches_best: before.best_move.as_deref() == Some(mv.uci.as_str()),
                forced: mv.is_forced(),
                in_book,
            };
            let classification =
                self.classifier
                    .classify(&ctx)
                    .map_err(|source| AnalysisError::InvalidInput {
                        ply: mv.ply,
                        move_number: mv.move_number,
                        side: mv.side,
                        san: mv.san.clone(),
                        source,
                    })?;
            let swing = ctx.swing();
            debug!(ply = mv.ply, san = %mv.san, ?swing, %classification, "classified move");

            let best_move_san = before
                .best_move
                .as_deref()
                .and_then(|uci| best_move_san(&mv.before, uci));

            progress(ProgressEvent {
                ply: mv.ply,
                total,
                swing,
            });

            entries.push(AnalyzedMove {
                game_move: mv.clone(),
                classification,
                before: std::mem::replace(&mut before, after.clone()),
                after,
                swing,
                best_move_san,
            });
        }

        Ok(assemble(&entries))
    }
}
