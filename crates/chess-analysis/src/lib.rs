//! Chess game accuracy analysis with Stockfish integration.
//!
//! This crate loads a PGN game, scores every position with a UCI engine,
//! labels each move and summarizes the result per player.
//!
//! # Overview
//!
//! - [`load_game`] - Reads the first game of a PGN file
//! - [`AnalysisEngine`] - Wrapper for UCI analysis engines like Stockfish
//! - [`MoveClassifier`] - Rule table mapping a move to a [`Classification`]
//! - [`PolyglotBook`] - Opening book lookups
//! - [`GameAnalyzer`] - Runs the whole pipeline and returns a [`Report`]
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{
//!     load_game, AnalysisConfig, AnalysisEngine, EngineOptions, GameAnalyzer, MoveClassifier,
//! };
//!
//! let game = load_game("game.pgn")?;
//! let mut engine = AnalysisEngine::new(&EngineOptions::default())?;
//! let analyzer = GameAnalyzer::new(MoveClassifier::default(), AnalysisConfig::default());
//! let report = analyzer.analyze(&mut engine, &game, |_| {})?;
//! println!("White average loss: {:.1}", report.white.average_cp_loss());
//! ```

pub mod analyzer;
pub mod book;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod position;
pub mod report;

pub use analyzer::{AnalysisConfig, GameAnalyzer, ProgressEvent};
pub use book::{resolve_book, BookError, PolyglotBook};
pub use classifier::{
    Classification, ClassificationRule, ClassifierConfig, ClassifyError, Condition,
    MoveClassifier, MoveContext, RuleError,
};
pub use engine::{AnalysisEngine, EngineError, EngineOptions, PositionEvaluator};
pub use error::AnalysisError;
pub use evaluation::{EngineEvaluation, Evaluation, MATE_SCORE};
pub use game::{load_game, parse_game, GameError, GameInfo, LoadedGame, TimeControlCategory};
pub use position::{GameMove, Position, Side};
pub use report::{assemble, AnalyzedMove, PlayerSummary, Report, ReportRow};
