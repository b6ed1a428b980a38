//! Top-level analysis errors.

use thiserror::Error;

use crate::classifier::ClassifyError;
use crate::engine::EngineError;
use crate::game::GameError;
use crate::position::Side;

/// Errors that abort a game analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A move could not be classified.
    #[error("cannot classify move {move_number} ({side}) {san} at ply {ply}: {source}")]
    InvalidInput {
        ply: usize,
        move_number: u32,
        side: Side,
        san: String,
        #[source]
        source: ClassifyError,
    },
    /// The engine could not be started or stopped answering.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),
    /// The game record could not be read.
    #[error("malformed game record: {0}")]
    MalformedRecord(#[from] GameError),
}

impl AnalysisError {
    /// Ply the error refers to, when it is tied to a single move.
    pub fn ply(&self) -> Option<usize> {
        match self {
            AnalysisError::InvalidInput { ply, .. } => Some(*ply),
            AnalysisError::MalformedRecord(GameError::IllegalMove { ply, .. }) => Some(*ply),
            _ => None,
        }
    }
}
