//! Error type for the engine core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid FEN \"{fen}\": {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid move notation: {0}")]
    InvalidMove(String),

    #[error("Illegal move in current position: {0}")]
    IllegalMove(String),
}

impl EngineError {
    pub(crate) fn fen(fen: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
