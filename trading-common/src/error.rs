use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error types for the signal/backtest engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("Out of order bar for {symbol}: {current} does not follow {previous}")]
    OutOfOrderBar {
        symbol: String,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Series mismatch: {0}")]
    SeriesMismatch(String),
}

impl EngineError {
    /// Recoverable errors are reported as "no signal" by callers; everything
    /// else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::InsufficientData { .. } => true,
            EngineError::OutOfOrderBar { .. } => false,
            EngineError::InvalidParameters(_) => false,
            EngineError::SeriesMismatch(_) => false,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidParameters(message.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
