use thiserror::Error;
use trading_common::EngineError;

/// Service layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Order rejected for {symbol}: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl ServiceError {
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl ToString) -> Self {
        ServiceError::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ServiceError::DataUnavailable { .. } => true,
            ServiceError::OrderRejected { .. } => true,
            ServiceError::Io(_) => true,
            ServiceError::Engine(e) => e.is_recoverable(),
            ServiceError::Config(_) => false,
            ServiceError::Parse(_) => false,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ServiceError::data_unavailable("AAPL", "empty file").is_recoverable());
        assert!(!ServiceError::Config("bad".into()).is_recoverable());
        assert!(ServiceError::Engine(EngineError::InsufficientData {
            required: 21,
            available: 3
        })
        .is_recoverable());
        assert!(!ServiceError::Engine(EngineError::InvalidParameters("x".into())).is_recoverable());
    }
}
