//! Error types for stock agent operations

use thiserror::Error;

/// Stock agent specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// Indicator provider answered with a failure status
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Prompt template error
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Agent execution error
    #[error(transparent)]
    Agent(agent_core::Error),

    /// LLM client error
    #[error(transparent)]
    Llm(#[from] agent_llm::LLMError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Model failures come back out as [`StockError::Llm`] so callers can match on the kind
impl From<agent_core::Error> for StockError {
    fn from(err: agent_core::Error) -> Self {
        match err {
            agent_core::Error::Llm(source) => match source.downcast::<agent_llm::LLMError>() {
                Ok(llm) => StockError::Llm(*llm),
                Err(other) => StockError::Agent(agent_core::Error::Llm(other)),
            },
            other => StockError::Agent(other),
        }
    }
}

/// Convert StockError to agent_core::Error
impl From<StockError> for agent_core::Error {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Agent(inner) => inner,
            StockError::Llm(llm) => agent_core::Error::Llm(Box::new(llm)),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

/// Convert anyhow::Error to StockError
impl From<anyhow::Error> for StockError {
    fn from(err: anyhow::Error) -> Self {
        StockError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidSymbol("   ".to_string());
        assert_eq!(err.to_string(), "Invalid symbol:    ");

        let err = StockError::DataUnavailable {
            symbol: "tcs".to_string(),
            reason: "Exchange or symbol not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data not available for tcs: Exchange or symbol not found"
        );
    }

    #[test]
    fn test_error_conversion() {
        let stock_err = StockError::ApiError("Test error".to_string());
        let agent_err: agent_core::Error = stock_err.into();

        match agent_err {
            agent_core::Error::ProcessingFailed(msg) => {
                assert!(msg.contains("API error"));
            }
            _ => panic!("Expected ProcessingFailed variant"),
        }
    }

    #[test]
    fn test_llm_error_kind_survives_the_agent_layer() {
        let core = agent_core::Error::Llm(Box::new(agent_llm::LLMError::AuthenticationFailed));
        let stock_err: StockError = core.into();
        assert!(matches!(
            stock_err,
            StockError::Llm(agent_llm::LLMError::AuthenticationFailed)
        ));

        let back: agent_core::Error = stock_err.into();
        assert!(matches!(back, agent_core::Error::Llm(_)));
        assert_eq!(
            back.to_string(),
            "LLM request failed: Invalid API key or authentication failed"
        );
    }

    #[test]
    fn test_agent_error_round_trips() {
        let stock_err: StockError = agent_core::Error::MaxIterationsExceeded(3).into();
        let agent_err: agent_core::Error = stock_err.into();
        assert!(matches!(agent_err, agent_core::Error::MaxIterationsExceeded(3)));
    }
}
