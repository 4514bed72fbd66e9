//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent or runtime could not be constructed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// The model provider call failed; the provider's own error is kept as the source
    #[error("LLM request failed: {0}")]
    Llm(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The model asked for a tool that is not registered
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A tool returned an error
    #[error("Tool '{name}' failed: {message}")]
    ToolFailed {
        /// Tool name
        name: String,
        /// Failure description
        message: String,
    },

    /// The tool-call loop did not reach a final answer in time
    #[error("Max iterations ({0}) reached without a final answer")]
    MaxIterationsExceeded(usize),

    /// Session store failure (poisoned lock and similar)
    #[error("Session error: {0}")]
    Session(String),
}
