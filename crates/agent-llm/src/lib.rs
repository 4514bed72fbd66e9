//! LLM provider abstraction layer
//!
//! Provider-agnostic types for talking to Large Language Models:
//!
//! - Message types, including tool-use and tool-result blocks
//! - Completion request/response types
//! - Tool definitions for function calling
//! - The `LLMProvider` trait
//! - Concrete providers (behind the `anthropic` / `openai` features)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(any(feature = "anthropic", feature = "openai"))]
pub mod providers;
