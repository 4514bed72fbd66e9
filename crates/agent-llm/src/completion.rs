//! One round trip to a model: what goes out and what comes back

use crate::{Message, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

const DEFAULT_MAX_TOKENS: usize = 1024;

/// Everything a provider needs for a single completion
///
/// `messages` is the whole transcript, earlier turns and tool traffic
/// included. Providers are stateless between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub max_tokens: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// `None` rather than an empty list when no tools are offered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

impl CompletionRequest {
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder {
            request: CompletionRequest {
                model: model.into(),
                messages: Vec::new(),
                system: None,
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: None,
                tools: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The assistant message, possibly holding tool_use blocks
    pub message: Message,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

/// Why the model stopped writing
///
/// Providers map their own vocabulary onto these four; anything unknown
/// becomes `EndTurn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    /// The message carries tool calls that expect results
    ToolUse,
}

/// Token counts for one call, or summed over a turn with `+=`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Builder returned by [`CompletionRequest::builder`]
#[derive(Debug, Clone)]
pub struct CompletionRequestBuilder {
    request: CompletionRequest,
}

impl CompletionRequestBuilder {
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.request.messages = messages;
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.request.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.request.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.request.temperature = Some(temperature);
        self
    }

    /// An empty list leaves `tools` unset
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.request.tools = (!tools.is_empty()).then_some(tools);
        self
    }

    pub fn build(self) -> CompletionRequest {
        self.request
    }
}
