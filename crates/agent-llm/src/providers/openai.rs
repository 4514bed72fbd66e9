//! OpenAI-compatible provider implementation
//!
//! Works against OpenAI itself and any endpoint speaking the chat completions
//! protocol (LM Studio, vLLM, Ollama's `/v1`, Azure deployments).
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::new("not-needed").with_api_base("http://localhost:1234/v1");
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("qwen2.5-7b-instruct")
//!     .messages(vec![Message::user("Hello!")])
//!     .max_tokens(100)
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI provider
#[derive(Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL of the API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: super::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set custom API base URL; a trailing slash is dropped
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"***")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// OpenAI chat completions provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to chat completions endpoint");

        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages)?,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(LLMError::from_status(status, error_text, &request.model));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = openai_response.usage.unwrap_or_default();
        debug!(
            finish_reason = %choice.finish_reason.as_deref().unwrap_or("none"),
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            "Received chat completion"
        );

        let message = parse_openai_response(choice.message)?;
        // Some compatible servers report "stop" even when tool calls are present
        let stop_reason = if message.has_tool_uses() {
            StopReason::ToolUse
        } else {
            map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"))
        };

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build the messages array; the system prompt becomes the first message
fn build_openai_messages(
    system: Option<String>,
    messages: Vec<Message>,
) -> Result<Vec<OpenAIMessage>> {
    let mut result = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        result.push(OpenAIMessage::text("system", sys));
    }
    for msg in messages {
        result.extend(convert_message(msg)?);
    }
    Ok(result)
}

/// Convert one message; tool results fan out into separate `tool` messages
fn convert_message(msg: Message) -> Result<Vec<OpenAIMessage>> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    let blocks = match msg.content {
        Some(MessageContent::Text(text)) => return Ok(vec![OpenAIMessage::text(role, text)]),
        Some(MessageContent::Blocks(blocks)) => blocks,
        None => return Ok(vec![OpenAIMessage::text(role, String::new())]),
    };

    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    let mut tool_messages = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: serde_json::to_string(&input)?,
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => tool_messages.push(OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    let mut out = Vec::new();
    if !texts.is_empty() || !tool_calls.is_empty() {
        out.push(OpenAIMessage {
            role,
            content: if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        });
    }
    out.extend(tool_messages);
    Ok(out)
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn parse_openai_response(msg: OpenAIResponseMessage) -> Result<Message> {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        // Empty argument strings show up from some local servers
        let input = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                LLMError::UnexpectedResponse(format!("Failed to parse tool arguments: {e}"))
            })?
        };
        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Ok(Message::assistant_blocks(blocks))
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        "content_filter" => {
            debug!("Content filtered by provider safety systems");
            StopReason::EndTurn
        }
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}
