//! Anthropic Claude provider implementation
//!
//! See: https://docs.anthropic.com/en/api/messages

use super::ProviderOptions;
use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
///
/// Requests always go to the Anthropic endpoint; `ProviderOptions::api_base`
/// only applies to OpenAI-compatible providers and is ignored here so the
/// `x-api-key` header never reaches another host.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a provider from connection options
    pub fn with_options(options: ProviderOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()?;

        if let Some(base) = &options.api_base {
            warn!(api_base = %base, "Ignoring API base override for Anthropic provider");
        }

        Ok(Self {
            client,
            api_key: options.api_key,
        })
    }

    fn messages_url() -> String {
        format!("{ANTHROPIC_API_BASE}/messages")
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        // System turns are carried by the `system` field only
        let messages: Vec<Message> = request
            .messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();

        let anthropic_request = AnthropicRequest {
            model: request.model,
            messages,
            system: request.system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools,
        };

        let response = self
            .client
            .post(Self::messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(LLMError::from_status(
                status,
                error_text,
                &anthropic_request.model,
            ));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            stop_reason = %anthropic_response.stop_reason,
            input_tokens = anthropic_response.usage.input_tokens,
            output_tokens = anthropic_response.usage.output_tokens,
            "Received Anthropic response"
        );

        Ok(CompletionResponse {
            message: Message::assistant_blocks(parse_blocks(anthropic_response.content)),
            stop_reason: map_stop_reason(&anthropic_response.stop_reason),
            usage: TokenUsage {
                input_tokens: anthropic_response.usage.input_tokens,
                output_tokens: anthropic_response.usage.output_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Keep the block types we model and skip the rest (thinking, etc.)
fn parse_blocks(raw: Vec<serde_json::Value>) -> Vec<ContentBlock> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<ContentBlock>(value) {
            Ok(block) => Some(block),
            Err(e) => {
                debug!("Skipping unsupported content block: {}", e);
                None
            }
        })
        .collect()
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "end_turn" => StopReason::EndTurn,
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        "tool_use" => StopReason::ToolUse,
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

// Anthropic wire types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<serde_json::Value>,
    stop_reason: String,
    usage: UsageResponse,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}
