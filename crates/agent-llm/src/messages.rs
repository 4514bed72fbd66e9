//! Message types for LLM communication
//!
//! The shape follows the Anthropic Messages API: a message carries either
//! plain text or a list of content blocks, and tool traffic travels as
//! `tool_use` / `tool_result` blocks.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (handled separately in some providers)
    System,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool use request from assistant
    ToolUse {
        /// Unique ID for this tool use
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters (JSON)
        input: serde_json::Value,
    },

    /// Tool result sent back on the user side
    ToolResult {
        /// ID of the tool use this is responding to
        tool_use_id: String,
        /// Result content
        content: String,
        /// Whether this is an error result
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message from blocks
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(blocks)),
        }
    }

    /// Create a user message carrying several tool results
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(results)),
        }
    }

    /// Text content of the message
    ///
    /// Multiple text blocks are joined with newlines. Returns `None` when the
    /// message carries no text at all.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s.clone()),
            Some(MessageContent::Blocks(blocks)) => {
                let parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("\n"))
                }
            }
            None => None,
        }
    }

    /// Tool use requests in an assistant message
    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
                .collect(),
            _ => vec![],
        }
    }

    /// Check if this message contains any tool uses
    pub fn has_tool_uses(&self) -> bool {
        !self.tool_uses().is_empty()
    }
}
