//! The seam between the agent loop and a model vendor

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A model backend answering one completion per call
///
/// The tool-call loop lives in the runtime, not here. Implementations only
/// translate `CompletionRequest` to their wire format and back.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short vendor label for logs, e.g. `"anthropic"`
    fn name(&self) -> &str;
}
