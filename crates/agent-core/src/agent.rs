//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all agents must implement
///
/// Input and output are plain strings. Per-call state (session id and
/// similar) travels in the `Context`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;
}
