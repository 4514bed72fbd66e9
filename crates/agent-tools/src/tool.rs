//! Tool trait definition

use agent_core::Result;
use agent_llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description, and a JSON schema for its
/// input. The model decides when to call it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the model-supplied arguments
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Tool name, unique within a registry
    fn name(&self) -> &str;

    /// Description that tells the model when to use the tool
    fn description(&self) -> &str;

    /// Input schema (JSON Schema)
    fn input_schema(&self) -> Value;

    /// Definition advertised to the LLM provider
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
