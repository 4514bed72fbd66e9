//! Tool registry for managing available tools

use crate::Tool;
use agent_core::{Error, Result};
use agent_llm::ToolDefinition;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Registry of tools available to an agent
///
/// Tools are kept sorted by name so the definitions sent to the model are
/// stable between turns.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        let mut tools = self
            .tools
            .write()
            .map_err(|e| Error::Generic(format!("Tool registry lock poisoned: {e}")))?;
        if tools.insert(name.clone(), tool).is_some() {
            debug!(tool = %name, "Replaced previously registered tool");
        }
        Ok(())
    }

    /// Builder-style registration
    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().ok()?.get(name).cloned()
    }

    /// Definitions for every registered tool, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .read()
            .map(|tools| tools.values().map(|t| t.definition()).collect())
            .unwrap_or_default()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
