//! Tool declarations offered to the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable the model may ask for by `name`
///
/// `input_schema` is a JSON Schema object. Both providers send it as is:
/// Anthropic as `input_schema`, OpenAI as `function.parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Small JSON Schema constructors
///
/// ```
/// use agent_llm::tools::schema;
/// use serde_json::json;
///
/// let schema = schema::object(
///     json!({ "symbols": schema::array("Ticker symbols", schema::string("Ticker")) }),
///     vec!["symbols"],
/// );
/// assert_eq!(schema["required"][0], "symbols");
/// ```
pub mod schema {
    use serde_json::{Value, json};

    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({ "type": "object", "properties": properties, "required": required })
    }

    pub fn string(description: &str) -> Value {
        json!({ "type": "string", "description": description })
    }

    pub fn array(description: &str, items: Value) -> Value {
        json!({ "type": "array", "description": description, "items": items })
    }
}
