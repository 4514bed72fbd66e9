//! Per-call execution context

use serde_json::Value;
use std::collections::HashMap;

/// Context key holding the conversation (thread) id
pub const SESSION_ID_KEY: &str = "session_id";

/// State handed to an agent alongside its input
///
/// The session id selects which conversation a call continues. Anything
/// else a caller wants to pass along goes in as a JSON value.
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::new().with_session_id("thread-1");
/// assert_eq!(ctx.session_id(), Some("thread-1"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.insert(SESSION_ID_KEY, Value::String(session_id.into()));
        self
    }

    /// Session id, if one was set and is a string
    pub fn session_id(&self) -> Option<&str> {
        self.get(SESSION_ID_KEY).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
