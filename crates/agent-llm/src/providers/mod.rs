//! Concrete LLM provider implementations
//!
//! `for_model` picks a provider from the model name: `claude*` models go to
//! Anthropic, everything else to the OpenAI-compatible chat completions API.

use crate::{LLMError, LLMProvider, Result};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

/// Default HTTP timeout for provider requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Provider family serving a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI or any OpenAI-compatible endpoint
    OpenAI,
}

impl ProviderKind {
    /// Infer the provider from a model name
    pub fn for_model(model: &str) -> Self {
        if model.trim().to_ascii_lowercase().starts_with("claude") {
            Self::Anthropic
        } else {
            Self::OpenAI
        }
    }

    /// Provider name as reported by `LLMProvider::name`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection options shared by all providers
#[derive(Clone)]
pub struct ProviderOptions {
    /// API key
    pub api_key: String,
    /// Override for the API base URL
    pub api_base: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ProviderOptions {
    /// Options with the given key and default base/timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("api_key", &"***")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Build the provider serving `model`
pub fn for_model(model: &str, options: ProviderOptions) -> Result<Arc<dyn LLMProvider>> {
    if options.api_key.trim().is_empty() {
        return Err(LLMError::ConfigurationError(
            "API key must not be empty".to_string(),
        ));
    }

    match ProviderKind::for_model(model) {
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicProvider::with_options(options)?)),
        #[cfg(feature = "openai")]
        ProviderKind::OpenAI => {
            let mut config =
                OpenAIConfig::new(options.api_key).with_timeout(options.timeout_secs);
            if let Some(base) = options.api_base {
                config = config.with_api_base(base);
            }
            Ok(Arc::new(OpenAIProvider::with_config(config)?))
        }
        #[allow(unreachable_patterns)]
        kind => Err(LLMError::ConfigurationError(format!(
            "provider '{kind}' is not enabled in this build"
        ))),
    }
}
