//! The stock agent: one indicator tool, a fixed prompt and per-session memory

use agent_core::{Agent, Context};
use agent_llm::LLMProvider;
use agent_llm::providers::{self, ProviderKind, ProviderOptions};
use agent_runtime::{
    AgentExecutor, ExecutorConfig, ExecutorEventHandler, SessionId, SessionStore,
};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::api::{IndicatorSource, TradingViewClient};
use crate::config::{AgentConfig, ApiKey, MarketConfig};
use crate::error::{Result, StockError};
use crate::tools::IndicatorTool;

/// Sessions shared by every `run_stock_agent` call in this process
static DEFAULT_SESSIONS: LazyLock<SessionStore> = LazyLock::new(SessionStore::new);

/// Handle to the process-wide session store used by [`run_stock_agent`]
pub fn default_sessions() -> SessionStore {
    DEFAULT_SESSIONS.clone()
}

/// Provider options for `config`; the base URL only applies to OpenAI-compatible models
fn provider_options(config: &AgentConfig) -> ProviderOptions {
    let options = ProviderOptions::new(config.api_key.expose()).with_timeout(config.timeout_secs);
    match (&config.api_base, config.provider_kind()) {
        (Some(base), ProviderKind::OpenAI) => options.with_api_base(base.clone()),
        _ => options,
    }
}

/// Trading-signal agent backed by an LLM and the indicator tool
pub struct StockAgent {
    executor: AgentExecutor,
    sessions: SessionStore,
    model: String,
}

impl StockAgent {
    /// Build the provider for `config.model` and wire up the agent
    pub fn new(
        config: AgentConfig,
        source: Arc<dyn IndicatorSource>,
        sessions: SessionStore,
    ) -> Result<Self> {
        config.validate()?;

        let provider = providers::for_model(&config.model, provider_options(&config))?;

        info!(
            model = %config.model,
            provider = %provider.name(),
            "LLM provider initialized"
        );

        Self::with_provider(config, provider, source, sessions)
    }

    /// Wire up the agent around an existing provider
    pub fn with_provider(
        config: AgentConfig,
        provider: Arc<dyn LLMProvider>,
        source: Arc<dyn IndicatorSource>,
        sessions: SessionStore,
    ) -> Result<Self> {
        let registry =
            Arc::new(ToolRegistry::new().with_tool(Arc::new(IndicatorTool::new(source)))?);

        let executor = AgentExecutor::builder()
            .provider(provider)
            .tool_registry(registry)
            .config(ExecutorConfig {
                max_iterations: config.max_iterations,
                model: config.model.clone(),
                system_prompt: Some(config.system_prompt.clone()),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            })
            .build()?;

        Ok(Self {
            executor,
            sessions,
            model: config.model,
        })
    }

    /// Report tool activity of every turn to `handler`
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.executor = self.executor.with_event_handler(handler);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one turn in `session_id` and return the final answer
    ///
    /// The session transcript is only updated when the turn succeeds.
    pub async fn ask(&self, session_id: &SessionId, query: &str) -> Result<String> {
        let history = self.sessions.history(session_id)?;
        info!(
            session_id = %session_id,
            history_len = history.len(),
            query_len = query.len(),
            "Starting turn"
        );

        let outcome = self.executor.run_with_history(history, query).await?;

        info!(
            session_id = %session_id,
            iterations = outcome.iterations,
            total_tokens = outcome.usage.total(),
            "Turn completed"
        );

        self.sessions.commit(session_id, outcome.conversation)?;
        Ok(outcome.response)
    }
}

#[async_trait]
impl Agent for StockAgent {
    async fn process(&self, input: String, context: &mut Context) -> agent_core::Result<String> {
        let session_id = context.session_id().map(SessionId::from).ok_or_else(|| {
            agent_core::Error::ProcessingFailed("context carries no session id".to_string())
        })?;

        self.ask(&session_id, &input).await.map_err(Into::into)
    }

    fn name(&self) -> &str {
        "stock_agent"
    }
}

/// Answer `query` in conversation `thread_id` with the given model and key
///
/// Indicators come from the default market and conversation state lives in
/// the process-wide store, so repeated calls with the same `thread_id`
/// continue the same conversation.
pub async fn run_stock_agent(
    model_name: &str,
    api_key: &str,
    thread_id: &str,
    query: &str,
) -> Result<String> {
    let config = AgentConfig::new(model_name, ApiKey::from(api_key))?;
    let source = Arc::new(TradingViewClient::new(MarketConfig::default()));
    let agent = StockAgent::new(config, source, default_sessions())?;
    agent.ask(&SessionId::from(thread_id), query).await
}

/// [`run_stock_agent`] for synchronous callers
///
/// Must not be called from inside a tokio runtime.
pub fn run_stock_agent_blocking(
    model_name: &str,
    api_key: &str,
    thread_id: &str,
    query: &str,
) -> Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| StockError::Other(format!("failed to start runtime: {e}")))?;
    runtime.block_on(run_stock_agent(model_name, api_key, thread_id, query))
}
