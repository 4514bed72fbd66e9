//! Agent executor for running the tool-call loop
//!
//! One turn works like this:
//! 1. Call the LLM with the conversation and the registered tools
//! 2. If it asks for tools, run them in order and append the results
//! 3. Repeat until the model stops asking for tools
//!
//! The model decides, at its own discretion, whether and how often tools are
//! invoked. The executor only enforces the iteration cap.

use agent_core::{Error, Result};
use agent_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, TokenUsage,
};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Final reply when the model ran out of tokens before writing any text
pub const TRUNCATED_RESPONSE: &str = "Response truncated due to token limit";

/// Callbacks fired while a turn executes
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _id: &str, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _id: &str,
        _name: &str,
        _result: std::result::Result<&Value, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the turn produces its final answer
    async fn on_complete(&self, _result: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of LLM round trips per turn
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gpt-4o-mini".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// Result of one completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Text of the last message in the conversation
    pub response: String,

    /// Full conversation after the turn, tool traffic included
    pub conversation: Vec<Message>,

    /// LLM round trips used
    pub iterations: usize,

    /// Token usage summed across round trips
    pub usage: TokenUsage,
}

/// Executes the LLM → tool calls → LLM loop
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Get the executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a turn on a fresh conversation
    pub async fn run(&self, user_message: impl Into<String>) -> Result<TurnOutcome> {
        self.run_with_history(Vec::new(), user_message).await
    }

    /// Run a turn that continues `history`
    pub async fn run_with_history(
        &self,
        history: Vec<Message>,
        user_message: impl Into<String>,
    ) -> Result<TurnOutcome> {
        let mut conversation = history;
        conversation.push(Message::user(user_message));
        self.run_conversation(conversation).await
    }

    /// Drive the loop until the model produces a final answer
    pub async fn run_conversation(&self, initial_conversation: Vec<Message>) -> Result<TurnOutcome> {
        let mut conversation = initial_conversation;
        let mut usage = TokenUsage::default();
        let tools = self.tool_registry.definitions();

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                model = %self.config.model,
                tool_count = tools.len(),
                history_len = conversation.len(),
                "Sending request to LLM"
            );

            let mut request_builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                request_builder = request_builder.system(system.clone());
            }
            if let Some(temperature) = self.config.temperature {
                request_builder = request_builder.temperature(temperature);
            }

            let response = self
                .provider
                .complete(request_builder.build())
                .await
                .map_err(|e| Error::Llm(Box::new(e)))?;
            usage += response.usage;

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            let message = response.message;
            conversation.push(message.clone());

            match response.stop_reason {
                StopReason::ToolUse if message.has_tool_uses() => {
                    let results = self.execute_tools(&message).await?;
                    info!(
                        result_count = results.len(),
                        "Tool execution completed, continuing agent loop"
                    );
                    conversation.push(Message::tool_results(results));
                }
                stop_reason => {
                    // Every tool_use must be answered by a tool_result in the next message
                    if message.has_tool_uses() {
                        warn!(?stop_reason, "Model stopped with unanswered tool calls");
                        return Err(Error::ProcessingFailed(format!(
                            "model stopped ({stop_reason:?}) before its tool calls could run"
                        )));
                    }
                    let mut text = message.text().unwrap_or_default();
                    match stop_reason {
                        StopReason::MaxTokens => {
                            warn!("Hit max tokens in LLM response");
                            if text.trim().is_empty() {
                                text = TRUNCATED_RESPONSE.to_string();
                                conversation.pop();
                                conversation.push(Message::assistant(text.clone()));
                            }
                        }
                        StopReason::ToolUse => warn!("ToolUse stop reason without tool calls"),
                        _ => {}
                    }
                    info!(
                        iteration,
                        response_length = text.len(),
                        total_tokens = usage.total(),
                        "Agent completed"
                    );
                    if let Some(handler) = &self.event_handler {
                        handler.on_complete(&text).await;
                    }
                    return Ok(TurnOutcome {
                        response: text,
                        conversation,
                        iterations: iteration,
                        usage,
                    });
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Max iterations reached, stopping"
        );
        Err(Error::MaxIterationsExceeded(self.config.max_iterations))
    }

    /// Run every tool call in `message`, in order; the first failure aborts the turn
    async fn execute_tools(&self, message: &Message) -> Result<Vec<ContentBlock>> {
        let mut results = Vec::new();

        for block in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            let input_preview: String = input.to_string().chars().take(500).collect();
            info!(tool_name = %name, tool_id = %id, input_preview = %input_preview, "Executing tool");

            if let Some(handler) = &self.event_handler {
                handler.on_tool_start(id, name, input).await;
            }

            let tool = self
                .tool_registry
                .get(name)
                .ok_or_else(|| Error::ToolNotFound(name.clone()))?;

            let start_time = Instant::now();
            let outcome = tool.execute(input.clone()).await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    let result_str = serde_json::to_string(&result)
                        .map_err(|e| Error::ProcessingFailed(e.to_string()))?;
                    debug!(
                        tool_name = %name,
                        duration_ms,
                        result_length = result_str.len(),
                        "Tool execution succeeded"
                    );
                    if let Some(handler) = &self.event_handler {
                        handler.on_tool_done(id, name, Ok(&result), duration_ms).await;
                    }
                    results.push(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: result_str,
                        is_error: None,
                    });
                }
                Err(e) => {
                    let error_str = e.to_string();
                    warn!(tool_name = %name, duration_ms, error = %e, "Tool execution failed");
                    if let Some(handler) = &self.event_handler {
                        handler.on_tool_done(id, name, Err(&error_str), duration_ms).await;
                    }
                    return Err(Error::ToolFailed {
                        name: name.clone(),
                        message: error_str,
                    });
                }
            }
        }

        Ok(results)
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        Ok(AgentExecutor {
            provider,
            tool_registry: self.tool_registry,
            config: self.config,
            event_handler: None,
        })
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::{CompletionResponse, LLMError};
    use agent_tools::Tool;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned responses and records every request
    struct ScriptedProvider {
        responses: Mutex<VecDeque<CompletionResponse>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LLMError::RequestFailed("script exhausted".to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct CountingTool {
        calls: AtomicUsize,
        seen: Mutex<Vec<Value>>,
        /// Calls from this index on fail
        fail_from: usize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        async fn execute(&self, params: Value) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(params.clone());
            if call >= self.fail_from {
                return Err(Error::ProcessingFailed("bad input".to_string()));
            }
            Ok(json!({"echo": params}))
        }

        fn name(&self) -> &str {
            "lookup"
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }
    }

    fn tool_response(id: &str, name: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: json!({"q": id}),
            }]),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage {
                input_tokens: 7,
                output_tokens: 3,
            },
        }
    }

    fn multi_tool_response(ids: &[&str], stop_reason: StopReason) -> CompletionResponse {
        let mut blocks = vec![ContentBlock::Text {
            text: "Checking both".to_string(),
        }];
        blocks.extend(ids.iter().map(|id| ContentBlock::ToolUse {
            id: id.to_string(),
            name: "lookup".to_string(),
            input: json!({"q": id}),
        }));
        CompletionResponse {
            message: Message::assistant_blocks(blocks),
            stop_reason,
            usage: TokenUsage::default(),
        }
    }

    fn executor_with(
        provider: Arc<ScriptedProvider>,
        tool: Arc<CountingTool>,
        max_iterations: usize,
    ) -> AgentExecutor {
        let registry = Arc::new(ToolRegistry::new().with_tool(tool).unwrap());
        AgentExecutor::builder()
            .provider(provider)
            .tool_registry(registry)
            .model("test-model")
            .system_prompt("Test prompt")
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    fn counting_tool(fail: bool) -> Arc<CountingTool> {
        failing_from(if fail { 0 } else { usize::MAX })
    }

    fn failing_from(fail_from: usize) -> Arc<CountingTool> {
        Arc::new(CountingTool {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            fail_from,
        })
    }

    fn result_ids(message: &Message) -> Vec<String> {
        match &message.content {
            Some(agent_llm::MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_direct_answer_without_tools() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("Hello")]));
        let tool = counting_tool(false);
        let executor = executor_with(provider.clone(), tool.clone(), 5);

        let outcome = executor.run("Hi").await.unwrap();
        assert_eq!(outcome.response, "Hello");
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.conversation.len(), 2);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].system.as_deref(), Some("Test prompt"));
        assert_eq!(requests[0].tools.as_ref().unwrap()[0].name, "lookup");
    }

    #[tokio::test]
    async fn test_model_driven_tool_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_response("t1", "lookup"),
            tool_response("t2", "lookup"),
            text_response("Done"),
        ]));
        let tool = counting_tool(false);
        let executor = executor_with(provider.clone(), tool.clone(), 5);

        let outcome = executor.run("Go").await.unwrap();
        assert_eq!(outcome.response, "Done");
        assert_eq!(outcome.iterations, 3);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
        // user, (assistant tool_use, tool result) x2, assistant
        assert_eq!(outcome.conversation.len(), 6);
        assert_eq!(outcome.usage.total(), 10 + 10 + 15);

        // The second request already carries the first tool result
        let requests = provider.requests.lock().unwrap();
        let second = &requests[1].messages;
        assert!(matches!(
            second.last().and_then(|m| m.content.clone()),
            Some(agent_llm::MessageContent::Blocks(blocks))
                if matches!(&blocks[0], ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "t1")
        ));
    }

    #[tokio::test]
    async fn test_parallel_tool_calls_answered_together() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            multi_tool_response(&["t1", "t2"], StopReason::ToolUse),
            text_response("Both fetched"),
        ]));
        let tool = counting_tool(false);
        let executor = executor_with(provider.clone(), tool.clone(), 5);

        let outcome = executor.run("TCS and INFY").await.unwrap();
        assert_eq!(outcome.response, "Both fetched");
        assert_eq!(
            *tool.seen.lock().unwrap(),
            vec![json!({"q": "t1"}), json!({"q": "t2"})]
        );
        // user, assistant with two tool_use blocks, one tool results message, assistant
        assert_eq!(outcome.conversation.len(), 4);
        assert_eq!(result_ids(&outcome.conversation[2]), vec!["t1", "t2"]);

        let requests = provider.requests.lock().unwrap();
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, agent_llm::Role::User);
        assert_eq!(result_ids(last), vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_second_tool_failure_aborts_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            multi_tool_response(&["t1", "t2", "t3"], StopReason::ToolUse),
            text_response("unreachable"),
        ]));
        let tool = failing_from(1);
        let executor = executor_with(provider.clone(), tool.clone(), 5);

        let err = executor.run("Go").await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed { name, .. } if name == "lookup"));
        // t3 never runs and the model is not called again
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_tool_call_is_an_error() {
        for stop_reason in [StopReason::MaxTokens, StopReason::StopSequence] {
            let provider = Arc::new(ScriptedProvider::new(vec![multi_tool_response(
                &["t1"],
                stop_reason,
            )]));
            let tool = counting_tool(false);
            let executor = executor_with(provider, tool.clone(), 5);

            let err = executor.run("Go").await.unwrap_err();
            assert!(matches!(err, Error::ProcessingFailed(ref msg) if msg.contains("tool calls")));
            assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_empty_truncated_reply_gets_notice() {
        let provider = Arc::new(ScriptedProvider::new(vec![CompletionResponse {
            message: Message::assistant_blocks(vec![]),
            stop_reason: StopReason::MaxTokens,
            usage: TokenUsage::default(),
        }]));
        let executor = executor_with(provider, counting_tool(false), 5);

        let outcome = executor.run("Go").await.unwrap();
        assert_eq!(outcome.response, TRUNCATED_RESPONSE);
        assert_eq!(
            outcome.conversation.last().and_then(Message::text).as_deref(),
            Some(TRUNCATED_RESPONSE)
        );
    }

    #[tokio::test]
    async fn test_partial_truncated_reply_is_kept() {
        let provider = Arc::new(ScriptedProvider::new(vec![CompletionResponse {
            message: Message::assistant("TCS looks"),
            stop_reason: StopReason::MaxTokens,
            usage: TokenUsage::default(),
        }]));
        let executor = executor_with(provider, counting_tool(false), 5);

        assert_eq!(executor.run("Go").await.unwrap().response, "TCS looks");
    }

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ExecutorEventHandler for RecordingHandler {
        async fn on_tool_start(&self, id: &str, name: &str, _input: &Value) {
            self.events.lock().unwrap().push(format!("start:{name}:{id}"));
        }

        async fn on_tool_done(
            &self,
            id: &str,
            _name: &str,
            result: std::result::Result<&Value, &str>,
            _duration_ms: u64,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{id}:{}", result.is_ok()));
        }

        async fn on_complete(&self, result: &str) {
            self.events.lock().unwrap().push(format!("complete:{result}"));
        }
    }

    #[tokio::test]
    async fn test_event_handler_sees_tool_lifecycle() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_response("t1", "lookup"),
            text_response("Done"),
        ]));
        let handler = Arc::new(RecordingHandler::default());
        let executor =
            executor_with(provider, counting_tool(false), 5).with_event_handler(handler.clone());

        executor.run("Go").await.unwrap();
        assert_eq!(
            *handler.events.lock().unwrap(),
            vec!["start:lookup:t1", "done:t1:true", "complete:Done"]
        );
    }

    #[tokio::test]
    async fn test_noop_handler() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("ok")]));
        let executor = executor_with(provider, counting_tool(false), 1)
            .with_event_handler(Arc::new(NoOpEventHandler));
        assert_eq!(executor.run("hi").await.unwrap().response, "ok");
        assert_eq!(executor.config().max_iterations, 1);
    }

    #[tokio::test]
    async fn test_history_is_continued() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("Second")]));
        let executor = executor_with(provider.clone(), counting_tool(false), 5);

        let history = vec![Message::user("First"), Message::assistant("Reply")];
        let outcome = executor.run_with_history(history, "Again").await.unwrap();
        assert_eq!(outcome.conversation.len(), 4);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[0].messages[0].text().as_deref(), Some("First"));
    }

    #[tokio::test]
    async fn test_tool_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![tool_response("t1", "lookup")]));
        let executor = executor_with(provider, counting_tool(true), 5);

        let err = executor.run("Go").await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed { name, .. } if name == "lookup"));
    }

    #[tokio::test]
    async fn test_unknown_tool_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![tool_response("t1", "nope")]));
        let executor = executor_with(provider, counting_tool(false), 5);

        let err = executor.run("Go").await.unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_response("t1", "lookup"),
            tool_response("t2", "lookup"),
        ]));
        let executor = executor_with(provider, counting_tool(false), 2);

        let err = executor.run("Loop").await.unwrap_err();
        assert!(matches!(err, Error::MaxIterationsExceeded(2)));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let executor = executor_with(provider, counting_tool(false), 2);

        let err = executor.run("Hi").await.unwrap_err();
        assert!(err.to_string().contains("script exhausted"));
        match err {
            Error::Llm(source) => assert!(matches!(
                source.downcast_ref::<LLMError>(),
                Some(LLMError::RequestFailed(_))
            )),
            other => panic!("expected an LLM error, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            AgentExecutorBuilder::new().build(),
            Err(Error::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_tokens, 4096);
    }
}
