//! Agent runtime
//!
//! `AgentExecutor` drives the model-directed tool-call loop for one turn and
//! hands back the resulting transcript. `SessionStore` keeps transcripts in
//! memory keyed by session id, so later turns continue the conversation.

pub mod executor;
pub mod session;

pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutorConfig, ExecutorEventHandler, NoOpEventHandler,
    TRUNCATED_RESPONSE, TurnOutcome,
};
pub use session::{Session, SessionId, SessionStore};
