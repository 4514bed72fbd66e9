//! Stock trading-signal agent
//!
//! An LLM agent that answers trading questions about stocks. It has a single
//! tool, `get_stock_indicators`, which pulls technical-indicator snapshots
//! from the TradingView scanner, and it keeps a conversation per session id.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn demo() -> stock_agent::Result<()> {
//! let reply = stock_agent::run_stock_agent(
//!     "gpt-4o-mini",
//!     "sk-...",
//!     "thread-1",
//!     "Should I buy TCS?",
//! )
//! .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```
//!
//! For control over the market, the model provider or the session store,
//! build a [`StockAgent`] directly.

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod prompts;
pub mod signal;
pub mod tools;

pub use agent::{StockAgent, default_sessions, run_stock_agent, run_stock_agent_blocking};
pub use api::{IndicatorSource, PriceQuote, TradingViewClient, YahooFinanceClient};
pub use config::{AgentConfig, ApiKey, Interval, MarketConfig, StockConfig};
pub use error::{Result, StockError};
pub use signal::Signal;
pub use tools::{IndicatorBatch, IndicatorTool, SymbolSnapshot};

pub use agent_runtime::{SessionId, SessionStore};
