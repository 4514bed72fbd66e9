//! Stock agent CLI
//!
//! # Usage
//!
//! ```bash
//! export STOCK_AGENT_MODEL="claude-sonnet-4-5"
//! export ANTHROPIC_API_KEY="..."
//!
//! stock-agent price AAPL
//! stock-agent indicators TCS INFY
//! stock-agent ask "Should I buy TCS?"
//! stock-agent chat
//! ```

use agent_runtime::ExecutorEventHandler;
use agent_utils::AppConfig;
use anyhow::Context as _;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use stock_agent::{
    IndicatorTool, SessionId, SessionStore, StockAgent, StockConfig, TradingViewClient,
    YahooFinanceClient,
};
use stock_agent::config::StockConfigBuilder;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-agent")]
#[command(about = "Trading signals from technical indicators, explained by an LLM", long_about = None)]
struct Args {
    /// Model name; `claude*` models use Anthropic, others an OpenAI-compatible API
    #[arg(long, global = true)]
    model: Option<String>,

    /// API key for the model provider
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Exchange the symbols trade on
    #[arg(long, global = true)]
    exchange: Option<String>,

    /// Scanner market
    #[arg(long, global = true)]
    screener: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the latest price of a symbol
    Price { symbol: String },
    /// Print the indicator snapshot the agent would see
    Indicators {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Ask a single question on a fresh session
    Ask { query: String },
    /// Interactive conversation
    Chat,
}

impl Args {
    /// Configuration from `lookup` with command-line overrides applied
    fn stock_config<F>(&self, lookup: F) -> anyhow::Result<StockConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = StockConfig::from_lookup(lookup).context("invalid configuration")?;
        let mut builder = StockConfigBuilder::from_config(base);
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key.as_str());
        }
        if let Some(base) = &self.api_base {
            builder = builder.api_base(base);
        }
        if let Some(exchange) = &self.exchange {
            builder = builder.exchange(exchange);
        }
        if let Some(screener) = &self.screener {
            builder = builder.screener(screener);
        }
        let config = builder.build().context("invalid configuration")?;
        info!(
            model = %config.model(),
            exchange = %config.market.exchange,
            screener = %config.market.screener,
            "Loaded configuration"
        );
        Ok(config)
    }
}

/// Tells the chat user which symbols are being looked up
struct Progress;

#[async_trait]
impl ExecutorEventHandler for Progress {
    async fn on_tool_start(&self, _id: &str, _name: &str, input: &Value) {
        if let Some(symbols) = input.get("symbols").and_then(Value::as_array) {
            let symbols: Vec<&str> = symbols.iter().filter_map(Value::as_str).collect();
            eprintln!("(fetching indicators for {})", symbols.join(", "));
        }
    }
}

fn build_agent(config: &StockConfig) -> anyhow::Result<StockAgent> {
    let agent_config = config.agent_config()?;
    let source = Arc::new(TradingViewClient::new(config.market.clone()));
    Ok(StockAgent::new(agent_config, source, SessionStore::new())?)
}

async fn price(symbol: &str) {
    if symbol.trim().is_empty() {
        return;
    }
    match YahooFinanceClient::new().latest_price(symbol).await {
        Ok(quote) => println!("{} price: {}", quote.symbol, quote.price),
        Err(e) => {
            info!(error = %e, "Price lookup failed");
            println!("Unable to get price for '{symbol}'");
        }
    }
}

async fn indicators(config: &StockConfig, symbols: &[String]) -> anyhow::Result<()> {
    let tool = IndicatorTool::new(Arc::new(TradingViewClient::new(config.market.clone())));
    let batch = tool.lookup(symbols).await;
    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}

async fn chat(agent: &StockAgent) -> anyhow::Result<()> {
    let mut session = SessionId::generate();
    println!("Stock agent ({}), session {session}", agent.model());
    println!("Type /reset to start over, /exit to quit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                agent.sessions().evict(&session)?;
                session = SessionId::generate();
                println!("New session {session}\n");
                continue;
            }
            _ => {}
        }

        match agent.ask(&session, input).await {
            Ok(response) => println!("{response}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = AppConfig::from_env("stock-agent", "STOCK_AGENT")?;
    agent_utils::init_tracing_with(&app);

    let args = Args::parse();
    info!(command = ?args.command, "Starting stock-agent");
    run(&args, |key| std::env::var(key).ok()).await
}

async fn run<F>(args: &Args, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match &args.command {
        // Price lookups need neither a model nor a market
        Command::Price { symbol } => price(symbol).await,
        Command::Indicators { symbols } => indicators(&args.stock_config(lookup)?, symbols).await?,
        Command::Ask { query } => {
            let agent = build_agent(&args.stock_config(lookup)?)?;
            let response = agent.ask(&SessionId::generate(), query).await?;
            println!("{response}");
        }
        Command::Chat => {
            let agent =
                build_agent(&args.stock_config(lookup)?)?.with_event_handler(Arc::new(Progress));
            chat(&agent).await?;
        }
    }

    Ok(())
}
