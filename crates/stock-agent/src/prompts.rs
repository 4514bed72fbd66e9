//! System prompt for the stock agent

use crate::config::MarketConfig;
use crate::error::Result;
use crate::signal::Signal;
use crate::tools::INDICATOR_TOOL_NAME;
use minijinja::{Environment, context};

const SYSTEM_TEMPLATE: &str = r"You are a stock market trading assistant for the {{ exchange }} exchange.
Technical indicators are computed on {{ interval }} candles.

Before you analyse any stock, call the `{{ tool }}` tool with the symbols involved.
Base your analysis on the indicators it returns. If a symbol comes back with an
error, tell the user that data for it could not be retrieved.

When the user asks for a trading signal:
- For a new position, answer with exactly one of: {{ new_signals | join(', ') }}.
  Include an entry price, a take-profit price and a stop-loss price.
- For a position the user already holds, answer with exactly one of: {{ existing_signals | join(', ') }}.
  Include the price range the call applies to.
Write the label exactly as shown, and mention no other label.

Explain your reasoning in short paragraphs or bullet points. Do not use tables
or any other tabular markdown.

You only answer questions about stocks, trading and finance. If the user asks
about anything else, politely decline and say what you can help with.";

/// Render the system prompt for `market`
pub fn system_prompt(market: &MarketConfig) -> Result<String> {
    let env = Environment::new();
    let new_signals: Vec<&str> = Signal::NEW_POSITION.iter().map(|s| s.as_str()).collect();
    let existing_signals: Vec<&str> = Signal::EXISTING_POSITION
        .iter()
        .map(|s| s.as_str())
        .collect();

    let rendered = env.render_str(
        SYSTEM_TEMPLATE,
        context! {
            exchange => market.exchange.to_uppercase(),
            interval => market.interval.as_str(),
            tool => INDICATOR_TOOL_NAME,
            new_signals => new_signals,
            existing_signals => existing_signals,
        },
    )?;
    Ok(rendered)
}
