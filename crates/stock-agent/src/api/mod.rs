//! Market data clients
//!
//! `IndicatorSource` is the seam the indicator tool talks to; the
//! TradingView scanner is its production implementation. Yahoo Finance is
//! only used for plain price lookups.

pub mod tradingview;
pub mod yahoo;

pub use tradingview::TradingViewClient;
pub use yahoo::{PriceQuote, YahooFinanceClient};

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Indicator name to raw value
pub type IndicatorValues = BTreeMap<String, f64>;

/// Indicators requested from the provider and reported to the model
pub const INDICATOR_KEYS: [&str; 27] = [
    // price
    "close",
    "open",
    "high",
    "low",
    "change",
    "volume",
    // momentum
    "RSI",
    "MACD.macd",
    "MACD.signal",
    "Stoch.K",
    "Stoch.D",
    "ADX",
    "CCI20",
    "Mom",
    // moving averages
    "EMA20",
    "EMA50",
    "EMA200",
    "SMA20",
    "SMA50",
    "SMA200",
    // volatility
    "BB.upper",
    "BB.lower",
    // classic monthly pivots
    "Pivot.M.Classic.S2",
    "Pivot.M.Classic.S1",
    "Pivot.M.Classic.Middle",
    "Pivot.M.Classic.R1",
    "Pivot.M.Classic.R2",
];

/// Provider of technical-indicator snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Latest indicator values for a lowercase symbol on the configured market
    async fn fetch(&self, symbol: &str) -> Result<IndicatorValues>;
}
