//! Yahoo Finance price lookup

use crate::error::{Result, StockError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Latest traded price of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient;

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self
    }

    /// Trimmed, uppercased ticker; blank input is rejected
    pub fn normalize_symbol(symbol: &str) -> Result<String> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(StockError::InvalidSymbol(symbol.to_string()));
        }
        Ok(symbol.to_uppercase())
    }

    /// Latest daily close for `symbol`
    pub async fn latest_price(&self, symbol: &str) -> Result<PriceQuote> {
        let symbol = Self::normalize_symbol(symbol)?;

        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let response = provider
            .get_latest_quotes(&symbol, "1d")
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        debug!(%symbol, price = quote.close, "Fetched latest quote");

        Ok(PriceQuote {
            symbol,
            price: quote.close,
            timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0)
                .unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(YahooFinanceClient::normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(
            YahooFinanceClient::normalize_symbol("tcs.ns").unwrap(),
            "TCS.NS"
        );
        assert!(matches!(
            YahooFinanceClient::normalize_symbol("   "),
            Err(StockError::InvalidSymbol(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_symbol_skips_network() {
        let client = YahooFinanceClient::new();
        assert!(client.latest_price("").await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_latest_price() {
        let client = YahooFinanceClient::new();
        let quote = client.latest_price("aapl").await.unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert!(quote.price > 0.0);
    }
}
