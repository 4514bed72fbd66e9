//! TradingView scanner client

use super::{INDICATOR_KEYS, IndicatorSource, IndicatorValues};
use crate::config::MarketConfig;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Scanner response body
#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    /// Ticker as `EXCHANGE:SYMBOL`
    s: String,
    /// Column values, in request order
    d: Vec<Option<f64>>,
}

/// Fetches indicator snapshots from the TradingView scanner
#[derive(Debug, Clone)]
pub struct TradingViewClient {
    client: Client,
    market: MarketConfig,
}

impl TradingViewClient {
    pub fn new(market: MarketConfig) -> Self {
        Self::with_client(Client::new(), market)
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(client: Client, market: MarketConfig) -> Self {
        Self { client, market }
    }

    pub fn market(&self) -> &MarketConfig {
        &self.market
    }

    fn scan_url(&self) -> String {
        format!(
            "{}/{}/scan",
            self.market.scanner_url.trim_end_matches('/'),
            self.market.screener
        )
    }

    fn ticker(&self, symbol: &str) -> String {
        format!(
            "{}:{}",
            self.market.exchange.to_uppercase(),
            symbol.to_uppercase()
        )
    }

    /// Column names with the interval suffix applied
    fn columns(&self) -> Vec<String> {
        let suffix = self.market.interval.column_suffix();
        INDICATOR_KEYS
            .iter()
            .map(|key| format!("{key}{suffix}"))
            .collect()
    }

    fn scan_request(&self, symbol: &str) -> Value {
        json!({
            "symbols": {
                "tickers": [self.ticker(symbol)],
                "query": { "types": [] }
            },
            "columns": self.columns(),
        })
    }

    /// Zip the first row back onto the un-suffixed keys, dropping nulls
    fn parse_scan(symbol: &str, response: ScanResponse) -> Result<IndicatorValues> {
        let row = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "Exchange or symbol not found".to_string(),
            })?;

        debug!(ticker = %row.s, columns = row.d.len(), "Scanner row received");

        Ok(INDICATOR_KEYS
            .iter()
            .zip(row.d)
            .filter_map(|(key, value)| value.map(|v| ((*key).to_string(), v)))
            .collect())
    }
}

#[async_trait]
impl IndicatorSource for TradingViewClient {
    async fn fetch(&self, symbol: &str) -> Result<IndicatorValues> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(StockError::InvalidSymbol(symbol.to_string()));
        }

        let url = self.scan_url();
        debug!(%url, ticker = %self.ticker(symbol), interval = %self.market.interval, "Requesting indicators");

        let response = self
            .client
            .post(&url)
            .json(&self.scan_request(symbol))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::ApiError(format!(
                "scanner returned HTTP {status}: {body}"
            )));
        }

        let scan: ScanResponse = response.json().await?;
        Self::parse_scan(symbol, scan)
    }
}
