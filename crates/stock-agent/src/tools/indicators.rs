//! Tool returning technical-indicator snapshots for a batch of symbols

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::api::{INDICATOR_KEYS, IndicatorSource, IndicatorValues};

/// Name the model calls the tool by
pub const INDICATOR_TOOL_NAME: &str = "get_stock_indicators";

/// Indicators of one symbol, or why they could not be retrieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolSnapshot {
    Indicators(BTreeMap<String, f64>),
    Error { error: String },
}

impl SymbolSnapshot {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Input symbol, exactly as given, to its snapshot
pub type IndicatorBatch = BTreeMap<String, SymbolSnapshot>;

#[derive(Debug, Deserialize)]
struct IndicatorParams {
    symbols: Vec<String>,
}

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Keep allow-listed, finite values, rounded
fn snapshot(values: &IndicatorValues) -> BTreeMap<String, f64> {
    INDICATOR_KEYS
        .iter()
        .filter_map(|key| {
            values
                .get(*key)
                .filter(|v| v.is_finite())
                .map(|v| ((*key).to_string(), round1(*v)))
        })
        .collect()
}

/// Fetches indicator snapshots through an `IndicatorSource`
pub struct IndicatorTool {
    source: Arc<dyn IndicatorSource>,
}

impl IndicatorTool {
    pub fn new(source: Arc<dyn IndicatorSource>) -> Self {
        Self { source }
    }

    /// Fetch every symbol in turn; a failing symbol does not affect the others
    pub async fn lookup(&self, symbols: &[String]) -> IndicatorBatch {
        let mut batch = IndicatorBatch::new();

        for symbol in symbols {
            if batch.contains_key(symbol) {
                continue;
            }
            let normalized = symbol.trim().to_lowercase();
            let start = Instant::now();

            let entry = match self.source.fetch(&normalized).await {
                Ok(values) => {
                    let indicators = snapshot(&values);
                    debug!(
                        symbol = %normalized,
                        indicators = indicators.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Indicators fetched"
                    );
                    SymbolSnapshot::Indicators(indicators)
                }
                Err(e) => {
                    warn!(symbol = %normalized, error = %e, "Indicator retrieval failed");
                    SymbolSnapshot::Error {
                        error: e.to_string(),
                    }
                }
            };
            batch.insert(symbol.clone(), entry);
        }

        batch
    }
}

#[async_trait]
impl Tool for IndicatorTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: IndicatorParams = serde_json::from_value(params).map_err(|e| {
            agent_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;
        if params.symbols.is_empty() {
            return Err(agent_core::Error::ProcessingFailed(
                "Invalid parameters: symbols must not be empty".to_string(),
            ));
        }

        let batch = self.lookup(&params.symbols).await;
        serde_json::to_value(batch).map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))
    }

    fn name(&self) -> &str {
        INDICATOR_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get the latest technical indicators (price, RSI, MACD, stochastics, ADX, CCI, \
         momentum, EMAs, SMAs, Bollinger bands and classic monthly pivots) for one or \
         more stock symbols. Call this before analysing any stock."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "symbols": schema::array(
                    "Stock ticker symbols on the configured exchange (e.g. 'TCS', 'RELIANCE')",
                    schema::string("Ticker symbol"),
                )
            }),
            vec!["symbols"],
        )
    }
}
