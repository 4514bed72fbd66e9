//! Configuration for the stock agent

use crate::error::{Result, StockError};
use crate::prompts;
use agent_llm::providers::{DEFAULT_TIMEOUT_SECS, ProviderKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// TradingView scanner endpoint
pub const DEFAULT_SCANNER_URL: &str = "https://scanner.tradingview.com";

/// Candle interval the indicators are computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Interval {
    /// Suffix appended to scanner column names; daily columns carry none
    pub fn column_suffix(self) -> &'static str {
        match self {
            Self::OneMinute => "|1",
            Self::FiveMinutes => "|5",
            Self::FifteenMinutes => "|15",
            Self::ThirtyMinutes => "|30",
            Self::OneHour => "|60",
            Self::TwoHours => "|120",
            Self::FourHours => "|240",
            Self::OneDay => "",
            Self::OneWeek => "|1W",
            Self::OneMonth => "|1M",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = StockError;

    /// `m` is minutes and `M` is months, so matching is case-sensitive
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1m" => Ok(Self::OneMinute),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "30m" => Ok(Self::ThirtyMinutes),
            "1h" => Ok(Self::OneHour),
            "2h" => Ok(Self::TwoHours),
            "4h" => Ok(Self::FourHours),
            "1d" => Ok(Self::OneDay),
            "1W" | "1w" => Ok(Self::OneWeek),
            "1M" => Ok(Self::OneMonth),
            other => Err(StockError::ConfigError(format!("Unknown interval: {other}"))),
        }
    }
}

/// Where indicator snapshots are fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Exchange prefix of scanner tickers
    pub exchange: String,
    /// Scanner market path segment
    pub screener: String,
    pub interval: Interval,
    pub scanner_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            exchange: "NSE".to_string(),
            screener: "india".to_string(),
            interval: Interval::OneDay,
            scanner_url: DEFAULT_SCANNER_URL.to_string(),
        }
    }
}

impl MarketConfig {
    pub fn validate(&self) -> Result<()> {
        if self.exchange.trim().is_empty() {
            return Err(StockError::ConfigError("exchange must not be empty".to_string()));
        }
        if self.screener.trim().is_empty() {
            return Err(StockError::ConfigError("screener must not be empty".to_string()));
        }
        if !(self.scanner_url.starts_with("http://") || self.scanner_url.starts_with("https://")) {
            return Err(StockError::ConfigError(format!(
                "scanner_url must be an http(s) URL: {}",
                self.scanner_url
            )));
        }
        Ok(())
    }
}

/// LLM API credential; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Everything needed to run one agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub api_key: ApiKey,
    pub system_prompt: String,
    /// Base URL for OpenAI-compatible endpoints
    pub api_base: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    pub max_iterations: usize,
    pub timeout_secs: u64,
}

impl AgentConfig {
    /// Validated config with the default prompt for the default market
    pub fn new(model: impl Into<String>, api_key: impl Into<ApiKey>) -> Result<Self> {
        Self::builder(model, api_key).build()
    }

    pub fn builder(model: impl Into<String>, api_key: impl Into<ApiKey>) -> AgentConfigBuilder {
        AgentConfigBuilder {
            model: model.into(),
            api_key: api_key.into(),
            system_prompt: None,
            market: MarketConfig::default(),
            api_base: None,
            max_tokens: 4096,
            temperature: None,
            max_iterations: 10,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn provider_kind(&self) -> ProviderKind {
        ProviderKind::for_model(&self.model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StockError::ConfigError("model name must not be empty".to_string()));
        }
        if self.api_key.is_blank() {
            return Err(StockError::ConfigError("API key must not be empty".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(StockError::ConfigError(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for AgentConfig
#[derive(Debug)]
pub struct AgentConfigBuilder {
    model: String,
    api_key: ApiKey,
    system_prompt: Option<String>,
    market: MarketConfig,
    api_base: Option<String>,
    max_tokens: usize,
    temperature: Option<f32>,
    max_iterations: usize,
    timeout_secs: u64,
}

impl AgentConfigBuilder {
    /// Use a fixed prompt instead of rendering the template
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Market the rendered prompt refers to
    pub fn market(mut self, market: &MarketConfig) -> Self {
        self.market = market.clone();
        self
    }

    pub fn api_base(mut self, api_base: Option<String>) -> Self {
        self.api_base = api_base.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AgentConfig> {
        let system_prompt = match self.system_prompt {
            Some(prompt) => prompt,
            None => prompts::system_prompt(&self.market)?,
        };

        let config = AgentConfig {
            model: self.model.trim().to_string(),
            api_key: self.api_key,
            system_prompt,
            api_base: self.api_base,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            max_iterations: self.max_iterations,
            timeout_secs: self.timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Application configuration: market plus LLM settings
#[derive(Debug, Clone, Default)]
pub struct StockConfig {
    pub market: MarketConfig,
    pub model: Option<String>,
    pub api_key: Option<ApiKey>,
    pub api_base: Option<String>,
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup
    ///
    /// The API key falls back to the provider-specific variable matching the
    /// model, then to the other one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut market = MarketConfig::default();
        if let Some(exchange) = var("STOCK_AGENT_EXCHANGE") {
            market.exchange = exchange;
        }
        if let Some(screener) = var("STOCK_AGENT_SCREENER") {
            market.screener = screener;
        }
        if let Some(interval) = var("STOCK_AGENT_INTERVAL") {
            market.interval = interval.parse()?;
        }

        let model = var("STOCK_AGENT_MODEL");
        let kind = ProviderKind::for_model(model.as_deref().unwrap_or(DEFAULT_MODEL));
        let fallbacks = match kind {
            ProviderKind::Anthropic => ["ANTHROPIC_API_KEY", "OPENAI_API_KEY"],
            ProviderKind::OpenAI => ["OPENAI_API_KEY", "ANTHROPIC_API_KEY"],
        };
        let api_key = var("STOCK_AGENT_API_KEY")
            .or_else(|| fallbacks.iter().find_map(|key| var(*key)))
            .map(ApiKey::from);

        let config = Self {
            market,
            model,
            api_key,
            api_base: var("OPENAI_API_BASE"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.market.validate()?;
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(StockError::ConfigError("model name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Agent settings for this configuration; fails without an API key
    pub fn agent_config(&self) -> Result<AgentConfig> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            StockError::ConfigError(
                "no API key: set STOCK_AGENT_API_KEY or pass --api-key".to_string(),
            )
        })?;

        AgentConfig::builder(self.model(), api_key)
            .market(&self.market)
            .api_base(self.api_base.clone())
            .build()
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    base: StockConfig,
}

impl StockConfigBuilder {
    /// Start from an existing configuration, e.g. one read from the environment
    pub fn from_config(config: StockConfig) -> Self {
        Self { base: config }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.base.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<ApiKey>) -> Self {
        self.base.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.base.api_base = Some(api_base.into());
        self
    }

    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.base.market.exchange = exchange.into();
        self
    }

    pub fn screener(mut self, screener: impl Into<String>) -> Self {
        self.base.market.screener = screener.into();
        self
    }

    pub fn interval(mut self, interval: Interval) -> Self {
        self.base.market.interval = interval;
        self
    }

    pub fn scanner_url(mut self, url: impl Into<String>) -> Self {
        self.base.market.scanner_url = url.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        self.base.validate()?;
        Ok(self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_market() {
        let market = MarketConfig::default();
        assert_eq!(market.exchange, "NSE");
        assert_eq!(market.screener, "india");
        assert_eq!(market.interval, Interval::OneDay);
        assert!(market.validate().is_ok());
    }

    #[test]
    fn test_interval_suffixes() {
        assert_eq!(Interval::OneDay.column_suffix(), "");
        assert_eq!(Interval::OneHour.column_suffix(), "|60");
        assert_eq!(Interval::OneWeek.column_suffix(), "|1W");
        assert_eq!("1M".parse::<Interval>().unwrap(), Interval::OneMonth);
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::OneMinute);
        assert!("3d".parse::<Interval>().is_err());
    }

    #[test]
    fn test_agent_config_validation() {
        assert!(AgentConfig::new("gpt-4o", "sk-test").is_ok());
        assert!(matches!(
            AgentConfig::new("  ", "sk-test"),
            Err(StockError::ConfigError(_))
        ));
        assert!(matches!(
            AgentConfig::new("gpt-4o", " "),
            Err(StockError::ConfigError(_))
        ));
        assert!(
            AgentConfig::builder("gpt-4o", "sk-test")
                .max_iterations(0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_agent_config_renders_prompt_for_market() {
        let market = MarketConfig {
            exchange: "NASDAQ".to_string(),
            ..MarketConfig::default()
        };
        let config = AgentConfig::builder("claude-sonnet-4-5", "key")
            .market(&market)
            .build()
            .unwrap();
        assert!(config.system_prompt.contains("NASDAQ"));
        assert_eq!(config.provider_kind(), ProviderKind::Anthropic);
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = AgentConfig::new("gpt-4o", "sk-secret-value").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = StockConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert!(config.agent_config().is_err());
    }

    #[test]
    fn test_from_lookup_values() {
        let config = StockConfig::from_lookup(lookup(&[
            ("STOCK_AGENT_MODEL", "claude-haiku-4-5"),
            ("ANTHROPIC_API_KEY", "ant-key"),
            ("OPENAI_API_KEY", "oai-key"),
            ("STOCK_AGENT_EXCHANGE", "BSE"),
            ("STOCK_AGENT_INTERVAL", "1h"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_ref().map(ApiKey::expose), Some("ant-key"));
        assert_eq!(config.market.exchange, "BSE");
        assert_eq!(config.market.interval, Interval::OneHour);

        let agent = config.agent_config().unwrap();
        assert_eq!(agent.model, "claude-haiku-4-5");
    }

    #[test]
    fn test_explicit_key_wins() {
        let config = StockConfig::from_lookup(lookup(&[
            ("STOCK_AGENT_API_KEY", "explicit"),
            ("OPENAI_API_KEY", "oai-key"),
            ("OPENAI_API_BASE", "http://localhost:1234/v1"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_ref().map(ApiKey::expose), Some("explicit"));
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:1234/v1"));
    }

    #[test]
    fn test_invalid_interval_from_env() {
        let result = StockConfig::from_lookup(lookup(&[("STOCK_AGENT_INTERVAL", "7x")]));
        assert!(matches!(result, Err(StockError::ConfigError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = StockConfig::builder()
            .model("gpt-4o")
            .api_key("k")
            .exchange("NASDAQ")
            .screener("america")
            .build()
            .unwrap();
        assert_eq!(config.market.screener, "america");

        assert!(StockConfig::builder().exchange("").build().is_err());
        assert!(StockConfig::builder().scanner_url("ftp://x").build().is_err());
    }
}
