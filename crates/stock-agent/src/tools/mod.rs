//! Tools exposed to the stock agent

pub mod indicators;

pub use indicators::{INDICATOR_TOOL_NAME, IndicatorBatch, IndicatorTool, SymbolSnapshot};
