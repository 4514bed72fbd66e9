//! Trading signal labels

use crate::error::StockError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of labels the agent answers trading questions with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
    Hold,
    ProfitBook,
    PartialProfitBook,
}

impl Signal {
    /// Labels for opening a new position
    pub const NEW_POSITION: [Signal; 5] = [
        Signal::StrongBuy,
        Signal::Buy,
        Signal::Neutral,
        Signal::Sell,
        Signal::StrongSell,
    ];

    /// Labels for an existing position
    pub const EXISTING_POSITION: [Signal; 3] =
        [Signal::Hold, Signal::ProfitBook, Signal::PartialProfitBook];

    pub fn all() -> impl Iterator<Item = Signal> {
        Self::NEW_POSITION
            .into_iter()
            .chain(Self::EXISTING_POSITION)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Neutral => "NEUTRAL",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
            Self::Hold => "HOLD",
            Self::ProfitBook => "PROFIT_BOOK",
            Self::PartialProfitBook => "PARTIAL_PROFIT_BOOK",
        }
    }

    pub fn is_new_position(self) -> bool {
        Self::NEW_POSITION.contains(&self)
    }

    /// Distinct labels mentioned in `text`, in order of first appearance
    ///
    /// A label only counts when it is a whole word, and longer labels are
    /// matched first: `STRONG_BUY` does not also yield `BUY`, and
    /// `PARTIAL_PROFIT_BOOK` does not also yield `PROFIT_BOOK`.
    pub fn extract(text: &str) -> Vec<Signal> {
        let mut labels: Vec<Signal> = Self::all().collect();
        labels.sort_by_key(|s| std::cmp::Reverse(s.as_str().len()));

        let bytes = text.as_bytes();
        let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        let mut found: Vec<(usize, Signal)> = Vec::new();
        let mut taken = vec![false; bytes.len()];

        for label in labels {
            let needle = label.as_str();
            for (start, _) in text.match_indices(needle) {
                let end = start + needle.len();
                let bounded = (start == 0 || !is_word(bytes[start - 1]))
                    && (end == bytes.len() || !is_word(bytes[end]));
                if !bounded || taken[start..end].iter().any(|t| *t) {
                    continue;
                }
                taken[start..end].iter_mut().for_each(|t| *t = true);
                found.push((start, label));
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        let mut signals = Vec::new();
        for (_, signal) in found {
            if !signals.contains(&signal) {
                signals.push(signal);
            }
        }
        signals
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::all()
            .find(|signal| signal.as_str() == normalized)
            .ok_or_else(|| StockError::Other(format!("Unknown signal label: {s}")))
    }
}
