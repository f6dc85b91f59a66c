use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Zone;

/// What kind of zone transition a signal reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    EnteredOverbought,
    EnteredOversold,
    ReturnedToNeutral,
}

impl SignalKind {
    pub fn zone(&self) -> Zone {
        match self {
            SignalKind::EnteredOverbought => Zone::Overbought,
            SignalKind::EnteredOversold => Zone::Oversold,
            SignalKind::ReturnedToNeutral => Zone::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::EnteredOverbought => "ENTERED_OVERBOUGHT",
            SignalKind::EnteredOversold => "ENTERED_OVERSOLD",
            SignalKind::ReturnedToNeutral => "RETURNED_TO_NEUTRAL",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A zone notification produced by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub zone: Zone,
    pub reading: f64,
    pub close: f64,
    pub symbol: Option<String>,
    /// Indicator label, e.g. "RSI(6)" or "StochRSI(14,5,3)"
    pub indicator: String,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// Chat text for this signal. Reading and price are always two decimals.
    pub fn message(&self) -> String {
        let symbol = self.symbol.as_deref().unwrap_or("market");
        match self.kind {
            SignalKind::EnteredOverbought => format!(
                "🔴 {} {} is OVERBOUGHT, good moment for short | {}: {:.2}, price ${:.2}",
                symbol, self.indicator, self.indicator, self.reading, self.close
            ),
            SignalKind::EnteredOversold => format!(
                "🟢 {} {} is OVERSOLD, good moment for long | {}: {:.2}, price ${:.2}",
                symbol, self.indicator, self.indicator, self.reading, self.close
            ),
            SignalKind::ReturnedToNeutral => format!(
                "⚪ {} {} entered the NEUTRAL zone | {}: {:.2}, price ${:.2}",
                symbol, self.indicator, self.indicator, self.reading, self.close
            ),
        }
    }
}
