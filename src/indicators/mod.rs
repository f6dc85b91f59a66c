//! Momentum oscillators computed incrementally over closing prices.
//!
//! Each oscillator consumes one closed price at a time and keeps O(1) state,
//! so the detector never has to re-scan history.

pub mod rsi;
pub mod stoch_rsi;

pub use rsi::Rsi;
pub use stoch_rsi::StochRsi;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

/// Oscillator reading on a 0-100 scale
pub trait Oscillator: Send + std::fmt::Debug {
    /// Feed the next closing price. Returns the reading once defined.
    fn update(&mut self, close: f64) -> Option<f64>;

    /// Last reading, if any
    fn current(&self) -> Option<f64>;

    /// Smoothed companion value (e.g. StochRSI %D), for logging only
    fn secondary(&self) -> Option<f64> {
        None
    }

    /// Primary period; readings are never defined at or below this many closes
    fn period(&self) -> usize;

    /// Closes beyond the first needed before the first reading
    fn lookback(&self) -> usize;

    /// Short label used in notifications, e.g. "RSI(14)"
    fn label(&self) -> String;

    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    #[default]
    Rsi,
    StochRsi,
}

/// Oscillator selection and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default)]
    pub kind: IndicatorKind,
    /// RSI period (window/smoothing length)
    #[serde(default = "default_period")]
    pub period: usize,
    /// StochRSI: window of RSI values used for %K
    #[serde(default = "default_fastk_period")]
    pub fastk_period: usize,
    /// StochRSI: SMA length of %K giving %D
    #[serde(default = "default_fastd_period")]
    pub fastd_period: usize,
}

fn default_period() -> usize {
    14
}

fn default_fastk_period() -> usize {
    5
}

fn default_fastd_period() -> usize {
    3
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            kind: IndicatorKind::Rsi,
            period: default_period(),
            fastk_period: default_fastk_period(),
            fastd_period: default_fastd_period(),
        }
    }
}

impl IndicatorConfig {
    pub fn rsi(period: usize) -> Self {
        Self {
            kind: IndicatorKind::Rsi,
            period,
            ..Self::default()
        }
    }

    pub fn stoch_rsi(period: usize, fastk_period: usize, fastd_period: usize) -> Self {
        Self {
            kind: IndicatorKind::StochRsi,
            period,
            fastk_period,
            fastd_period,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(SentinelError::InvalidConfig(
                "indicator period must be at least 1".to_string(),
            ));
        }
        if self.kind == IndicatorKind::StochRsi && (self.fastk_period == 0 || self.fastd_period == 0)
        {
            return Err(SentinelError::InvalidConfig(
                "fastk_period and fastd_period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured oscillator
    pub fn build(&self) -> Result<Box<dyn Oscillator>> {
        self.validate()?;
        Ok(match self.kind {
            IndicatorKind::Rsi => Box::new(Rsi::new(self.period)),
            IndicatorKind::StochRsi => Box::new(StochRsi::new(
                self.period,
                self.fastk_period,
                self.fastd_period,
            )),
        })
    }
}
