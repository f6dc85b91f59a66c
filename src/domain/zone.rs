use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SentinelError};

/// Band an oscillator reading falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Overbought,
    Oversold,
    Neutral,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Overbought => "OVERBOUGHT",
            Zone::Oversold => "OVERSOLD",
            Zone::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Oversold/overbought bounds on the 0-100 oscillator scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Thresholds {
    pub fn new(oversold: f64, overbought: f64) -> Result<Self> {
        let thresholds = Self {
            oversold,
            overbought,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.oversold) || !(0.0..=100.0).contains(&self.overbought) {
            return Err(SentinelError::InvalidConfig(format!(
                "thresholds must lie within 0..=100 (oversold={}, overbought={})",
                self.oversold, self.overbought
            )));
        }
        if self.oversold >= self.overbought {
            return Err(SentinelError::InvalidConfig(format!(
                "oversold threshold {} must be below overbought threshold {}",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }

    /// Strict comparisons: a reading sitting exactly on a bound is neutral.
    pub fn classify(&self, reading: f64) -> Zone {
        if reading > self.overbought {
            Zone::Overbought
        } else if reading < self.oversold {
            Zone::Oversold
        } else {
            Zone::Neutral
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

/// Alerting state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneState {
    /// Neutral, and the return to neutral has already been announced
    NeutralIdle,
    /// Neutral band not yet announced; the next neutral reading alerts
    NeutralArmed,
    Overbought,
    Oversold,
}

impl ZoneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneState::NeutralIdle => "NEUTRAL_IDLE",
            ZoneState::NeutralArmed => "NEUTRAL_ARMED",
            ZoneState::Overbought => "OVERBOUGHT",
            ZoneState::Oversold => "OVERSOLD",
        }
    }

    /// True when a neutral reading should produce a "returned to neutral" alert
    pub fn is_armed(&self) -> bool {
        !matches!(self, ZoneState::NeutralIdle)
    }

    pub fn zone(&self) -> Zone {
        match self {
            ZoneState::NeutralIdle | ZoneState::NeutralArmed => Zone::Neutral,
            ZoneState::Overbought => Zone::Overbought,
            ZoneState::Oversold => Zone::Oversold,
        }
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_strict_bounds() {
        let t = Thresholds::new(20.0, 80.0).unwrap();
        assert_eq!(t.classify(80.01), Zone::Overbought);
        assert_eq!(t.classify(80.0), Zone::Neutral);
        assert_eq!(t.classify(50.0), Zone::Neutral);
        assert_eq!(t.classify(20.0), Zone::Neutral);
        assert_eq!(t.classify(19.99), Zone::Oversold);
        assert_eq!(t.classify(100.0), Zone::Overbought);
        assert_eq!(t.classify(0.0), Zone::Oversold);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        assert!(Thresholds::new(80.0, 20.0).is_err());
        assert!(Thresholds::new(50.0, 50.0).is_err());
        assert!(Thresholds::new(-1.0, 70.0).is_err());
        assert!(Thresholds::new(30.0, 101.0).is_err());
    }

    #[test]
    fn only_idle_is_disarmed() {
        assert!(!ZoneState::NeutralIdle.is_armed());
        assert!(ZoneState::NeutralArmed.is_armed());
        assert!(ZoneState::Overbought.is_armed());
        assert!(ZoneState::Oversold.is_armed());
        assert_eq!(ZoneState::NeutralArmed.zone(), Zone::Neutral);
    }
}
