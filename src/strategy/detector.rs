use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::domain::candle::validate_close;
use crate::domain::{PriceCandle, Signal, SignalKind, Thresholds, Zone, ZoneState};
use crate::error::{Result, SentinelError};
use crate::indicators::{IndicatorConfig, Oscillator};

use super::window::ClosingPriceWindow;

/// How often overbought/oversold alerts fire while the reading stays in zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Alert only when a zone is entered
    #[default]
    Edge,
    /// Alert on every closed candle inside the zone
    Repeat,
}

/// Detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub indicator: IndicatorConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub policy: AlertPolicy,
    /// Start armed so the first neutral reading after warm-up is announced
    #[serde(default)]
    pub arm_on_start: bool,
    /// Fallback symbol for candles that don't carry one
    #[serde(default)]
    pub symbol: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            indicator: IndicatorConfig::default(),
            thresholds: Thresholds::default(),
            policy: AlertPolicy::Edge,
            arm_on_start: false,
            symbol: None,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        self.indicator.validate()?;
        self.thresholds.validate()
    }
}

/// What the detector computed for one candle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Oscillator reading; `None` for open candles and during warm-up
    pub reading: Option<f64>,
    pub zone: Option<Zone>,
    pub signal: Option<Signal>,
}

/// Turns a candle stream into zone-transition signals.
///
/// One detector per stream subscription. It owns the price window and the
/// zone state; neither is reset by reconnects upstream.
#[derive(Debug)]
pub struct SignalDetector {
    config: DetectorConfig,
    oscillator: Box<dyn Oscillator>,
    window: ClosingPriceWindow,
    state: ZoneState,
    reading: Option<f64>,
    stopped: bool,
}

impl SignalDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let oscillator = config.indicator.build()?;
        let window = ClosingPriceWindow::new(oscillator.lookback() + 1);
        let state = if config.arm_on_start {
            ZoneState::NeutralArmed
        } else {
            ZoneState::NeutralIdle
        };

        debug!(
            "Signal detector created: {} thresholds={}/{} policy={:?} window_capacity={}",
            oscillator.label(),
            config.thresholds.oversold,
            config.thresholds.overbought,
            config.policy,
            window.capacity()
        );

        Ok(Self {
            config,
            oscillator,
            window,
            state,
            reading: None,
            stopped: false,
        })
    }

    /// Process one candle event, in arrival order.
    ///
    /// Returns at most one signal. Open candles and the warm-up phase produce
    /// nothing. A non-finite close is rejected before any state changes.
    pub fn on_candle(&mut self, candle: &PriceCandle) -> Result<Option<Signal>> {
        Ok(self.evaluate(candle)?.signal)
    }

    /// Like [`on_candle`](Self::on_candle), also reporting the reading and
    /// zone computed for this candle.
    pub fn evaluate(&mut self, candle: &PriceCandle) -> Result<Evaluation> {
        if self.stopped {
            return Err(SentinelError::DetectorStopped);
        }
        validate_close(candle.close)?;

        if !candle.is_closed {
            trace!("Ignoring open candle @ {:.2}", candle.close);
            return Ok(Evaluation::default());
        }

        self.window.push(candle.close);
        let reading = self.oscillator.update(candle.close);

        let closed = self.window.total_closed();
        if closed <= self.oscillator.period() as u64 {
            debug!(
                "Warm-up {}/{}: candle closed @ {:.2}",
                closed,
                self.oscillator.period() + 1,
                candle.close
            );
            return Ok(Evaluation::default());
        }

        let Some(reading) = reading else {
            debug!(
                "Candle closed @ {:.2}, {} not defined yet",
                candle.close,
                self.oscillator.label()
            );
            return Ok(Evaluation::default());
        };
        self.reading = Some(reading);

        let zone = self.config.thresholds.classify(reading);
        debug!(
            "Candle closed @ {:.2}: {}={:.2} secondary={:?} zone={}",
            candle.close,
            self.oscillator.label(),
            reading,
            self.oscillator.secondary(),
            zone
        );

        let signal = self.transition(zone).map(|kind| Signal {
            kind,
            zone,
            reading,
            close: candle.close,
            symbol: candle.symbol.clone().or_else(|| self.config.symbol.clone()),
            indicator: self.oscillator.label(),
            timestamp: candle.close_time.unwrap_or_else(Utc::now),
        });
        if let Some(signal) = &signal {
            info!(
                "Signal {}: {}={:.2} close={:.2}",
                signal.kind, signal.indicator, signal.reading, signal.close
            );
        }

        Ok(Evaluation {
            reading: Some(reading),
            zone: Some(zone),
            signal,
        })
    }

    /// Advance the zone state machine and decide whether to alert
    fn transition(&mut self, zone: Zone) -> Option<SignalKind> {
        use ZoneState::*;

        let repeat = self.config.policy == AlertPolicy::Repeat;
        let (next, kind) = match (zone, self.state) {
            (Zone::Overbought, Overbought) => {
                (Overbought, repeat.then_some(SignalKind::EnteredOverbought))
            }
            (Zone::Overbought, _) => (Overbought, Some(SignalKind::EnteredOverbought)),
            (Zone::Oversold, Oversold) => (Oversold, repeat.then_some(SignalKind::EnteredOversold)),
            (Zone::Oversold, _) => (Oversold, Some(SignalKind::EnteredOversold)),
            (Zone::Neutral, state) if state.is_armed() => {
                (NeutralIdle, Some(SignalKind::ReturnedToNeutral))
            }
            (Zone::Neutral, _) => (NeutralIdle, None),
        };

        if next != self.state {
            debug!("Zone state {} -> {}", self.state, next);
        }
        self.state = next;
        kind
    }

    /// Halt event acceptance and release the window
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.window.release();
        self.oscillator.reset();
        info!(
            "Signal detector stopped after {} closed candles",
            self.window.total_closed()
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Latest oscillator reading, if defined
    pub fn reading(&self) -> Option<f64> {
        self.reading
    }

    pub fn zone_state(&self) -> ZoneState {
        self.state
    }

    pub fn window(&self) -> &ClosingPriceWindow {
        &self.window
    }

    pub fn indicator_label(&self) -> String {
        self.oscillator.label()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
