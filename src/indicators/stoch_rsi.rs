use std::collections::VecDeque;

use super::{Oscillator, Rsi};

/// Stochastic RSI: the RSI rescaled against its own recent range.
///
/// `%K = 100 * (rsi - min) / (max - min)` over the last `fastk_period` RSI
/// values, `%D` is the simple mean of the last `fastd_period` `%K` values. The
/// reading is `%K`, emitted once `%D` is also defined. When the RSI range is
/// degenerate `%K` falls back to the RSI value itself.
#[derive(Debug, Clone)]
pub struct StochRsi {
    rsi: Rsi,
    fastk_period: usize,
    fastd_period: usize,
    rsi_values: VecDeque<f64>,
    k_values: VecDeque<f64>,
    k: Option<f64>,
    d: Option<f64>,
}

const RANGE_EPSILON: f64 = 1e-12;

impl StochRsi {
    pub fn new(period: usize, fastk_period: usize, fastd_period: usize) -> Self {
        let fastk_period = fastk_period.max(1);
        let fastd_period = fastd_period.max(1);
        Self {
            rsi: Rsi::new(period),
            fastk_period,
            fastd_period,
            rsi_values: VecDeque::with_capacity(fastk_period),
            k_values: VecDeque::with_capacity(fastd_period),
            k: None,
            d: None,
        }
    }

    pub fn fast_k(&self) -> Option<f64> {
        self.k
    }

    pub fn fast_d(&self) -> Option<f64> {
        self.d
    }

    pub fn rsi(&self) -> Option<f64> {
        self.rsi.current()
    }
}

fn push_bounded(buf: &mut VecDeque<f64>, cap: usize, value: f64) {
    if buf.len() == cap {
        buf.pop_front();
    }
    buf.push_back(value);
}

impl Oscillator for StochRsi {
    fn update(&mut self, close: f64) -> Option<f64> {
        let rsi = self.rsi.update(close)?;

        push_bounded(&mut self.rsi_values, self.fastk_period, rsi);
        if self.rsi_values.len() < self.fastk_period {
            return None;
        }

        let (min, max) = self
            .rsi_values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        let k = if range <= RANGE_EPSILON {
            rsi
        } else {
            100.0 * (rsi - min) / range
        };

        push_bounded(&mut self.k_values, self.fastd_period, k);
        self.k = Some(k);
        if self.k_values.len() < self.fastd_period {
            return None;
        }

        self.d = Some(self.k_values.iter().sum::<f64>() / self.fastd_period as f64);
        Some(k)
    }

    fn current(&self) -> Option<f64> {
        self.d.and(self.k)
    }

    fn secondary(&self) -> Option<f64> {
        self.d
    }

    fn period(&self) -> usize {
        self.rsi.period()
    }

    fn lookback(&self) -> usize {
        self.rsi.period() + (self.fastk_period - 1) + (self.fastd_period - 1)
    }

    fn label(&self) -> String {
        format!(
            "StochRSI({},{},{})",
            self.rsi.period(),
            self.fastk_period,
            self.fastd_period
        )
    }

    fn reset(&mut self) {
        *self = Self::new(self.rsi.period(), self.fastk_period, self.fastd_period);
    }
}
