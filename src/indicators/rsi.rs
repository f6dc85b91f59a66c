use super::Oscillator;

/// Relative Strength Index with Wilder's smoothing.
///
/// The first reading is produced after `period + 1` closes: the average gain
/// and loss are seeded with the simple mean of the first `period` changes and
/// smoothed with factor `1/period` afterwards. The result is identical to
/// recomputing over the full history on every close.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    /// Changes accumulated while seeding
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
    value: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            value: None,
        }
    }

    pub fn avg_gain(&self) -> f64 {
        self.avg_gain
    }

    pub fn avg_loss(&self) -> f64 {
        self.avg_loss
    }
}

/// No downward movement saturates to 100 instead of dividing by zero.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

impl Oscillator for Rsi {
    fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let p = self.period as f64;

        if self.changes < self.period {
            // Seeding: accumulate sums, divide once the first period is complete
            self.avg_gain += gain;
            self.avg_loss += loss;
            self.changes += 1;
            if self.changes < self.period {
                return None;
            }
            self.avg_gain /= p;
            self.avg_loss /= p;
        } else {
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        }

        let value = rsi_from_averages(self.avg_gain, self.avg_loss);
        self.value = Some(value);
        Some(value)
    }

    fn current(&self) -> Option<f64> {
        self.value
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn label(&self) -> String {
        format!("RSI({})", self.period)
    }

    fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(rsi: &mut Rsi, closes: &[f64]) -> Vec<Option<f64>> {
        closes.iter().map(|&c| rsi.update(c)).collect()
    }

    #[test]
    fn first_reading_after_period_plus_one() {
        let mut rsi = Rsi::new(3);
        let out = feed(&mut rsi, &[10.0, 11.0, 12.0]);
        assert!(out.iter().all(Option::is_none));
        assert!(rsi.update(13.0).is_some());
    }

    #[test]
    fn rising_prices_saturate_at_100() {
        let mut rsi = Rsi::new(14);
        let closes: Vec<f64> = (1..=40).map(|i| 100.0 + i as f64).collect();
        let last = feed(&mut rsi, &closes).into_iter().flatten().last().unwrap();
        assert_eq!(last, 100.0);
    }

    #[test]
    fn falling_prices_go_to_zero() {
        let mut rsi = Rsi::new(14);
        let closes: Vec<f64> = (1..=40).map(|i| 200.0 - i as f64).collect();
        let last = feed(&mut rsi, &closes).into_iter().flatten().last().unwrap();
        assert_eq!(last, 0.0);
    }

    #[test]
    fn flat_prices_have_no_downward_movement() {
        let mut rsi = Rsi::new(3);
        let out = feed(&mut rsi, &[10.0, 10.0, 10.0, 10.0]);
        assert_eq!(out[3], Some(100.0));
    }

    #[test]
    fn wilder_smoothing_matches_hand_computation() {
        let mut rsi = Rsi::new(3);
        let out = feed(&mut rsi, &[10.0, 10.0, 10.0, 10.0, 50.0, 90.0, 91.0, 92.0, 50.0]);

        // avg_gain walks 0 -> 13.33 -> 22.22 -> 15.15 -> 10.43 -> 6.95,
        // avg_loss stays 0 until the final -42 move: 42 / 3 = 14.
        assert!((rsi.avg_gain() - 6.9547).abs() < 1e-3);
        assert!((rsi.avg_loss() - 14.0).abs() < 1e-9);
        let last = out[8].unwrap();
        assert!((last - 33.19).abs() < 0.01, "got {last}");
    }

    #[test]
    fn mixed_series_stays_in_range() {
        let mut rsi = Rsi::new(5);
        let closes = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1, 45.9, 46.2];
        for value in feed(&mut rsi, &closes).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn reset_forgets_history() {
        let mut rsi = Rsi::new(2);
        feed(&mut rsi, &[1.0, 2.0, 3.0]);
        assert!(rsi.current().is_some());
        rsi.reset();
        assert!(rsi.current().is_none());
        assert!(rsi.update(5.0).is_none());
    }
}
