use std::collections::VecDeque;

/// Bounded ring buffer of closing prices.
///
/// Sized to the oscillator's lookback so memory stays constant however long
/// the stream runs. `total_closed` keeps counting after old closes are evicted.
#[derive(Debug, Clone)]
pub struct ClosingPriceWindow {
    closes: VecDeque<f64>,
    capacity: usize,
    total_closed: u64,
}

impl ClosingPriceWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
            total_closed: 0,
        }
    }

    /// Append a close, returning the evicted oldest one when full
    pub fn push(&mut self, close: f64) -> Option<f64> {
        let evicted = if self.closes.len() == self.capacity {
            self.closes.pop_front()
        } else {
            None
        };
        self.closes.push_back(close);
        self.total_closed += 1;
        evicted
    }

    /// Closes currently retained
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Closed candles seen since construction, including evicted ones
    pub fn total_closed(&self) -> u64 {
        self.total_closed
    }

    /// Get the most recent close
    pub fn latest(&self) -> Option<f64> {
        self.closes.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.closes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Drop all retained closes and free the buffer
    pub fn release(&mut self) {
        self.closes = VecDeque::new();
    }
}
