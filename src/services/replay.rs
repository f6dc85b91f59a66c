//! Offline replay of recorded kline messages through the detector.

use std::io::BufRead;
use tracing::warn;

use crate::adapters::parse_kline_message;
use crate::domain::Signal;
use crate::error::Result;
use crate::strategy::SignalDetector;

/// One accepted message and what the detector made of it
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    /// 1-based line number in the input
    pub line: usize,
    pub close: f64,
    pub is_closed: bool,
    /// Reading after this candle, when it was a closed candle past warm-up
    pub reading: Option<f64>,
    pub signal: Option<Signal>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    pub steps: Vec<ReplayStep>,
    pub skipped_lines: usize,
}

impl ReplayReport {
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.steps.iter().filter_map(|s| s.signal.as_ref())
    }

    pub fn readings(&self) -> Vec<Option<f64>> {
        self.steps
            .iter()
            .filter(|s| s.is_closed)
            .map(|s| s.reading)
            .collect()
    }
}

/// Feed newline-delimited kline JSON through `detector`.
///
/// Blank lines are ignored; malformed lines are logged and counted.
pub fn replay_lines<R: BufRead>(detector: &mut SignalDetector, reader: R) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let candle = match parse_kline_message(&line) {
            Ok(candle) => candle,
            Err(e) => {
                warn!("Skipping line {}: {}", line_no, e);
                report.skipped_lines += 1;
                continue;
            }
        };

        let eval = detector.evaluate(&candle)?;

        report.steps.push(ReplayStep {
            line: line_no,
            close: candle.close,
            is_closed: candle.is_closed,
            reading: eval.reading,
            signal: eval.signal,
        });
    }

    Ok(report)
}
