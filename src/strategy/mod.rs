//! Strategy module
//!
//! Zone detection over a candle stream:
//! - `window` - bounded ring buffer of closing prices
//! - `detector` - oscillator reading, zone classification and alert state machine

pub mod detector;
pub mod window;

pub use detector::{AlertPolicy, DetectorConfig, Evaluation, SignalDetector};
pub use window::ClosingPriceWindow;
