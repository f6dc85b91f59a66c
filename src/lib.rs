pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod services;
pub mod strategy;

pub use config::AppConfig;
pub use domain::{PriceCandle, Signal, SignalKind, Thresholds, Zone, ZoneState};
pub use error::{Result, SentinelError};
pub use indicators::{IndicatorConfig, IndicatorKind, Oscillator};
pub use services::Sentinel;
pub use strategy::{AlertPolicy, DetectorConfig, SignalDetector};
