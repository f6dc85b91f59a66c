use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::adapters::{LogNotifier, Notifier, SlackNotifier, WebhookNotifier};
use crate::config::{AppConfig, NotifierConfig, NotifierKind};
use crate::domain::Thresholds;
use crate::error::{Result, SentinelError};
use crate::services::{replay_lines, ReplayReport};
use crate::strategy::SignalDetector;

#[derive(Parser)]
#[command(name = "rsi-sentinel")]
#[command(version)]
#[command(about = "RSI / Stochastic RSI zone alerts for Binance klines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path; without it config/default.toml, the SENTINEL_ENV
    /// file and SENTINEL__* variables are layered
    #[arg(short, long, env = "SENTINEL_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream klines and send zone alerts (default)
    Run,
    /// Feed recorded kline JSON (one message per line) through the detector
    Replay {
        /// File with one kline message per line
        file: String,
        /// Override the indicator period
        #[arg(long)]
        period: Option<usize>,
        /// Override the oversold threshold
        #[arg(long)]
        oversold: Option<f64>,
        /// Override the overbought threshold
        #[arg(long)]
        overbought: Option<f64>,
        /// Only print signals
        #[arg(short, long)]
        quiet: bool,
    },
    /// Send one test message through the configured notifier
    TestNotify {
        /// Message text
        #[arg(short, long, default_value = "🔔 rsi-sentinel test notification")]
        message: String,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::load_file(path)?,
            None => AppConfig::load()?,
        };
        config
            .validate()
            .map_err(|errors| SentinelError::InvalidConfig(errors.join("; ")))?;
        Ok(config)
    }
}

/// Build the configured notifier.
///
/// Missing credentials fall back to logging so a misconfigured deployment
/// still runs and says why.
pub fn build_notifier(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match config.kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Slack => match SlackNotifier::from_env(&config.channel, config.timeout()) {
            Some(slack) => Arc::new(slack),
            None => {
                warn!("SLACK_TOKEN not set, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        },
        NotifierKind::Webhook => {
            match WebhookNotifier::from_env(config.webhook_format, config.timeout()) {
                Some(webhook) => Arc::new(webhook),
                None => {
                    warn!("SENTINEL_WEBHOOK_URL not set, notifications will only be logged");
                    Arc::new(LogNotifier)
                }
            }
        }
    }
}

/// Apply replay overrides on top of the loaded detector settings
pub fn replay_detector(
    config: &AppConfig,
    period: Option<usize>,
    oversold: Option<f64>,
    overbought: Option<f64>,
) -> Result<SignalDetector> {
    let mut detector = config.detector_config();
    if let Some(period) = period {
        detector.indicator.period = period;
    }
    detector.thresholds = Thresholds::new(
        oversold.unwrap_or(detector.thresholds.oversold),
        overbought.unwrap_or(detector.thresholds.overbought),
    )?;
    SignalDetector::new(detector)
}

pub fn run_replay(detector: &mut SignalDetector, path: &Path, quiet: bool) -> Result<ReplayReport> {
    let file = File::open(path)?;
    let report = replay_lines(detector, BufReader::new(file))?;

    println!("Replaying {} with {}\n", path.display(), detector.indicator_label());
    for step in &report.steps {
        if let Some(signal) = &step.signal {
            println!("  line {:>5}  \x1b[1m{}\x1b[0m", step.line, signal.message());
        } else if !quiet && step.is_closed {
            match step.reading {
                Some(reading) => {
                    println!("  line {:>5}  close {:>12.4}  reading {:>6.2}", step.line, step.close, reading)
                }
                None => println!("  line {:>5}  close {:>12.4}  warming up", step.line, step.close),
            }
        }
    }

    println!(
        "\n{} closed candles, {} signals, {} skipped lines, final state {}",
        detector.window().total_closed(),
        report.signals().count(),
        report.skipped_lines,
        detector.zone_state()
    );
    Ok(report)
}

pub async fn test_notify(notifier: &dyn Notifier, message: &str) -> Result<()> {
    print!("  Sending via {}... ", notifier.name());
    stdout().flush()?;
    match notifier.send_message(message).await {
        Ok(()) => {
            println!("\x1b[32mOK\x1b[0m");
            Ok(())
        }
        Err(e) => {
            println!("\x1b[31mFAILED\x1b[0m");
            println!("    Error: {}", e);
            Err(e)
        }
    }
}
