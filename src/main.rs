use clap::Parser;
use rsi_sentinel::cli::{self, Cli, Commands};
use rsi_sentinel::error::Result;
use rsi_sentinel::logging::{init_logging, init_logging_simple};
use rsi_sentinel::Sentinel;
use std::path::Path;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Replay {
            file,
            period,
            oversold,
            overbought,
            quiet,
        }) => {
            init_logging_simple();
            let config = cli.load_config()?;
            let mut detector = cli::replay_detector(&config, *period, *oversold, *overbought)?;
            cli::run_replay(&mut detector, Path::new(file), *quiet)?;
        }
        Some(Commands::TestNotify { message }) => {
            init_logging_simple();
            let config = cli.load_config()?;
            let notifier = cli::build_notifier(&config.notifier);
            cli::test_notify(notifier.as_ref(), message).await?;
        }
        Some(Commands::Run) | None => {
            run_sentinel(&cli).await?;
        }
    }

    Ok(())
}

async fn run_sentinel(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    let _guard = init_logging(&config.logging);

    info!("Starting rsi-sentinel {}", env!("CARGO_PKG_VERSION"));
    let notifier = cli::build_notifier(&config.notifier);
    info!("Notifier: {}", notifier.name());

    let report = Sentinel::new(config, notifier)
        .run(shutdown_signal())
        .await?;

    info!(
        "Shutdown complete: {} closed candles, {} signals, {} reconnects, {} dropped notifications",
        report.closed_candles, report.signals, report.reconnects, report.dropped_notifications
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
