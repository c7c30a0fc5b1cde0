//! metrod - a standalone metrics-exposition endpoint
//!
//! Usage:
//!     metrod [--config <path>]
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{error, info};

use metrod::config::{load_config, Config};
use metrod::registry::{LabelSet, Registry};
use metrod::server::ScrapeServer;
use metrod::util::{init_logging, ShutdownSignal};

/// A standalone metrics-exposition endpoint.
#[derive(Parser, Debug)]
#[command(name = "metrod")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults apply if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path).with_context(|| {
            format!("failed to load configuration from '{}'", path.display())
        })?,
        None => Config::default(),
    };

    // CLI overrides config
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log.level);

    init_logging(log_level, &config.log.format);

    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!("  Listen: {}", config.server.listen);
        println!("  Path:   {}", config.server.path);
        return Ok(());
    }

    info!(
        listen = %config.server.listen,
        path = %config.server.path,
        "metrod starting"
    );

    run(config)
}

/// Run the daemon with the given configuration.
fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config).await })
}

/// Async entry point for the daemon.
async fn run_async(config: Config) -> Result<()> {
    let shutdown = ShutdownSignal::new();

    // The registry is constructed once here and handed by reference to
    // every producer and to the scrape server; there is no hidden global.
    let registry = Arc::new(Registry::new());

    let start_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?;
    registry
        .set_gauge(
            "metrod_start_time_seconds",
            LabelSet::empty(),
            start_time.as_secs_f64(),
        )
        .context("failed to register start time gauge")?;

    let uptime_handle = tokio::spawn(uptime_producer(
        Arc::clone(&registry),
        shutdown.subscribe(),
    ));

    let server = ScrapeServer::new(
        config.server.listen,
        config.server.path,
        Arc::clone(&registry),
    );
    let server = server
        .bind()
        .await
        .with_context(|| format!("failed to bind scrape server on {}", config.server.listen))?;
    let server_handle = tokio::spawn(server.run(shutdown.subscribe()));

    info!("metrod is running");
    info!("press Ctrl+C to stop");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
    }

    shutdown.shutdown();

    let _ = uptime_handle.await;
    let _ = server_handle.await;

    info!("metrod shut down complete");
    Ok(())
}

/// Background producer refreshing the uptime gauge once a second.
async fn uptime_producer(
    registry: Arc<Registry>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let started = Instant::now();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                if let Err(e) = registry.set_gauge(
                    "metrod_uptime_seconds",
                    LabelSet::empty(),
                    started.elapsed().as_secs_f64(),
                ) {
                    error!(error = %e, "failed to update uptime gauge");
                    break;
                }
            }

            _ = shutdown.recv() => break,
        }
    }
}
