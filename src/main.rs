//! RDAP Exporter Binary Entry Point
//!
//! This binary runs the polling scheduler and the scrape endpoint.
//! Core functionality is provided by the `rdap_exporter` library crate.

use clap::Parser;
use prometheus::Registry;
use rdap_exporter::{
    collector::{DEFAULT_SHUTDOWN_TIMEOUT, Scheduler},
    config::{AppConfig, DEFAULT_CONFIG_FILE, parse_duration},
    server::{AppState, create_router},
    storage::MetricStore,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RDAP Exporter - Domain Registration Metrics
#[derive(Parser, Debug)]
#[command(name = "rdap-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_FILE,
        env = "RDAP_EXPORTER_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "RDAP_EXPORTER_BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "RDAP_EXPORTER_PORT")]
    port: Option<u16>,

    /// Interval between collection rounds, e.g. `60` or `5m` (overrides config file)
    #[arg(long, env = "RDAP_EXPORTER_CHECK_INTERVAL", value_parser = parse_duration)]
    check_interval: Option<Duration>,

    /// Per-lookup timeout, e.g. `30` or `30s` (overrides config file)
    #[arg(long, env = "RDAP_EXPORTER_TIMEOUT", value_parser = parse_duration)]
    timeout: Option<Duration>,
}

impl Cli {
    /// Apply CLI/env overrides (CLI > ENV > config file).
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(interval) = self.check_interval {
            config.rdap.check_interval = interval;
        }
        if let Some(timeout) = self.timeout {
            config.rdap.timeout = timeout;
        }
    }
}

fn startup_banner() -> String {
    format!(
        "RDAP Exporter v{} - Domain Registration Metrics",
        env!("CARGO_PKG_VERSION")
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rdap_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("{}", startup_banner());

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    cli.apply_overrides(&mut config);
    config.validate()?;

    tracing::info!(
        "Server: {}:{}, Domains: {}, Interval: {}",
        config.server.bind,
        config.server.port,
        config.domains.len(),
        humantime::format_duration(config.rdap.check_interval),
    );

    // Metric store and registry
    let registry = Registry::new();
    let store = MetricStore::new()?;
    store.register(&registry)?;

    // Collection engine
    let scheduler = Scheduler::from_config(&config.rdap, config.domains.clone(), store.clone())?;
    let cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler.run(cancel.clone()));

    let app = create_router(AppState { registry, store });

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    // Server errors also stop collection.
    cancel.cancel();

    tracing::info!("Shutting down collection scheduler...");
    match tokio::time::timeout(DEFAULT_SHUTDOWN_TIMEOUT * 2, scheduler_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Collection scheduler task failed: {}", e),
        Err(_) => tracing::warn!("Collection scheduler did not stop in time"),
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel collection.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }

    cancel.cancel();
}
