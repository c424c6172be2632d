//! webqueue server

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webqueue_api::{AppState, routes};
use webqueue_config::{LogFormat, SystemConfig, load_system_config};
use webqueue_core::DelayExecutor;
use webqueue_scheduler::{Scheduler, Worker};

#[derive(Parser)]
#[command(name = "webqueue-server")]
#[command(about = "Durable single-worker job queue over HTTP", long_about = None)]
struct Args {
    /// Port to listen on (same as --port)
    #[arg(value_name = "PORT")]
    port_arg: Option<u16>,

    /// Path to a KDL configuration file
    #[arg(long, env = "WEBQUEUE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "WEBQUEUE_PORT")]
    port: Option<u16>,

    /// Path of the queue ledger document
    #[arg(long, env = "WEBQUEUE_LEDGER")]
    ledger: Option<PathBuf>,

    /// Root directory for job result records
    #[arg(long, env = "WEBQUEUE_RESULTS")]
    results: Option<PathBuf>,

    /// Duration of each job's placeholder execution step, in milliseconds
    #[arg(long, env = "WEBQUEUE_DELAY_MS")]
    delay_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<SystemConfig> {
        let mut config = match &self.config {
            Some(path) => load_system_config(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?,
            None => SystemConfig::default(),
        };

        if let Some(port) = self.port.or(self.port_arg) {
            config.port = port;
        }
        if let Some(ledger) = self.ledger {
            config.ledger_path = ledger;
        }
        if let Some(results) = self.results {
            config.results_dir = results;
        }
        if let Some(ms) = self.delay_ms {
            config.execution_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_tracing(config.log_format);

    info!(
        ledger = %config.ledger_path.display(),
        results = %config.results_dir.display(),
        "Opening scheduler"
    );
    let scheduler = Scheduler::open(&config.ledger_path, &config.results_dir)
        .await
        .context("Failed to load queue ledger")?;
    let scheduler = Arc::new(scheduler);

    // Start the worker
    let shutdown = CancellationToken::new();
    let executor = Arc::new(DelayExecutor::new(config.execution_delay));
    let worker = Worker::new(scheduler.clone(), executor).spawn(shutdown.clone());

    // Build router
    let app = routes::router(AppState::new(scheduler)).layer(TraceLayer::new_for_http());

    // Start server
    let host = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid listen host: {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, waiting for worker");
    shutdown.cancel();
    worker.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Received ctrl-c, shutting down");
}
