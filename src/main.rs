//! Vibrascope - triaxial vibration collector and analyzer
//!
//! # Usage
//!
//! ```bash
//! # Run the collector (ingestion, sample feed, HTTP API)
//! cargo run --release
//!
//! # Feed it simulated sensor data
//! cargo run --release --bin simulation -- --addr 127.0.0.1:9090
//!
//! # Fetch one 1024-sample window from the feed and print the analysis
//! cargo run --release -- analyze --endpoint 127.0.0.1:9091 --count 1024 --axis z
//! ```
//!
//! # Environment Variables
//!
//! - `VIBRASCOPE_CONFIG`: Path to a TOML config file
//! - `VIBRASCOPE_CORS_ORIGINS`: Comma-separated origins allowed by the HTTP API
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vibrascope::acquisition::WindowFetcher;
use vibrascope::api::{create_app, ApiState};
use vibrascope::config::VibrascopeConfig;
use vibrascope::pipeline::{IngestionService, SampleFeed, WindowBuffer};
use vibrascope::processing::analyze_window;
use vibrascope::types::Axis;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vibrascope")]
#[command(about = "Triaxial vibration collector with spectral, wavelet and statistical analysis")]
#[command(version)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the collector: ingestion listener, sample feed and HTTP API (default)
    Serve(ServeArgs),

    /// Fetch one window from a sample feed and print its analysis report
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Producer listener address (default from config: 0.0.0.0:9090)
    #[arg(long, value_name = "HOST:PORT")]
    ingest_addr: Option<String>,

    /// Sample feed listener address (default from config: 0.0.0.0:9091)
    #[arg(long, value_name = "HOST:PORT")]
    feed_addr: Option<String>,

    /// HTTP API address (default from config: 0.0.0.0:8080)
    #[arg(long, value_name = "HOST:PORT")]
    http_addr: Option<String>,

    /// Samples retained in the window buffer
    #[arg(long)]
    capacity: Option<usize>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Sample feed to read from
    #[arg(long, value_name = "HOST:PORT")]
    endpoint: Option<String>,

    /// Samples per window
    #[arg(long)]
    count: Option<usize>,

    /// Give up collecting after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Axis to analyze (x, y or z)
    #[arg(long)]
    axis: Option<Axis>,

    /// Sensor sampling rate in Hz
    #[arg(long)]
    sampling_rate: Option<f64>,

    /// Wavelet family (haar, db1, db2, db3, db4, sym4)
    #[arg(long)]
    wavelet: Option<String>,

    /// Wavelet decomposition levels
    #[arg(long)]
    levels: Option<usize>,

    /// Fail instead of analyzing a window that came back short
    #[arg(long)]
    require_full: bool,
}

// ============================================================================
// Supervisor
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    Ingestion,
    SampleFeed,
    HttpServer,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::Ingestion => write!(f, "Ingestion"),
            TaskName::SampleFeed => write!(f, "SampleFeed"),
            TaskName::HttpServer => write!(f, "HttpServer"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: TcpListener,
    state: ApiState,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, create_app(state))
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: All tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: Shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: Task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: Task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: Task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: All tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let the remaining tasks observe the cancellation and drain
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => info!("Supervisor: Task {} stopped", task_name),
            Ok(Err(e)) => warn!("Supervisor: Task ended with error during shutdown: {}", e),
            Err(e) => warn!("Supervisor: Task panicked during shutdown: {}", e),
        }
    }

    Ok(())
}

// ============================================================================
// Serve
// ============================================================================

async fn run_serve(
    mut config: VibrascopeConfig,
    args: ServeArgs,
    cancel_token: CancellationToken,
) -> Result<()> {
    if let Some(addr) = args.ingest_addr {
        config.network.ingest_addr = addr;
    }
    if let Some(addr) = args.feed_addr {
        config.network.feed_addr = addr;
    }
    if let Some(addr) = args.http_addr {
        config.network.http_addr = addr;
    }
    if let Some(capacity) = args.capacity {
        config.buffer.capacity = capacity;
    }
    config.validate()?;

    let buffer = Arc::new(WindowBuffer::new(config.buffer.capacity));
    let ingestion = IngestionService::new(Arc::clone(&buffer));
    let feed = SampleFeed::new(Arc::clone(&buffer), config.buffer.feed_backlog);

    let ingest_listener = TcpListener::bind(&config.network.ingest_addr)
        .await
        .with_context(|| format!("Failed to bind ingestion listener on {}", config.network.ingest_addr))?;
    let feed_listener = TcpListener::bind(&config.network.feed_addr)
        .await
        .with_context(|| format!("Failed to bind sample feed on {}", config.network.feed_addr))?;
    let http_listener = TcpListener::bind(&config.network.http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP API on {}", config.network.http_addr))?;

    info!(
        ingest = %config.network.ingest_addr,
        feed = %config.network.feed_addr,
        http = %config.network.http_addr,
        capacity = config.buffer.capacity,
        sampling_rate = config.analysis.sampling_rate,
        wavelet = %config.analysis.wavelet,
        levels = config.analysis.levels,
        "Vibrascope collector starting"
    );

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    let ingest_cancel = cancel_token.clone();
    let ingest_service = ingestion.clone();
    task_set.spawn(async move {
        info!("[Ingestion] Task starting");
        ingest_service.run(ingest_listener, ingest_cancel).await;
        Ok(TaskName::Ingestion)
    });

    let feed_cancel = cancel_token.clone();
    task_set.spawn(async move {
        info!("[SampleFeed] Task starting");
        feed.run(feed_listener, feed_cancel).await;
        Ok(TaskName::SampleFeed)
    });

    let state = ApiState::new(
        buffer,
        ingestion.stats(),
        config.analysis.clone(),
        config.fetch.target_count,
    );
    spawn_http_server(&mut task_set, http_listener, state, cancel_token.clone());

    run_supervisor(&mut task_set, cancel_token).await
}

// ============================================================================
// Analyze
// ============================================================================

async fn run_analyze(config: VibrascopeConfig, args: AnalyzeArgs) -> Result<()> {
    let mut analysis = config.analysis;
    if let Some(rate) = args.sampling_rate {
        analysis.sampling_rate = rate;
    }
    if let Some(wavelet) = args.wavelet {
        analysis.wavelet = wavelet;
    }
    if let Some(levels) = args.levels {
        analysis.levels = levels;
    }
    let axis = args.axis.unwrap_or(analysis.axis);
    let endpoint = args.endpoint.unwrap_or(config.fetch.endpoint);
    let count = args.count.unwrap_or(config.fetch.target_count);
    let timeout = Duration::from_millis(args.timeout_ms.unwrap_or(config.fetch.timeout_ms));

    let fetched = WindowFetcher::new(endpoint.as_str())
        .with_target_count(count)
        .with_timeout(timeout)
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch a window from {endpoint}"))?;

    if !fetched.is_complete() && args.require_full {
        anyhow::bail!(
            "Window incomplete: {} of {} samples ({:?})",
            fetched.window.len(),
            count,
            fetched.status
        );
    }

    let settings = analysis.settings();
    let report = tokio::task::spawn_blocking(move || {
        analyze_window(&fetched.window, axis, fetched.status, &settings)
    })
    .await
    .context("Analysis task failed")?;

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = VibrascopeConfig::load();

    match args.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Analyze(analyze_args) => run_analyze(config, analyze_args).await,
        Command::Serve(serve_args) => {
            // Graceful shutdown via Ctrl+C
            let cancel_token = CancellationToken::new();
            let shutdown_token = cancel_token.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received Ctrl+C, initiating shutdown...");
                shutdown_token.cancel();
            });

            run_serve(config, serve_args, cancel_token).await?;
            info!("Vibrascope shutdown complete");
            Ok(())
        }
    }
}
