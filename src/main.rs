use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use memq_engine::{ConcurrencyLimiter, EpisodeQueue, QueueRouter};
use memq_graph::HttpGraphTarget;
use memq_settings::MemqSettings;
use memq_telemetry::TelemetryConfig;

/// How long shutdown waits for running jobs before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Namespace-ordered episode ingestion queue.
#[derive(Debug, Parser)]
#[command(name = "memq", version)]
struct Cli {
    /// Settings file (default: ~/.memq/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Max job bodies executing at once, across all groups.
    #[arg(long)]
    semaphore_limit: Option<usize>,
}

impl Cli {
    fn apply(&self, settings: &mut MemqSettings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(limit) = self.semaphore_limit {
            settings.queue.semaphore_limit = limit;
        }
        settings.validate();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => memq_settings::load_settings_from_path(path),
        None => memq_settings::load_settings(),
    }
    .context("failed to load settings")?;
    cli.apply(&mut settings);

    let log_level = memq_telemetry::parse_level(&settings.logging.level).unwrap_or_else(|| {
        eprintln!("unknown log level {:?}, using info", settings.logging.level);
        tracing::Level::INFO
    });
    let telemetry = memq_telemetry::init_telemetry(TelemetryConfig {
        log_level,
        json: settings.logging.json,
    });

    tracing::info!(
        semaphore_limit = settings.queue.semaphore_limit,
        group_id = %settings.graph.group_id,
        endpoint = %settings.graph.endpoint,
        "starting memq"
    );

    let limiter = ConcurrencyLimiter::new(settings.queue.semaphore_limit)?;
    let router = QueueRouter::new(limiter, telemetry.metrics());
    let target = HttpGraphTarget::new(
        settings.graph.endpoint.clone(),
        Duration::from_millis(settings.graph.timeout_ms),
    )?;
    let episodes = EpisodeQueue::new(
        router.clone(),
        Arc::new(target),
        settings.graph.group_id.clone(),
    );

    let config = memq_server::ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
    };
    let handle = memq_server::start(config, memq_server::AppState { episodes })
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                settings.server.host, settings.server.port
            )
        })?;

    tracing::info!(port = handle.port, "memq ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    handle.shutdown().await;
    router.close();
    if tokio::time::timeout(DRAIN_TIMEOUT, router.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!("running jobs did not finish before the drain timeout");
    }
    let status = router.status();
    if status.total_depth() > 0 {
        tracing::warn!(pending = status.total_depth(), "exiting with jobs still queued");
    }
    Ok(())
}
