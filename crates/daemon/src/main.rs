use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketron_core::{
    build_registries, load_config, validate_config, Executor, JiraTracker, RunCaches, Timeframe,
    TrackerApi,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TICKETRON_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Starting ticketron");
    info!("Tracker URL: {}", config.tracker.url);
    info!("Run interval: {}s", config.execution.interval_secs);

    let tracker: Arc<dyn TrackerApi> = Arc::new(
        JiraTracker::new(config.tracker.clone()).context("Failed to create tracker client")?,
    );
    let caches = Arc::new(RunCaches::new());
    let registries = build_registries(&config, Arc::clone(&caches));
    let executor = Executor::new(
        config.debug.clone(),
        registries,
        Arc::clone(&tracker),
        caches,
    );

    let interval = Duration::from_secs(config.execution.interval_secs);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // Each run covers (last_run, now]; an aborted run leaves last_run in
    // place so the next run re-covers the same window.
    let mut last_run = Utc::now();
    let mut retry_tickets: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_signal() => {
                info!("Shutdown signal received, stopping");
                break;
            }
        }

        let now = Utc::now();
        let timeframe = Timeframe::new(last_run, now);

        let result = executor.execute(&timeframe, &retry_tickets).await;
        if result.successful {
            info!(
                timeframe = %timeframe,
                failed = result.failed_tickets.len(),
                "Run finished"
            );
            last_run = now;
            retry_tickets = result.failed_tickets;
        } else {
            error!(timeframe = %timeframe, "Run aborted, keeping timeframe for next run");
            // An aborted run does not consume retry attempts: the existing
            // retry set is kept, so a ticket that failed again during the
            // abort gets another chance when the window is re-covered.
            retry_tickets.extend(result.failed_tickets);
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
