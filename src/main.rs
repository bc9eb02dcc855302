use std::sync::Arc;

use anyhow::{Context, Result};
use break_tracker::Tracker;
use breakwatch::{Config, Provider, SharedTracker, poller, router};
use realtime::{Clock, SystemClock};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};
use transloc_feed::Sampler;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default().with(filter).with(fmt::layer()).init();

    let config = Config::from_env()?;
    info!(
        listen_addr = %config.listen_addr,
        feed_url = %config.feed.url,
        poll_interval = ?config.tracker.poll_interval,
        break_threshold = ?config.tracker.break_threshold,
        exclusion_zones = config.tracker.exclusion_zones.len(),
        "Starting breakwatch"
    );

    let provider = Provider::new(config.feed.timeout)?;
    let sampler = Sampler::new(config.feed.clone(), Arc::new(provider));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tracker: SharedTracker = Arc::new(Tracker::new(config.tracker.clone(), clock));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = tokio::spawn(poller::run(
        sampler,
        Arc::clone(&tracker),
        config.tracker.poll_interval,
        shutdown_rx,
    ));

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Query API listening");

    axum::serve(listener, router(tracker))
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("serving query API")?;

    ticker.await.context("joining poller")?;
    info!("Shutdown complete");

    Ok(())
}

// Waits for Ctrl-C, then tells the tick loop to stop.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.send_replace(true);
}
