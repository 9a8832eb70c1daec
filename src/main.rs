//! quiet-hn: binary entrypoint.
//! Loads configuration, starts the background refresh loop and serves the
//! cached front page over Axum.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quiet_hn::cache::refresh::{report_exit, spawn_invalidator};
use quiet_hn::config::{Cli, Settings};
use quiet_hn::metrics::Metrics;
use quiet_hn::{api, AppState, HnClient, Refresher, Snapshot};

/// Logs go to stdout; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quiet_hn=info,tower_http=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    info!(
        port = settings.port,
        num_stories = settings.refresh.target,
        source = %settings.base_url,
        "starting quiet-hn"
    );

    let client = HnClient::new(&settings.base_url, settings.request_timeout)
        .context("building hacker news client")?;

    // Recorder first, so the refresh task's metric descriptions land in it.
    let metrics = Metrics::init(settings.refresh.target)?;

    // Served snapshot: starts empty, shared by the refresh loop and the handlers.
    let served = Arc::new(Snapshot::new());
    let refresh = Refresher::new(Arc::new(client), served.clone(), settings.refresh).spawn();
    tokio::spawn(report_exit(refresh, "refresh"));
    if let Some(every) = settings.invalidate_after {
        tokio::spawn(report_exit(spawn_invalidator(served.clone(), every), "invalidator"));
    }

    let app = api::router(AppState::new(served)).merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;
    Ok(())
}
