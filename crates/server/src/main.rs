//! `keeper-server`: server binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing, optional OTLP export).
//! 3. Create the [`SessionStore`] and spawn its reaper.
//! 4. Build the Axum router over the in-memory repository.
//! 5. Serve plain HTTP, or HTTPS when a certificate is configured, until
//!    SIGINT or SIGTERM.
//! 6. Stop the reaper and flush telemetry.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use keeper_server::config::Config;
use keeper_server::secrets::MemoryRepository;
use keeper_server::server::{router, state::AppState, tls};
use keeper_server::session::{self, SessionStore};
use keeper_server::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %cfg.address,
        session_ttl_secs = cfg.session_ttl_secs,
        "keeper-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Sessions
    // -----------------------------------------------------------------------
    let shutdown = CancellationToken::new();
    let sessions = SessionStore::new(cfg.session_ttl());
    let reaper = session::reaper_task(
        sessions.clone(),
        cfg.session_reap_interval(),
        shutdown.child_token(),
    );

    // -----------------------------------------------------------------------
    // 4. Router
    // -----------------------------------------------------------------------
    let state = AppState::new(sessions, Arc::new(MemoryRepository::new()));
    let app = router::build(state);

    // -----------------------------------------------------------------------
    // 5. HTTP(S) server
    // -----------------------------------------------------------------------
    let listener = TcpListener::bind(&cfg.address)
        .await
        .with_context(|| format!("failed to bind {}", cfg.address))?;
    let local_addr = listener.local_addr()?;

    tokio::spawn(shutdown_signal(shutdown.clone()));

    match cfg.tls_paths() {
        Some((cert, key)) => {
            let tls_config = tls::load_server_config(&cert, &key)?;
            info!(addr = %local_addr, "listening (https)");
            tls::serve(listener, app, tls_config, shutdown.clone()).await?;
        }
        None => {
            info!(addr = %local_addr, "listening (http)");
            let stop = shutdown.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await
                .context("HTTP server failed")?;
        }
    }

    // -----------------------------------------------------------------------
    // 6. Shutdown
    // -----------------------------------------------------------------------
    shutdown.cancel();
    reaper.await.context("session reaper panicked")?;
    telemetry::shutdown_telemetry();
    info!("keeper-server stopped");

    Ok(())
}

/// Cancel `shutdown` on SIGINT (Ctrl-C) or, on unix, SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
    shutdown.cancel();
}
