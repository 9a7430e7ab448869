/**
 * TRAFFIC STEERING XAPP - entry point
 *
 * Wires config, logging, the xApp core, the optional MQTT bridge and the
 * HTTP surface, then waits for Ctrl-C / SIGTERM and shuts down gracefully.
 *
 * Everything RIC-facing is simulated: the E2 indication layout is a
 * placeholder, control requests are logged, and the "AI/ML" strategy is a
 * set of thresholds.
 */

mod a1;
mod clock;
mod config;
mod control;
mod e2;
mod error;
mod health;
mod http;
mod models;
mod mqtt;
mod retry;
mod rmr;
mod state;
mod steering;
mod xapp;

use crate::config::{load_config, XAppConfig};
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::xapp::{TrafficSteeringXApp, XAPP_NAME, XAPP_VERSION};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // RUST_LOG wins, then LOG_LEVEL=DEBUG
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match std::env::var("LOG_LEVEL").as_deref() {
            Ok("DEBUG") => "debug",
            _ => "info",
        };
        EnvFilter::new(level)
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().with_current_span(true).init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

async fn run(cfg: XAppConfig, xapp: Arc<TrafficSteeringXApp>) -> Result<()> {
    let shutdown = CancellationToken::new();

    let bridge = cfg
        .mqtt
        .clone()
        .map(|conf| mqtt::spawn_rmr_bridge(xapp.clone(), conf, shutdown.child_token()));

    let app = http::build_router(AppState { xapp: xapp.clone() });

    let addr: SocketAddr = cfg
        .http
        .addr
        .parse()
        .with_context(|| format!("invalid http.addr {:?}", cfg.http.addr))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        version = XAPP_VERSION,
        ai_ml_enabled = cfg.features.ai_ml_enabled,
        python_o1_sim = cfg.features.python_o1_sim,
        bridge = bridge.is_some(),
        "Traffic Steering xApp listening"
    );

    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            token.cancel();
        })
        .await
        .context("HTTP server failed")?;

    shutdown.cancel();
    if let Some(handle) = bridge {
        handle.await.context("RMR bridge task panicked")?;
    }

    info!("Traffic Steering xApp shutdown completed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = load_config().await;
    let xapp = Arc::new(TrafficSteeringXApp::new(&cfg, HealthTracker::new()));

    let span = info_span!("xapp", xapp_name = XAPP_NAME, correlation_id = %xapp.correlation_id());
    run(cfg, xapp).instrument(span).await
}
