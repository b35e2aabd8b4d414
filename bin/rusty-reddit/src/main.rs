//! # Rusty-Reddit Binary
//!
//! Assembles the engine: configuration, logging, the in-memory store, the
//! Prometheus registry, the engine mailbox and its network front doors.

mod listener;

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use rr_config::{AppConfig, LogFormat, LogSection};
use rr_engine::{Engine, EngineSettings};
use rr_metrics_prometheus::PrometheusMetrics;
use rr_store_memory::MemoryStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogSection) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn metrics_handler(State(metrics): State<Arc<PrometheusMetrics>>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn serve_metrics(addr: &str, metrics: Arc<PrometheusMetrics>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics address {addr}"))?;
    info!(%addr, "serving /metrics");
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let metrics = Arc::new(PrometheusMetrics::new());
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store, metrics.clone()).with_settings(EngineSettings {
        score_floor_hours: config.feed.score_floor_hours,
        default_feed_limit: config.feed.default_limit,
    });
    let (handle, engine_task) = rr_engine::spawn(engine, config.engine.name.clone(), config.engine.mailbox_capacity);

    if config.metrics.enabled {
        let addr = config.metrics.addr.clone();
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_metrics(&addr, metrics).await {
                warn!(error = ?err, "metrics endpoint stopped");
            }
        });
    }

    let front_door = TcpListener::bind(&config.listen.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen.addr))?;
    info!(endpoint = %config.engine.name, addr = %config.listen.addr, "🚀 Rusty-Reddit engine started");

    tokio::select! {
        result = listener::serve(front_door, handle) => result?,
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    engine_task.abort();
    info!("Shutdown complete.");
    Ok(())
}
