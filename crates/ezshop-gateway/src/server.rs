// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ezshop_agent::Orchestrator;
use ezshop_config::model::GatewayConfig;
use ezshop_core::{EzshopError, PluginAdapter};

use crate::handlers;

/// Renders the current metrics in Prometheus text format.
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// State behind `/health` and `/metrics`.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Adapters polled by `/health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    /// Present when the Prometheus recorder is installed.
    pub prometheus_render: Option<MetricsRender>,
}

impl HealthState {
    pub fn new(adapters: Vec<Arc<dyn PluginAdapter>>) -> Self {
        Self {
            start_time: Instant::now(),
            adapters,
            prometheus_render: None,
        }
    }

    pub fn with_metrics(mut self, render: MetricsRender) -> Self {
        self.prometheus_render = Some(render);
        self
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    /// Deadline for one turn, request to reply.
    pub request_timeout: Duration,
    pub health: HealthState,
}

/// Bind address and limits, taken from `[gateway]`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            max_upload_bytes: config.max_upload_bytes,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builds the route table:
/// - POST /agent/text (form-encoded)
/// - POST /agent/image (multipart)
/// - GET /health
/// - GET /metrics
pub fn app(state: GatewayState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/agent/text", post(handlers::post_text))
        .route("/agent/image", post(handlers::post_image))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the gateway until `shutdown` is cancelled.
///
/// In-flight requests finish before this returns.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), EzshopError> {
    let app = app(state, config.max_upload_bytes);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EzshopError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| EzshopError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped accepting requests");
    Ok(())
}
