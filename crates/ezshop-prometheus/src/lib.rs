// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the EZShop assistant.
//!
//! Installs the metrics-rs Prometheus recorder; the gateway serves
//! [`PrometheusAdapter::render`] on `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use ezshop_core::{AdapterType, EzshopError, HealthStatus, PluginAdapter};

pub use recording::{
    record_persistence_failure, record_retrieval, record_summarizer, record_summary_cache,
    record_turn, record_turn_latency,
};

/// Owner of the process-wide Prometheus recorder.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the recorder globally and registers metric descriptions.
    ///
    /// Fails if a recorder is already installed in this process.
    pub fn new() -> Result<Self, EzshopError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            EzshopError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;
        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Wraps a handle from a recorder built elsewhere (tests build a local one).
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Current metrics in Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}
