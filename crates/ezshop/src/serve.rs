// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ezshop serve` command implementation.
//!
//! Builds the runtime, installs the Prometheus recorder when enabled, and
//! serves the HTTP API until SIGINT/SIGTERM. Pending writes are drained before
//! adapters shut down.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use ezshop::{Runtime, init_tracing};
use ezshop_agent::install_signal_handler;
use ezshop_config::EzshopConfig;
use ezshop_core::{EzshopError, PluginAdapter};
use ezshop_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use ezshop_prometheus::PrometheusAdapter;

/// Upper bound on the wait for background writes at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run_serve(config: EzshopConfig) -> Result<(), EzshopError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting ezshop serve");

    let runtime = Runtime::build(&config).await?;

    let prometheus = if config.prometheus.enabled {
        Some(Arc::new(PrometheusAdapter::new()?))
    } else {
        info!("prometheus metrics disabled");
        None
    };

    let not_ready = runtime.check_health().await;
    if not_ready > 0 {
        warn!(adapters = not_ready, "starting with degraded adapters");
    }

    let mut adapters = runtime.adapters.clone();
    if let Some(prometheus) = &prometheus {
        adapters.push(Arc::clone(prometheus) as Arc<dyn PluginAdapter>);
    }
    let mut health = HealthState::new(adapters);
    if let Some(prometheus) = prometheus {
        health = health.with_metrics(Arc::new(move || prometheus.render()));
    }

    let server_config = ServerConfig::from_config(&config.gateway);
    let state = GatewayState {
        orchestrator: Arc::clone(&runtime.orchestrator),
        request_timeout: server_config.request_timeout,
        health,
    };

    let cancel = install_signal_handler();
    let served = start_server(&server_config, state, cancel.clone()).await;
    cancel.cancel();

    runtime.shutdown(DRAIN_TIMEOUT).await;
    info!("ezshop serve shutdown complete");
    served
}
