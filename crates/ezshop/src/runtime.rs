// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root.
//!
//! Wires the configured adapters into an [`Orchestrator`] and keeps a handle on
//! each of them for health checks and shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use ezshop_agent::{Orchestrator, Synthesizer, TurnSettings};
use ezshop_config::EzshopConfig;
use ezshop_core::{EzshopError, HealthStatus, PluginAdapter};
use ezshop_memory::{InMemoryCache, PersonalizationStore, Summarizer};
use ezshop_openai::OpenAiProvider;
use ezshop_resilience::RetryPolicy;
use ezshop_router::{RetrievalGateway, Router};
use ezshop_search::{HttpSearchClient, S3ObjectStore};
use ezshop_storage::{Database, SqliteHistoryStore, SqliteSummaryRepository};

/// A fully wired assistant.
pub struct Runtime {
    pub orchestrator: Arc<Orchestrator>,
    /// Every adapter, in shutdown order.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

impl Runtime {
    /// Opens storage and builds every adapter from `config`.
    pub async fn build(config: &EzshopConfig) -> Result<Self, EzshopError> {
        let db = Arc::new(
            Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
                .await?,
        );
        let history = Arc::new(SqliteHistoryStore::new(Arc::clone(&db)));
        let summaries = Arc::new(SqliteSummaryRepository::new(db));

        let model = Arc::new(OpenAiProvider::new(&config.openai)?);
        let search = Arc::new(HttpSearchClient::new(&config.search)?);
        let object_store = Arc::new(S3ObjectStore::new(&config.object_store)?);
        let cache = Arc::new(InMemoryCache::new());
        let retry = RetryPolicy::from_config(&config.retry);
        let timeout = config.openai.timeout();

        let summarizer = Summarizer::new(
            model.clone(),
            config.openai.summary_model.clone(),
            &config.memory,
            retry.clone(),
            timeout,
        );
        let personalization = Arc::new(
            PersonalizationStore::new(
                cache.clone(),
                Arc::new(summarizer),
                config.memory.summary_ttl(),
            )
            .with_repository(summaries.clone()),
        );

        let router =
            Router::new(model.clone(), config.openai.model.clone(), timeout)?.with_retry(retry);
        let retrieval = RetrievalGateway::new(search.clone(), config.search.timeout());
        let synthesizer = Synthesizer::new(model.clone(), config.openai.model.clone(), timeout);

        let orchestrator = Orchestrator::new(
            history.clone(),
            personalization,
            router,
            retrieval,
            synthesizer,
            TurnSettings::from_config(&config.agent),
        )
        .with_object_store(object_store.clone());

        info!(
            model = %config.openai.model,
            summary_model = %config.openai.summary_model,
            database = %config.storage.database_path,
            "runtime assembled"
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            adapters: vec![model, search, object_store, cache, history, summaries],
        })
    }

    /// Runs every adapter's health check and logs the result.
    ///
    /// Returns the number of adapters that are not healthy.
    pub async fn check_health(&self) -> usize {
        let checks = self
            .adapters
            .iter()
            .map(|adapter| async move {
                (adapter.name().to_string(), adapter.health_check().await)
            });
        let mut unhealthy = 0;
        for (name, result) in futures::future::join_all(checks).await {
            match result {
                Ok(HealthStatus::Healthy) => info!(adapter = %name, "adapter healthy"),
                Ok(HealthStatus::Degraded(why)) => {
                    unhealthy += 1;
                    warn!(adapter = %name, reason = %why, "adapter degraded");
                }
                Ok(HealthStatus::Unhealthy(why)) => {
                    unhealthy += 1;
                    error!(adapter = %name, reason = %why, "adapter unhealthy");
                }
                Err(e) => {
                    unhealthy += 1;
                    error!(adapter = %name, error = %e, "adapter health check failed");
                }
            }
        }
        unhealthy
    }

    /// Drains pending history and summary writes, then shuts adapters down.
    pub async fn shutdown(&self, drain_timeout: Duration) {
        if !self.orchestrator.drain(drain_timeout).await {
            warn!(
                pending = self.orchestrator.pending_writes(),
                "drain deadline reached with writes still pending"
            );
        }
        for adapter in &self.adapters {
            if let Err(e) = adapter.shutdown().await {
                warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
            }
        }
        info!("runtime shut down");
    }
}
