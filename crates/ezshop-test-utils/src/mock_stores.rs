// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory history and summary stores, plus a cache that is always down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ezshop_core::types::{Exchange, UserSummary};
use ezshop_core::{
    AdapterType, EzshopError, HealthStatus, HistoryPair, HistoryStore, MemoryCache,
    PluginAdapter, SummaryRepository,
};

/// History store over a `Vec`, with switchable read and write failures.
#[derive(Default)]
pub struct MockHistory {
    entries: Mutex<Vec<Exchange>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    appends: AtomicUsize,
}

impl MockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Append attempts, including rejected ones.
    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub async fn entries(&self) -> Vec<Exchange> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockHistory {
    fn name(&self) -> &str {
        "mock-history"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::History
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl HistoryStore for MockHistory {
    async fn append(&self, exchange: &Exchange) -> Result<(), EzshopError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EzshopError::store("mock history write failure"));
        }
        self.entries.lock().await.push(exchange.clone());
        Ok(())
    }

    async fn recent(&self, user_id: &str, look_back: i64) -> Result<Vec<HistoryPair>, EzshopError> {
        if look_back <= 0 {
            return Err(EzshopError::InvalidArgument("look_back must be positive".into()));
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(EzshopError::store("mock history read failure"));
        }
        let mut rows: Vec<Exchange> = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(rows
            .into_iter()
            .take(look_back as usize)
            .map(|e| (e.user_query, e.response))
            .collect())
    }
}

/// Summary repository over a `HashMap`.
#[derive(Default)]
pub struct MockSummaryRepository {
    rows: Mutex<HashMap<String, UserSummary>>,
    loads: AtomicUsize,
}

impl MockSummaryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockSummaryRepository {
    fn name(&self) -> &str {
        "mock-summaries"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SummaryStore
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SummaryRepository for MockSummaryRepository {
    async fn load(&self, user_id: &str) -> Result<Option<UserSummary>, EzshopError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().await.get(user_id).cloned())
    }

    async fn save(&self, summary: &UserSummary) -> Result<(), EzshopError> {
        self.rows
            .lock()
            .await
            .insert(summary.user_id.clone(), summary.clone());
        Ok(())
    }
}

/// A cache whose backend is unreachable.
#[derive(Debug, Default)]
pub struct FailingCache;

fn down() -> EzshopError {
    EzshopError::store("cache backend unreachable")
}

#[async_trait]
impl PluginAdapter for FailingCache {
    fn name(&self) -> &str {
        "failing-cache"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Unhealthy("unreachable".into()))
    }
}

#[async_trait]
impl MemoryCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, EzshopError> {
        Err(down())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), EzshopError> {
        Err(down())
    }

    async fn delete(&self, _keys: &[String]) -> Result<(), EzshopError> {
        Err(down())
    }

    async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>, EzshopError> {
        Err(down())
    }
}
