// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`HistoryStore`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use ezshop_core::types::{Exchange, TIMESTAMP_FORMAT};
use ezshop_core::{AdapterType, EzshopError, HealthStatus, HistoryPair, HistoryStore, PluginAdapter};

use crate::database::Database;
use crate::queries::exchanges;

/// Append-only conversation log on a shared [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    db: Arc<Database>,
}

impl SqliteHistoryStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

/// Lists every required field of `exchange` that is empty or malformed.
pub fn missing_fields(exchange: &Exchange) -> Vec<String> {
    let mut missing = Vec::new();
    if exchange.user_id.trim().is_empty() {
        missing.push("user_id".to_string());
    }
    if exchange.user_query.trim().is_empty() {
        missing.push("user_query".to_string());
    }
    if exchange.response.trim().is_empty() {
        missing.push("response".to_string());
    }
    if normalize_timestamp(&exchange.timestamp).is_none() {
        missing.push("timestamp".to_string());
    }
    missing
}

/// Parses an RFC 3339 or naive `TIMESTAMP_FORMAT` value and renders it in UTC.
///
/// Stored timestamps share one format so lexical order is chronological order.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().format(TIMESTAMP_FORMAT).to_string())
}

#[async_trait]
impl PluginAdapter for SqliteHistoryStore {
    fn name(&self) -> &str {
        "sqlite-history"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::History
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        self.db.ping().await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EzshopError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, exchange: &Exchange) -> Result<(), EzshopError> {
        let fields = missing_fields(exchange);
        if !fields.is_empty() {
            return Err(EzshopError::Validation {
                message: format!("exchange is missing {}", fields.join(", ")),
                fields,
            });
        }
        let timestamp = normalize_timestamp(&exchange.timestamp).ok_or_else(|| {
            EzshopError::Internal("timestamp passed validation but failed to normalize".into())
        })?;
        exchanges::insert_exchange(&self.db, exchange, timestamp).await?;
        debug!(user_id = %exchange.user_id, "exchange appended");
        Ok(())
    }

    async fn recent(&self, user_id: &str, look_back: i64) -> Result<Vec<HistoryPair>, EzshopError> {
        if look_back <= 0 {
            return Err(EzshopError::InvalidArgument(format!(
                "look_back must be positive, got {look_back}"
            )));
        }
        let rows = exchanges::latest_for_user(&self.db, user_id, look_back).await?;
        let total = rows.len();
        let pairs: Vec<HistoryPair> = rows
            .into_iter()
            .filter_map(|row| match (row.user_query, row.response) {
                (Some(q), Some(r)) if !q.is_empty() && !r.is_empty() => Some((q, r)),
                _ => None,
            })
            .collect();
        if pairs.len() < total {
            debug!(user_id, skipped = total - pairs.len(), "skipped incomplete history rows");
        }
        Ok(pairs)
    }
}
