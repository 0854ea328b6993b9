// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`SummaryRepository`] trait.

use std::sync::Arc;

use async_trait::async_trait;

use ezshop_core::types::UserSummary;
use ezshop_core::{AdapterType, EzshopError, HealthStatus, PluginAdapter, SummaryRepository};

use crate::database::Database;
use crate::queries::summaries;

/// Durable copy of each user's current summary.
#[derive(Debug, Clone)]
pub struct SqliteSummaryRepository {
    db: Arc<Database>,
}

impl SqliteSummaryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PluginAdapter for SqliteSummaryRepository {
    fn name(&self) -> &str {
        "sqlite-summaries"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SummaryStore
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        self.db.ping().await?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SummaryRepository for SqliteSummaryRepository {
    async fn load(&self, user_id: &str) -> Result<Option<UserSummary>, EzshopError> {
        summaries::get_summary(&self.db, user_id).await
    }

    async fn save(&self, summary: &UserSummary) -> Result<(), EzshopError> {
        summaries::upsert_summary(&self.db, summary).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> SqliteSummaryRepository {
        SqliteSummaryRepository::new(Arc::new(Database::open_in_memory().await.unwrap()))
    }

    fn summary(user: &str, prefs: &[&str]) -> UserSummary {
        UserSummary {
            user_id: user.into(),
            personal_info: vec!["Tên: Lan".into()],
            preferences: prefs.iter().map(|p| p.to_string()).collect(),
            updated_at: "2026-03-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let repo = repository().await;
        assert!(repo.load("u1").await.unwrap().is_none());

        let s = summary("u1", &["giày chạy bộ"]);
        repo.save(&s).await.unwrap();
        assert_eq!(repo.load("u1").await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn save_replaces_previous_summary() {
        let repo = repository().await;
        repo.save(&summary("u1", &["a"])).await.unwrap();
        repo.save(&summary("u1", &["b", "c"])).await.unwrap();
        let loaded = repo.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.preferences, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.db");
        let path = path.to_str().unwrap();
        {
            let db = Arc::new(Database::open(path).await.unwrap());
            SqliteSummaryRepository::new(db.clone())
                .save(&summary("u1", &["x"]))
                .await
                .unwrap();
            db.checkpoint().await.unwrap();
        }
        let repo = SqliteSummaryRepository::new(Arc::new(Database::open(path).await.unwrap()));
        assert_eq!(repo.load("u1").await.unwrap().unwrap().preferences, vec!["x"]);
    }
}
