// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the EZShop assistant.
//!
//! Holds the append-only conversation log and the durable copy of each user's
//! summary. All access goes through one `tokio-rusqlite` connection in WAL mode,
//! with schema migrations embedded via refinery.

pub mod database;
pub mod history;
pub mod migrations;
pub mod queries;
pub mod summaries;

pub use database::Database;
pub use history::SqliteHistoryStore;
pub use summaries::SqliteSummaryRepository;

use std::sync::Arc;

use ezshop_config::model::StorageConfig;
use ezshop_core::EzshopError;

/// Opens the configured database and returns both stores sharing it.
pub async fn open_stores(
    config: &StorageConfig,
) -> Result<(SqliteHistoryStore, SqliteSummaryRepository), EzshopError> {
    let db = Arc::new(Database::open_with_options(&config.database_path, config.wal_mode).await?);
    Ok((
        SqliteHistoryStore::new(db.clone()),
        SqliteSummaryRepository::new(db),
    ))
}
