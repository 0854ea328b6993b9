// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation log statements.

use ezshop_core::EzshopError;
use ezshop_core::types::Exchange;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// A log row as read back for history; either side may be absent in legacy rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPair {
    pub user_query: Option<String>,
    pub response: Option<String>,
}

/// Inserts one exchange. `timestamp` must already be normalized to UTC.
pub async fn insert_exchange(
    db: &Database,
    exchange: &Exchange,
    timestamp: String,
) -> Result<(), EzshopError> {
    let retrieved = serde_json::to_string(&exchange.retrieved_items)
        .map_err(|e| EzshopError::Internal(format!("serializing retrieved items: {e}")))?;
    let ex = exchange.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO exchanges
                   (user_id, conversation_id, user_query, image_ref, response,
                    context_snapshot, retrieved_items, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    ex.user_id,
                    ex.conversation_id,
                    ex.user_query,
                    ex.image_ref,
                    ex.response,
                    ex.context_snapshot,
                    retrieved,
                    timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Newest `limit` rows for a user, ties broken by insertion order.
pub async fn latest_for_user(
    db: &Database,
    user_id: &str,
    limit: i64,
) -> Result<Vec<StoredPair>, EzshopError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<StoredPair>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT user_query, response FROM exchanges
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], |row| {
                Ok(StoredPair {
                    user_query: row.get(0)?,
                    response: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of logged exchanges for a user.
pub async fn count_for_user(db: &Database, user_id: &str) -> Result<i64, EzshopError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM exchanges WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
