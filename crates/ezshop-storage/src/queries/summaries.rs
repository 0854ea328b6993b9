// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User summary statements.

use ezshop_core::EzshopError;
use ezshop_core::types::UserSummary;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Inserts or replaces the summary row for `summary.user_id`.
pub async fn upsert_summary(db: &Database, summary: &UserSummary) -> Result<(), EzshopError> {
    let personal_info = encode_list(&summary.personal_info)?;
    let preferences = encode_list(&summary.preferences)?;
    let user_id = summary.user_id.clone();
    let updated_at = summary.updated_at.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO user_summaries (user_id, personal_info, preferences, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                   personal_info = excluded.personal_info,
                   preferences = excluded.preferences,
                   updated_at = excluded.updated_at",
                params![user_id, personal_info, preferences, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_summary(db: &Database, user_id: &str) -> Result<Option<UserSummary>, EzshopError> {
    let uid = user_id.to_string();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<(String, String, String)>, rusqlite::Error> {
            conn.query_row(
                "SELECT personal_info, preferences, updated_at
                 FROM user_summaries WHERE user_id = ?1",
                params![uid],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    let Some((personal_info, preferences, updated_at)) = row else {
        return Ok(None);
    };
    Ok(Some(UserSummary {
        user_id: user_id.to_string(),
        personal_info: decode_list(&personal_info)?,
        preferences: decode_list(&preferences)?,
        updated_at,
    }))
}

fn encode_list(items: &[String]) -> Result<String, EzshopError> {
    serde_json::to_string(items).map_err(EzshopError::store)
}

fn decode_list(raw: &str) -> Result<Vec<String>, EzshopError> {
    serde_json::from_str(raw).map_err(EzshopError::store)
}
