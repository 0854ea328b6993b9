// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable per-user summary repository.

use async_trait::async_trait;

use crate::error::EzshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::UserSummary;

/// Durable backing for user summaries behind the cache.
#[async_trait]
pub trait SummaryRepository: PluginAdapter {
    async fn load(&self, user_id: &str) -> Result<Option<UserSummary>, EzshopError>;

    /// Upserts the single current summary for `summary.user_id`.
    async fn save(&self, summary: &UserSummary) -> Result<(), EzshopError>;
}
