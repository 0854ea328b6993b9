// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value cache adapter trait backing the personalization store.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EzshopError;
use crate::traits::adapter::PluginAdapter;

/// Expiring string cache.
///
/// Backend failures are returned as [`EzshopError::StoreUnavailable`]; callers
/// decide whether to degrade (the personalization store treats them as misses).
#[async_trait]
pub trait MemoryCache: PluginAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, EzshopError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EzshopError>;

    /// Removes every listed key. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<(), EzshopError>;

    /// Lists live keys matching a glob pattern where `*` matches any run of characters.
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, EzshopError>;
}
