// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary object store adapter trait.

use async_trait::async_trait;

use crate::error::EzshopError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for uploading user images.
#[async_trait]
pub trait ObjectStore: PluginAdapter {
    /// Stores `bytes` and returns the public URL they are served from.
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, EzshopError>;
}
