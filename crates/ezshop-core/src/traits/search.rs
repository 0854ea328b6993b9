// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search service adapter trait.

use async_trait::async_trait;

use crate::error::EzshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SearchItem, SearchQuery};

/// Adapter for the embedding/search service.
///
/// Both modalities return items ranked best-first with the same shape.
/// Transport and service failures surface as [`EzshopError::RetrievalUnavailable`].
#[async_trait]
pub trait SearchAdapter: PluginAdapter {
    /// Text-embedding search, optionally narrowed by a filter.
    async fn search_text(&self, query: &SearchQuery) -> Result<Vec<SearchItem>, EzshopError>;

    /// Image-similarity search over raw image bytes.
    async fn search_image(&self, image: &[u8]) -> Result<Vec<SearchItem>, EzshopError>;
}
