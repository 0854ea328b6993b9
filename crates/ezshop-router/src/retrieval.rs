// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search with an empty-result fallback.
//!
//! A filtered search that finds nothing is repeated once without the filter.
//! There is never a third call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use ezshop_core::types::{SearchItem, SearchQuery};
use ezshop_core::{EzshopError, SearchAdapter};
use ezshop_resilience::with_deadline;

/// Front door to the search service for the orchestrator.
///
/// Every failure, including an elapsed deadline, comes back as
/// [`EzshopError::RetrievalUnavailable`].
pub struct RetrievalGateway {
    search: Arc<dyn SearchAdapter>,
    timeout: Duration,
}

impl RetrievalGateway {
    pub fn new(search: Arc<dyn SearchAdapter>, timeout: Duration) -> Self {
        Self { search, timeout }
    }

    /// Text search, broadening to an unfiltered search once on an empty result.
    pub async fn retrieve(&self, query: SearchQuery) -> Result<Vec<SearchItem>, EzshopError> {
        let items = self.text_call(&query).await?;
        if !items.is_empty() {
            ezshop_prometheus::record_retrieval("hit");
            return Ok(items);
        }
        if query.filter.is_none() {
            ezshop_prometheus::record_retrieval("empty");
            return Ok(items);
        }

        info!(query = %query.query, "empty filtered search, retrying without filter");
        let broadened = SearchQuery {
            filter: None,
            ..query
        };
        let items = self.text_call(&broadened).await?;
        ezshop_prometheus::record_retrieval(if items.is_empty() {
            "empty"
        } else {
            "fallback_hit"
        });
        Ok(items)
    }

    /// Image-similarity search. No fallback applies.
    pub async fn retrieve_image(&self, image: &[u8]) -> Result<Vec<SearchItem>, EzshopError> {
        let result = with_deadline(self.timeout, self.search.search_image(image)).await;
        let items = self.unavailable_on_error(result)?;
        ezshop_prometheus::record_retrieval(if items.is_empty() { "empty" } else { "hit" });
        Ok(items)
    }

    async fn text_call(&self, query: &SearchQuery) -> Result<Vec<SearchItem>, EzshopError> {
        let result = with_deadline(self.timeout, self.search.search_text(query)).await;
        self.unavailable_on_error(result)
    }

    fn unavailable_on_error(
        &self,
        result: Result<Vec<SearchItem>, EzshopError>,
    ) -> Result<Vec<SearchItem>, EzshopError> {
        result.map_err(|e| {
            warn!(error = %e, "search service unavailable");
            ezshop_prometheus::record_retrieval("unavailable");
            match e {
                EzshopError::RetrievalUnavailable { .. } => e,
                other => EzshopError::RetrievalUnavailable {
                    message: other.to_string(),
                    source: Some(Box::new(other)),
                },
            }
        })
    }
}
