// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the embedding/search service.
//!
//! Text search posts `{query, filter?, collection}` as JSON; image search posts
//! the raw bytes as a multipart `image` field. Both endpoints answer with a
//! ranked list under `items` (older deployments use `top_k_results`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use ezshop_config::model::SearchConfig;
use ezshop_core::types::{SearchItem, SearchQuery};
use ezshop_core::{AdapterType, EzshopError, HealthStatus, PluginAdapter, SearchAdapter};

use ezshop_core::content_type;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "top_k_results")]
    items: Vec<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// [`SearchAdapter`] over the search service's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    text_url: String,
    image_url: String,
    timeout: Duration,
}

impl HttpSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, EzshopError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EzshopError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            text_url: config.text_url.clone(),
            image_url: config.image_url.clone(),
            timeout: config.timeout(),
        })
    }

    async fn read_items(
        &self,
        response: reqwest::Response,
    ) -> Result<Vec<SearchItem>, EzshopError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("search service returned {status}: {body}"), None));
        }
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("unreadable search response: {e}"), Some(e)))?;
        if parsed.status.as_deref() == Some("error") {
            return Err(unavailable(
                format!(
                    "search service reported an error: {}",
                    parsed.message.unwrap_or_default()
                ),
                None,
            ));
        }
        Ok(parsed.items.into_iter().filter_map(normalize_item).collect())
    }

    fn map_send_error(&self, e: reqwest::Error) -> EzshopError {
        if e.is_timeout() {
            EzshopError::Timeout {
                duration: self.timeout,
            }
        } else {
            unavailable(format!("search request failed: {e}"), Some(e))
        }
    }
}

fn unavailable(message: String, source: Option<reqwest::Error>) -> EzshopError {
    EzshopError::RetrievalUnavailable {
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

/// Converts one raw result into a [`SearchItem`].
///
/// Structured `{id, score, attributes}` objects are taken as-is. Flat product
/// records keep every field except the id and score as attributes. Non-objects
/// are dropped.
pub fn normalize_item(raw: Value) -> Option<SearchItem> {
    let Value::Object(mut fields) = raw else {
        return None;
    };
    if let Some(Value::Object(attributes)) = fields.get("attributes") {
        let attributes = attributes.clone();
        return Some(SearchItem {
            id: fields.get("id").map(id_string).unwrap_or_default(),
            score: fields.get("score").and_then(Value::as_f64).unwrap_or_default(),
            attributes,
        });
    }

    let id = ["id", "_id", "product_id"]
        .iter()
        .find_map(|k| fields.remove(*k))
        .map(|v| id_string(&v))
        .unwrap_or_default();
    let score = ["score", "similarity"]
        .iter()
        .find_map(|k| fields.remove(*k))
        .and_then(|v| v.as_f64())
        .unwrap_or_default();
    Some(SearchItem {
        id,
        score,
        attributes: fields,
    })
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for HttpSearchClient {
    fn name(&self) -> &str {
        "http-search"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SearchAdapter for HttpSearchClient {
    async fn search_text(&self, query: &SearchQuery) -> Result<Vec<SearchItem>, EzshopError> {
        let response = self
            .client
            .post(&self.text_url)
            .json(query)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let items = self.read_items(response).await?;
        debug!(
            collection = %query.collection,
            filtered = query.filter.is_some(),
            items = items.len(),
            "text search complete"
        );
        Ok(items)
    }

    async fn search_image(&self, image: &[u8]) -> Result<Vec<SearchItem>, EzshopError> {
        let kind = content_type::sniff(image);
        let part = Part::bytes(image.to_vec())
            .file_name(format!("image.{}", kind.extension))
            .mime_str(kind.mime)
            .map_err(|e| unavailable(format!("invalid image part: {e}"), Some(e)))?;
        let response = self
            .client
            .post(&self.image_url)
            .multipart(Form::new().part("image", part))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let items = self.read_items(response).await?;
        debug!(bytes = image.len(), items = items.len(), "image search complete");
        Ok(items)
    }
}
