// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.
//!
//! The client classifies failures but never retries; callers wrap it in a
//! `RetryPolicy` where a retry makes sense.

use std::time::Duration;

use ezshop_core::EzshopError;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for Chat Completions.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Creates a client posting to `base_url` with bearer authentication.
    pub fn new(api_key: &str, base_url: String, timeout: Duration) -> Result<Self, EzshopError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| EzshopError::Config(format!("invalid API key header value: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| EzshopError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a single chat completion request.
    ///
    /// 429, 500, 502, 503, 529, connection failures and timeouts are transient;
    /// every other failure is permanent.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, EzshopError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| self.classify_send_error(e))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| EzshopError::PermanentProvider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            });
        }

        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!(
                "OpenAI API error ({}): {}",
                api_err.error.type_.as_deref().unwrap_or("unknown"),
                api_err.error.message
            ),
            Err(_) => format!("API returned {status}: {body}"),
        };
        if is_transient_status(status) {
            Err(EzshopError::TransientProvider {
                message,
                source: None,
            })
        } else {
            Err(EzshopError::PermanentProvider {
                message,
                source: None,
            })
        }
    }

    fn classify_send_error(&self, e: reqwest::Error) -> EzshopError {
        if e.is_timeout() {
            EzshopError::Timeout {
                duration: self.timeout,
            }
        } else if e.is_connect() || e.is_request() {
            EzshopError::TransientProvider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        } else {
            EzshopError::PermanentProvider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 529)
}
