// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling user summary produced by the generation model.
//!
//! Every attempt takes a slot from a shared [`RateLimiter`] and runs under a
//! deadline; transient failures are retried by the [`RetryPolicy`]. The caller
//! never sees an error: anything that cannot be recovered becomes
//! [`SummaryResult::Unavailable`].

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, warn};

use ezshop_config::model::MemoryConfig;
use ezshop_core::types::{GenerationRequest, ResponseSchema, UserSummary, strip_code_fence};
use ezshop_core::{EzshopError, GenerationModel};
use ezshop_resilience::{RateLimiter, RetryPolicy, with_deadline};

const SYSTEM_PROMPT: &str = "You are a summarization assistant for an online shop. \
You maintain a compact profile of one customer.";

/// Structured output the model must return.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SummaryContent {
    /// Facts about the customer: name, email, phone, address, and the like.
    pub personal_info: Vec<String>,
    /// Shopping preferences, most recent and relevant first.
    pub preferences: Vec<String>,
}

/// Outcome of [`Summarizer::summarize`].
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryResult {
    /// Merged summary with preferences already capped.
    Updated(UserSummary),
    /// The model could not produce a usable summary; keep the current one.
    Unavailable,
}

/// Merges new interaction text into a user's summary.
pub struct Summarizer {
    model: Arc<dyn GenerationModel>,
    model_name: String,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    timeout: Duration,
    max_preferences: usize,
}

impl Summarizer {
    pub fn new(
        model: Arc<dyn GenerationModel>,
        model_name: impl Into<String>,
        config: &MemoryConfig,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_calls,
                config.rate_limit_window(),
            )),
            retry,
            timeout,
            max_preferences: config.max_preferences,
        }
    }

    /// Shares an existing limiter, so several summarizers draw on one budget.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn max_preferences(&self) -> usize {
        self.max_preferences
    }

    /// Produces the merged summary for `raw_text` on top of `current`.
    pub async fn summarize(&self, raw_text: &str, current: &UserSummary) -> SummaryResult {
        if raw_text.trim().is_empty() {
            warn!(user_id = %current.user_id, "nothing to summarize");
            ezshop_prometheus::record_summarizer("unavailable");
            return SummaryResult::Unavailable;
        }

        let request = self.build_request(raw_text, current);
        let result = self
            .retry
            .run("summarize", || {
                let request = request.clone();
                async move {
                    self.limiter.acquire().await;
                    let response = with_deadline(self.timeout, self.model.complete(request)).await?;
                    parse_summary(&response.content)
                }
            })
            .await;

        match result {
            Ok(content) => {
                let mut summary = UserSummary {
                    user_id: current.user_id.clone(),
                    personal_info: content.personal_info,
                    preferences: content.preferences,
                    updated_at: current.updated_at.clone(),
                };
                summary.cap_preferences(self.max_preferences);
                debug!(
                    user_id = %summary.user_id,
                    preferences = summary.preferences.len(),
                    "summary merged"
                );
                ezshop_prometheus::record_summarizer("updated");
                SummaryResult::Updated(summary)
            }
            Err(e) => {
                warn!(
                    user_id = %current.user_id,
                    error = %e,
                    "summarizer unavailable, keeping current summary"
                );
                ezshop_prometheus::record_summarizer("unavailable");
                SummaryResult::Unavailable
            }
        }
    }

    fn build_request(&self, raw_text: &str, current: &UserSummary) -> GenerationRequest {
        let user_content = format!(
            "Summarize into two lists:\n\
             - personal_info\n\
             - preferences (at most {max}, most recent first)\n\
             Merge the input into the current summary; drop nothing that is still true.\n\
             Current summary: {current}\n\
             Input: {raw_text}",
            max = self.max_preferences,
            current = current.to_prompt_json(),
        );
        GenerationRequest {
            model: self.model_name.clone(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_content,
            response_format: Some(summary_schema()),
        }
    }
}

/// The JSON schema handed to the model as its response format.
pub fn summary_schema() -> ResponseSchema {
    ResponseSchema {
        name: "user_summary".to_string(),
        schema: schemars::schema_for!(SummaryContent).to_value(),
    }
}

/// Parses model output into [`SummaryContent`], tolerating a markdown code fence.
///
/// Unparseable output is a permanent failure: retrying the same prompt is not
/// expected to fix it.
pub fn parse_summary(raw: &str) -> Result<SummaryContent, EzshopError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| EzshopError::PermanentProvider {
        message: format!("summary output did not match schema: {e}"),
        source: Some(Box::new(e)),
    })
}
