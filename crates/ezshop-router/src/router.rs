// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM intent router for text turns.
//!
//! One generation call per turn, constrained to the [`RouterDecision`] schema
//! and validated locally before use.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use ezshop_core::types::{GenerationRequest, ResponseSchema, UserSummary};
use ezshop_core::{EzshopError, GenerationModel, HistoryPair};
use ezshop_resilience::{RetryPolicy, with_deadline};

use crate::decision::{RouterDecision, decision_schema, decision_validator, parse_decision};
use crate::prompt::{router_instructions, router_message};

/// Classifies a text turn and decides what, if anything, to search for.
pub struct Router {
    model: Arc<dyn GenerationModel>,
    model_name: String,
    timeout: Duration,
    retry: RetryPolicy,
    instructions: String,
    schema: ResponseSchema,
    validator: jsonschema::Validator,
}

impl Router {
    /// Creates a router that makes a single attempt per turn.
    pub fn new(
        model: Arc<dyn GenerationModel>,
        model_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EzshopError> {
        Ok(Self {
            model,
            model_name: model_name.into(),
            timeout,
            retry: RetryPolicy::no_retry(),
            instructions: router_instructions(),
            schema: decision_schema(),
            validator: decision_validator()?,
        })
    }

    /// Retries transient provider failures with `retry`.
    ///
    /// Malformed output is permanent and never retried.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Routes one text turn.
    ///
    /// Provider failures, timeouts and output that fails validation are
    /// returned as errors; the turn cannot continue without a decision.
    pub async fn route(
        &self,
        query: &str,
        history: &[HistoryPair],
        summary: &UserSummary,
    ) -> Result<RouterDecision, EzshopError> {
        let request = GenerationRequest {
            model: self.model_name.clone(),
            system_prompt: self.instructions.clone(),
            user_content: router_message(query, history, summary),
            response_format: Some(self.schema.clone()),
        };

        let response = self
            .retry
            .run("route", || {
                let request = request.clone();
                async move { with_deadline(self.timeout, self.model.complete(request)).await }
            })
            .await?;
        debug!(model = %response.model, chars = response.content.len(), "router output received");

        let decision = parse_decision(&response.content, &self.validator)?;
        info!(
            target_kind = ?decision.target,
            needs_context = decision.needs_context,
            filtered = decision.filter.is_some(),
            "turn routed"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::RouteTarget;
    use ezshop_test_utils::{MockGeneration, MockReply};

    const ALREADY_KNOWN: &str =
        r#"{"needs_context": false, "intent": "hỏi giá", "query": "", "target": "already_known"}"#;

    fn router(model: Arc<MockGeneration>) -> Router {
        Router::new(model, "gpt-4o-mini", Duration::from_secs(5)).unwrap()
    }

    fn history() -> Vec<HistoryPair> {
        vec![(
            "Nike Pegasus 40 có màu đen không?".into(),
            "Có ạ, Nike Pegasus 40 màu đen giá 2.990.000đ.".into(),
        )]
    }

    #[tokio::test]
    async fn price_follow_up_is_already_known() {
        let model = MockGeneration::with_replies(vec![MockReply::text(ALREADY_KNOWN)]);
        let decision = router(model.clone())
            .route("Giá bao nhiêu?", &history(), &UserSummary::empty("u1"))
            .await
            .unwrap();
        assert!(!decision.needs_context);
        assert_eq!(decision.target, RouteTarget::AlreadyKnown);
        assert!(decision.search_query().is_none());

        let requests = model.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user_content.contains("Nike Pegasus 40"));
        assert!(requests[0].user_content.contains("User query: Giá bao nhiêu?"));
        assert_eq!(
            requests[0].response_format.as_ref().map(|s| s.name.as_str()),
            Some("router_decision")
        );
        assert!(requests[0].system_prompt.contains("already_known"));
    }

    #[tokio::test]
    async fn malformed_output_fails_without_retry() {
        let model = MockGeneration::with_replies(vec![
            MockReply::text(r#"{"needs_context": "yes"}"#),
            MockReply::text(ALREADY_KNOWN),
        ]);
        let router = router(model.clone()).with_retry(RetryPolicy::new(
            3,
            Duration::from_millis(10),
            Duration::from_millis(10),
            1.0,
        ));
        let err = router
            .route("áo khoác", &[], &UserSummary::empty("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EzshopError::PermanentProvider { .. }));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried_when_configured() {
        let model = MockGeneration::with_replies(vec![
            MockReply::Transient,
            MockReply::text(ALREADY_KNOWN),
        ]);
        let router = router(model.clone()).with_retry(RetryPolicy::new(
            3,
            Duration::from_millis(100),
            Duration::from_secs(1),
            2.0,
        ));
        let decision = router.route("x", &[], &UserSummary::empty("u1")).await.unwrap();
        assert_eq!(decision.target, RouteTarget::AlreadyKnown);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn transient_failure_surfaces_by_default() {
        let model = MockGeneration::with_replies(vec![MockReply::Transient]);
        let err = router(model.clone())
            .route("x", &[], &UserSummary::empty("u1"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_model_hits_the_deadline() {
        let model = MockGeneration::with_replies(vec![MockReply::Hang]);
        let err = router(model)
            .route("x", &[], &UserSummary::empty("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EzshopError::Timeout { .. }));
    }
}
