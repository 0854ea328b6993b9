// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Final reply generation.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use ezshop_core::types::GenerationRequest;
use ezshop_core::{EzshopError, GenerationModel};
use ezshop_resilience::with_deadline;

use crate::prompts::persona;

/// Turns a context block into the user-facing reply.
///
/// A single attempt under a deadline: there is no useful fallback reply, so
/// failures go straight back to the orchestrator.
pub struct Synthesizer {
    model: Arc<dyn GenerationModel>,
    model_name: String,
    timeout: Duration,
    persona: String,
}

impl Synthesizer {
    pub fn new(
        model: Arc<dyn GenerationModel>,
        model_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            timeout,
            persona: persona(),
        }
    }

    pub async fn synthesize(&self, context: &str) -> Result<String, EzshopError> {
        let request = GenerationRequest {
            model: self.model_name.clone(),
            system_prompt: self.persona.clone(),
            user_content: context.to_string(),
            response_format: None,
        };
        let response = with_deadline(self.timeout, self.model.complete(request)).await?;
        let reply = response.content.trim();
        if reply.is_empty() {
            return Err(EzshopError::PermanentProvider {
                message: "model returned an empty reply".into(),
                source: None,
            });
        }
        debug!(model = %response.model, chars = reply.len(), "reply synthesized");
        Ok(reply.to_string())
    }
}
