// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI generation model adapter for the EZShop assistant.
//!
//! Implements [`GenerationModel`] over Chat Completions, with optional
//! `json_schema` structured output.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info};

use ezshop_config::model::OpenAiConfig;
use ezshop_core::types::{GenerationRequest, GenerationResponse, ResponseSchema};
use ezshop_core::{AdapterType, EzshopError, GenerationModel, HealthStatus, PluginAdapter};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest, JsonSchemaFormat, ResponseFormat};

/// OpenAI chat model implementing [`GenerationModel`].
///
/// API key resolution order: config, then `OPENAI_API_KEY`, then error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, EzshopError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(&api_key, config.base_url.clone(), config.timeout())?;
        info!(
            model = %config.model,
            summary_model = %config.summary_model,
            "OpenAI provider initialized"
        );
        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    #[cfg(test)]
    fn with_client(client: OpenAiClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    fn to_chat_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage::system(request.system_prompt.clone()));
        }
        messages.push(ChatMessage::user(request.user_content.clone()));
        ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            response_format: request.response_format.as_ref().map(to_response_format),
        }
    }
}

/// Builds a non-strict `json_schema` response format.
///
/// Strict mode forbids optional properties, which the router filter relies on;
/// callers validate the output locally instead. The `$schema` and `title`
/// annotations are dropped.
fn to_response_format(schema: &ResponseSchema) -> ResponseFormat {
    let mut body = schema.schema.clone();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    ResponseFormat {
        format_type: "json_schema".into(),
        json_schema: JsonSchemaFormat {
            name: schema.name.clone(),
            schema: body,
            strict: false,
        },
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl GenerationModel for OpenAiProvider {
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, EzshopError> {
        let chat_request = self.to_chat_request(&request);
        let response = self.client.chat(&chat_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EzshopError::PermanentProvider {
                message: "response contained no choices".into(),
                source: None,
            })?;
        if let Some(refusal) = choice.message.refusal {
            return Err(EzshopError::PermanentProvider {
                message: format!("model refused: {refusal}"),
                source: None,
            });
        }
        let content = choice.message.content.unwrap_or_default();
        debug!(
            model = %response.model,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            chars = content.len(),
            "completion received"
        );
        Ok(GenerationResponse {
            content,
            model: response.model,
        })
    }
}

/// Resolves the API key: config value if non-empty, otherwise `OPENAI_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, EzshopError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY").map_err(|_| {
        EzshopError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}
