// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles POST /agent/text, POST /agent/image, GET /health, GET /metrics.

use axum::{
    Form, Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::FormRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use ezshop_agent::TurnRequest;
use ezshop_core::{EzshopError, HealthStatus};

use crate::envelope::{ApiError, SuccessEnvelope};
use crate::server::GatewayState;

/// Form body for POST /agent/text.
#[derive(Debug, Deserialize)]
pub struct TextForm {
    pub conversation_id: String,
    pub user_id: String,
    pub text: String,
}

impl From<TextForm> for TurnRequest {
    fn from(form: TextForm) -> Self {
        TurnRequest {
            user_id: form.user_id,
            conversation_id: Some(form.conversation_id),
            text: Some(form.text),
            image: None,
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded`, or `unhealthy`.
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub adapter_type: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// POST /agent/text
pub async fn post_text(
    State(state): State<GatewayState>,
    form: Result<Form<TextForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            return ApiError(EzshopError::InvalidArgument(rejection.body_text())).into_response();
        }
    };
    run_turn(&state, form.into()).await
}

/// POST /agent/image
///
/// Multipart fields: `conversation_id`, `user_id`, optional `text`, and the
/// `image` file.
pub async fn post_image(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            return ApiError(EzshopError::InvalidArgument(rejection.body_text())).into_response();
        }
    };
    match read_image_form(&mut multipart).await {
        Ok(request) => run_turn(&state, request).await,
        Err(e) => e.into_response(),
    }
}

async fn read_image_form(multipart: &mut Multipart) -> Result<TurnRequest, ApiError> {
    let mut request = TurnRequest::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "conversation_id" => {
                request.conversation_id = Some(field.text().await.map_err(malformed)?)
            }
            "user_id" => request.user_id = field.text().await.map_err(malformed)?,
            "text" => request.text = Some(field.text().await.map_err(malformed)?),
            "image" => request.image = Some(field.bytes().await.map_err(malformed)?.to_vec()),
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }
    if request.image.as_ref().is_none_or(|bytes| bytes.is_empty()) {
        return Err(ApiError(EzshopError::InvalidArgument(
            "missing image file".to_string(),
        )));
    }
    Ok(request)
}

fn malformed(err: MultipartError) -> ApiError {
    ApiError(EzshopError::InvalidArgument(err.body_text()))
}

async fn run_turn(state: &GatewayState, request: TurnRequest) -> Response {
    match tokio::time::timeout(state.request_timeout, state.orchestrator.handle(request)).await {
        Ok(Ok(reply)) => SuccessEnvelope::new(reply).into_response(),
        Ok(Err(failure)) => ApiError(failure.into_error()).into_response(),
        Err(_) => ApiError(EzshopError::Timeout {
            duration: state.request_timeout,
        })
        .into_response(),
    }
}

/// GET /health
///
/// Polls every adapter concurrently. Any unhealthy adapter turns the response
/// into a 503.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let checks = state.health.adapters.iter().map(|adapter| async move {
        let (status, detail) = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(why)) => ("degraded", Some(why)),
            Ok(HealthStatus::Unhealthy(why)) => ("unhealthy", Some(why)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        AdapterHealth {
            name: adapter.name().to_string(),
            adapter_type: adapter.adapter_type().to_string(),
            status,
            detail,
        }
    });
    let adapters = futures::future::join_all(checks).await;

    let status = if adapters.iter().any(|a| a.status == "unhealthy") {
        "unhealthy"
    } else if adapters.iter().any(|a| a.status == "degraded") {
        "degraded"
    } else {
        "ok"
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
