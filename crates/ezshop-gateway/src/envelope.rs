// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response envelopes shared by the agent endpoints.
//!
//! Successes are `{action, status: "success", response}`. Failures are
//! `{action, status: "error", error, message}`; only client errors echo their
//! detail, everything else gets a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use ezshop_core::EzshopError;

/// Action name carried by every agent envelope.
pub const ACTION: &str = "get_response";

/// Body of a successful agent call.
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    pub action: &'static str,
    pub status: &'static str,
    pub response: T,
}

impl<T: Serialize> SuccessEnvelope<T> {
    pub fn new(response: T) -> Self {
        Self {
            action: ACTION,
            status: "success",
            response,
        }
    }
}

impl<T: Serialize> IntoResponse for SuccessEnvelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Body of a failed agent call.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub action: &'static str,
    pub status: &'static str,
    pub error: String,
    pub message: String,
}

/// An [`EzshopError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub EzshopError);

impl From<EzshopError> for ApiError {
    fn from(err: EzshopError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(self.0, EzshopError::Timeout { .. }) {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn envelope(&self) -> ErrorEnvelope {
        let (error, message) = match self.status_code() {
            StatusCode::BAD_REQUEST => ("Invalid input data", self.0.to_string()),
            StatusCode::GATEWAY_TIMEOUT => (
                "Gateway timeout",
                "The assistant took too long to respond".to_string(),
            ),
            _ => (
                "Internal server error",
                "An unexpected error occurred".to_string(),
            ),
        };
        ErrorEnvelope {
            action: ACTION,
            status: "error",
            error: error.to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }
        (status, Json(self.envelope())).into_response()
    }
}
