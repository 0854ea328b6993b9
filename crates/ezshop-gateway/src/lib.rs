// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the EZShop assistant.
//!
//! Text turns arrive form-encoded on `/agent/text`, image turns as multipart
//! on `/agent/image`. Both are handed to the [`Orchestrator`](ezshop_agent::Orchestrator)
//! under the configured request deadline and wrapped in the `get_response`
//! envelope.

pub mod envelope;
pub mod handlers;
pub mod server;

pub use envelope::{ACTION, ApiError, ErrorEnvelope, SuccessEnvelope};
pub use server::{GatewayState, HealthState, MetricsRender, ServerConfig, app, start_server};
