// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation model (LLM) adapter trait.

use async_trait::async_trait;

use crate::error::EzshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerationRequest, GenerationResponse};

/// Adapter for a request/response language model.
///
/// Implementations classify failures: rate limits and timeouts as
/// [`EzshopError::TransientProvider`] / [`EzshopError::Timeout`], everything
/// else as [`EzshopError::PermanentProvider`]. Retrying is the caller's job.
#[async_trait]
pub trait GenerationModel: PluginAdapter {
    /// Sends a single-shot completion request.
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, EzshopError>;
}
