// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted generation model.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ezshop_core::types::{GenerationRequest, GenerationResponse};
use ezshop_core::{AdapterType, EzshopError, GenerationModel, HealthStatus, PluginAdapter};

/// One scripted outcome for [`MockGeneration::complete`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fails with [`EzshopError::TransientProvider`].
    Transient,
    /// Fails with [`EzshopError::PermanentProvider`].
    Permanent,
    /// Never completes; for deadline tests.
    Hang,
}

impl MockReply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// A generation model that pops replies from a FIFO queue.
///
/// When the queue is empty it answers with "mock response".
#[derive(Default)]
pub struct MockGeneration {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
}

impl MockGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<MockReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub async fn push(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `complete` calls so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockGeneration {
    fn name(&self) -> &str {
        "mock-generation"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl GenerationModel for MockGeneration {
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, EzshopError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        self.requests.lock().await.push(request);
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::text("mock response"));
        match reply {
            MockReply::Text(content) => Ok(GenerationResponse { content, model }),
            MockReply::Transient => Err(EzshopError::TransientProvider {
                message: "mock rate limit".into(),
                source: None,
            }),
            MockReply::Permanent => Err(EzshopError::PermanentProvider {
                message: "mock rejected request".into(),
                source: None,
            }),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
