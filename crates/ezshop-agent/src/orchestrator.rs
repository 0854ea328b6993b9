// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn pipeline.
//!
//! History and summary are read concurrently, then the turn branches on
//! modality: image turns go straight to image search (with the upload running
//! alongside), text turns are routed first and searched only when the router
//! asks for it. The reply is synthesized and returned while history and summary
//! writes continue in the background on a [`TaskTracker`].
//!
//! Read-side and write-side failures are logged and defaulted. Routing and
//! synthesis failures end the turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use ezshop_config::model::AgentConfig;
use ezshop_core::content_type;
use ezshop_core::types::{Exchange, SearchItem, UserSummary, now_timestamp};
use ezshop_core::{EzshopError, HistoryPair, HistoryStore, ObjectStore};
use ezshop_memory::PersonalizationStore;
use ezshop_router::{RetrievalGateway, Router};

use crate::prompts::{image_context, text_context};
use crate::stage::{TurnFailure, TurnStage};
use crate::synthesizer::Synthesizer;

/// Per-turn knobs taken from `[agent]`.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub look_back: i64,
    pub image_query_fallback: String,
}

impl TurnSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            look_back: config.look_back,
            image_query_fallback: config.image_query_fallback.clone(),
        }
    }
}

/// One inbound turn. An image makes it an image turn; text is then optional.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub text: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// The reply handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReply {
    pub user_id: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub reply_text: String,
    pub items: Vec<SearchItem>,
    pub timestamp: String,
    pub latency_seconds: f64,
}

/// Everything synthesis needs, produced by either modality branch.
struct Prepared {
    query: String,
    image_url: Option<String>,
    items: Vec<SearchItem>,
    context: String,
}

/// Runs turns end to end. Cheap to share behind an `Arc`.
pub struct Orchestrator {
    history: Arc<dyn HistoryStore>,
    personalization: Arc<PersonalizationStore>,
    router: Router,
    retrieval: RetrievalGateway,
    synthesizer: Synthesizer,
    object_store: Option<Arc<dyn ObjectStore>>,
    settings: TurnSettings,
    writes: TaskTracker,
}

impl Orchestrator {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        personalization: Arc<PersonalizationStore>,
        router: Router,
        retrieval: RetrievalGateway,
        synthesizer: Synthesizer,
        settings: TurnSettings,
    ) -> Self {
        Self {
            history,
            personalization,
            router,
            retrieval,
            synthesizer,
            object_store: None,
            settings,
            writes: TaskTracker::new(),
        }
    }

    /// Uploads image-turn images to `store`. Without one, image replies carry no URL.
    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Handles one turn and returns the reply, or the stage it failed in.
    pub async fn handle(&self, request: TurnRequest) -> Result<TurnReply, TurnFailure> {
        let started = Instant::now();
        let modality = if request.image.is_some() { "image" } else { "text" };
        let user_id = request.user_id.clone();

        let result = self.run(request, started).await;
        match &result {
            Ok(reply) => {
                info!(
                    user_id = %reply.user_id,
                    modality,
                    items = reply.items.len(),
                    latency_seconds = reply.latency_seconds,
                    "turn complete"
                );
                ezshop_prometheus::record_turn(modality, "success");
            }
            Err(failure) => {
                error!(
                    user_id = %user_id,
                    modality,
                    stage = %failure.stage,
                    error = %failure.source,
                    "turn failed"
                );
                ezshop_prometheus::record_turn(modality, "error");
            }
        }
        ezshop_prometheus::record_turn_latency(started.elapsed().as_secs_f64());
        result
    }

    async fn run(&self, request: TurnRequest, started: Instant) -> Result<TurnReply, TurnFailure> {
        validate(&request).map_err(|e| TurnFailure::new(TurnStage::Start, e))?;
        let user_id = request.user_id.trim().to_string();
        let text = request
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        debug!(user_id = %user_id, stage = %TurnStage::ContextGathering, "turn started");
        let (history, summary) = self.gather_context(&user_id).await;

        let prepared = match request.image {
            Some(image) => self.image_turn(text, image, &history, &summary).await,
            None => {
                let query = text.unwrap_or_default();
                self.text_turn(query, &history, &summary).await?
            }
        };

        debug!(user_id = %user_id, stage = %TurnStage::Synthesis, "synthesizing reply");
        let reply_text = self
            .synthesizer
            .synthesize(&prepared.context)
            .await
            .map_err(|e| TurnFailure::new(TurnStage::Synthesis, e))?;

        let timestamp = now_timestamp();
        self.persist(Exchange {
            user_id: user_id.clone(),
            conversation_id: request.conversation_id,
            user_query: prepared.query.clone(),
            image_ref: prepared.image_url.clone(),
            response: reply_text.clone(),
            context_snapshot: prepared.context,
            retrieved_items: prepared.items.clone(),
            timestamp: timestamp.clone(),
        });

        Ok(TurnReply {
            user_id,
            query: prepared.query,
            image_url: prepared.image_url,
            reply_text,
            items: prepared.items,
            timestamp,
            latency_seconds: started.elapsed().as_secs_f64(),
        })
    }

    async fn gather_context(&self, user_id: &str) -> (Vec<HistoryPair>, UserSummary) {
        let (history, summary) = tokio::join!(
            self.history.recent(user_id, self.settings.look_back),
            self.personalization.retrieve(user_id),
        );
        let history = history.unwrap_or_else(|e| {
            warn!(user_id, error = %e, "history unavailable, continuing without it");
            Vec::new()
        });
        let summary = match summary {
            Ok(found) => found.or_empty(user_id),
            Err(e) => {
                warn!(user_id, error = %e, "summary unavailable, continuing without it");
                UserSummary::empty(user_id)
            }
        };
        (history, summary)
    }

    async fn image_turn(
        &self,
        text: Option<String>,
        image: Vec<u8>,
        history: &[HistoryPair],
        summary: &UserSummary,
    ) -> Prepared {
        let query = text.unwrap_or_else(|| self.settings.image_query_fallback.clone());
        let kind = content_type::sniff(&image);
        debug!(stage = %TurnStage::Retrieval, mime = kind.mime, bytes = image.len(), "image turn");

        let (found, image_url) = tokio::join!(
            self.retrieval.retrieve_image(&image),
            self.upload(image.clone(), kind.mime),
        );
        let items = found.unwrap_or_else(|e| {
            warn!(error = %e, "image search unavailable, replying without products");
            Vec::new()
        });
        let context = image_context(&query, &items, history, summary);
        Prepared {
            query,
            image_url,
            items,
            context,
        }
    }

    async fn text_turn(
        &self,
        query: String,
        history: &[HistoryPair],
        summary: &UserSummary,
    ) -> Result<Prepared, TurnFailure> {
        debug!(stage = %TurnStage::Routing, "routing text turn");
        let decision = self
            .router
            .route(&query, history, summary)
            .await
            .map_err(|e| TurnFailure::new(TurnStage::Routing, e))?;
        let intent = if decision.intent.trim().is_empty() {
            query.clone()
        } else {
            decision.intent.clone()
        };

        let retrieved = match decision.search_query() {
            Some(search) => {
                debug!(stage = %TurnStage::Retrieval, collection = %search.collection, "searching");
                let collection = search.collection;
                let items = self.retrieval.retrieve(search).await.unwrap_or_else(|e| {
                    warn!(error = %e, "search unavailable, replying without context");
                    Vec::new()
                });
                Some((collection, items))
            }
            None => {
                debug!("answer already in context, skipping retrieval");
                None
            }
        };

        let context = text_context(
            &intent,
            &query,
            history,
            summary,
            retrieved.as_ref().map(|(c, items)| (*c, items.as_slice())),
        );
        Ok(Prepared {
            query,
            image_url: None,
            items: retrieved.map(|(_, items)| items).unwrap_or_default(),
            context,
        })
    }

    async fn upload(&self, bytes: Vec<u8>, mime: &str) -> Option<String> {
        let store = self.object_store.as_ref()?;
        match store.put(bytes, mime).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "image upload failed, continuing without URL");
                None
            }
        }
    }

    /// Writes the exchange to history and merges it into the summary.
    ///
    /// Runs on the tracker so it completes even if the caller goes away.
    fn persist(&self, exchange: Exchange) {
        let history = Arc::clone(&self.history);
        let personalization = Arc::clone(&self.personalization);
        self.writes.spawn(async move {
            let user_id = exchange.user_id.clone();
            let (logged, summarized) = tokio::join!(
                history.append(&exchange),
                personalization.create_or_update(&user_id, &exchange),
            );
            if let Err(e) = logged {
                warn!(
                    user_id = %user_id,
                    stage = %TurnStage::Persisting,
                    error = %e,
                    "failed to save history"
                );
                ezshop_prometheus::record_persistence_failure("history");
            }
            if let Err(e) = summarized {
                warn!(
                    user_id = %user_id,
                    stage = %TurnStage::Persisting,
                    error = %e,
                    "failed to update user summary"
                );
                ezshop_prometheus::record_persistence_failure("summary");
            }
            debug!(user_id = %user_id, stage = %TurnStage::Done, "turn persisted");
        });
    }

    /// Background writes still running.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Closes the write tracker and waits for pending writes.
    ///
    /// Returns `false` if writes were still running when `timeout` elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.writes.close();
        let pending = self.writes.len();
        if pending == 0 {
            info!("no pending writes to drain");
            return true;
        }
        info!(pending, "waiting for pending writes");
        match tokio::time::timeout(timeout, self.writes.wait()).await {
            Ok(()) => {
                info!("pending writes drained");
                true
            }
            Err(_) => {
                warn!(remaining = self.writes.len(), "drain timeout reached, writes interrupted");
                false
            }
        }
    }
}

fn validate(request: &TurnRequest) -> Result<(), EzshopError> {
    let mut fields = Vec::new();
    if request.user_id.trim().is_empty() {
        fields.push("user_id".to_string());
    }
    match &request.image {
        Some(image) if image.is_empty() => fields.push("image".to_string()),
        Some(_) => {}
        None => {
            if request.text.as_deref().is_none_or(|t| t.trim().is_empty()) {
                fields.push("text".to_string());
            }
        }
    }
    if fields.is_empty() {
        return Ok(());
    }
    Err(EzshopError::Validation {
        message: format!("missing or empty: {}", fields.join(", ")),
        fields,
    })
}
