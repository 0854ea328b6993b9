// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end turn behavior against mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use ezshop_agent::{Orchestrator, Synthesizer, TurnRequest, TurnSettings, TurnStage};
use ezshop_config::model::{AgentConfig, MemoryConfig};
use ezshop_core::HistoryStore;
use ezshop_core::types::Exchange;
use ezshop_memory::{InMemoryCache, PersonalizationStore, Retrieved, Summarizer};
use ezshop_resilience::RetryPolicy;
use ezshop_router::{RetrievalGateway, Router};
use ezshop_test_utils::{
    MockGeneration, MockHistory, MockObjectStore, MockReply, MockSearch, SearchOutcome, item,
};

const ALREADY_KNOWN: &str =
    r#"{"needs_context": false, "intent": "hỏi giá", "query": "", "target": "already_known"}"#;
const FILTERED_PRODUCTS: &str = r#"{
    "needs_context": true,
    "intent": "Tìm áo thun dưới 100k",
    "query": "áo thun",
    "target": "products",
    "filter": {"price": {"$lte": 100000}}
}"#;
const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

struct Harness {
    orchestrator: Orchestrator,
    chat: Arc<MockGeneration>,
    summary_model: Arc<MockGeneration>,
    search: Arc<MockSearch>,
    history: Arc<MockHistory>,
    store: Arc<MockObjectStore>,
    personalization: Arc<PersonalizationStore>,
}

fn harness_with_store(store: MockObjectStore) -> Harness {
    let chat = Arc::new(MockGeneration::new());
    let summary_model = Arc::new(MockGeneration::new());
    let search = Arc::new(MockSearch::new());
    let history = Arc::new(MockHistory::new());
    let store = Arc::new(store);

    let summarizer = Summarizer::new(
        summary_model.clone(),
        "gpt-4o-mini",
        &MemoryConfig::default(),
        RetryPolicy::no_retry(),
        Duration::from_secs(5),
    );
    let personalization = Arc::new(PersonalizationStore::new(
        Arc::new(InMemoryCache::new()),
        Arc::new(summarizer),
        Duration::from_secs(86_400),
    ));

    let orchestrator = Orchestrator::new(
        history.clone(),
        personalization.clone(),
        Router::new(chat.clone(), "gpt-4o-mini", Duration::from_secs(5)).unwrap(),
        RetrievalGateway::new(search.clone(), Duration::from_secs(5)),
        Synthesizer::new(chat.clone(), "gpt-4o-mini", Duration::from_secs(5)),
        TurnSettings::from_config(&AgentConfig::default()),
    )
    .with_object_store(store.clone());

    Harness {
        orchestrator,
        chat,
        summary_model,
        search,
        history,
        store,
        personalization,
    }
}

fn harness() -> Harness {
    harness_with_store(MockObjectStore::new())
}

fn text(user_id: &str, text: &str) -> TurnRequest {
    TurnRequest {
        user_id: user_id.into(),
        conversation_id: Some("c1".into()),
        text: Some(text.into()),
        image: None,
    }
}

fn image(user_id: &str, text: Option<&str>) -> TurnRequest {
    TurnRequest {
        user_id: user_id.into(),
        conversation_id: Some("c1".into()),
        text: text.map(str::to_string),
        image: Some(PNG.to_vec()),
    }
}

async fn seed_history(history: &MockHistory, query: &str, response: &str) {
    history
        .append(&Exchange {
            user_id: "u1".into(),
            conversation_id: None,
            user_query: query.into(),
            image_ref: None,
            response: response.into(),
            context_snapshot: String::new(),
            retrieved_items: vec![],
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn price_follow_up_is_answered_without_retrieval() {
    let h = harness();
    seed_history(&h.history, "Nike Pegasus 40 màu đen?", "Có ạ, giá 2.990.000đ.").await;
    h.chat.push(MockReply::text(ALREADY_KNOWN)).await;
    h.chat.push(MockReply::text("Dạ, đôi này giá 2.990.000đ ạ.")).await;

    let reply = h.orchestrator.handle(text("u1", "Giá bao nhiêu?")).await.unwrap();

    assert_eq!(reply.reply_text, "Dạ, đôi này giá 2.990.000đ ạ.");
    assert!(reply.items.is_empty());
    assert_eq!(h.search.text_calls().await, 0);
    assert_eq!(h.search.image_calls(), 0);

    let requests = h.chat.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[0].user_content.contains("Nike Pegasus 40"));
    assert!(requests[1].user_content.starts_with("User's intent: hỏi giá\n"));
    assert!(!requests[1].user_content.contains("Relevant"));
}

#[tokio::test]
async fn empty_filtered_search_broadens_exactly_once() {
    let h = harness();
    h.chat.push(MockReply::text(FILTERED_PRODUCTS)).await;
    h.chat.push(MockReply::text("Dạ, có áo thun cotton ạ.")).await;
    h.search.push_text(SearchOutcome::Items(vec![])).await;
    h.search
        .push_text(SearchOutcome::Items(vec![item("p2", "Áo thun cotton")]))
        .await;

    let reply = h.orchestrator.handle(text("u1", "áo thun dưới 100k")).await.unwrap();

    assert_eq!(reply.items.len(), 1);
    assert_eq!(reply.items[0].id, "p2");
    let queries = h.search.text_queries().await;
    assert_eq!(queries.len(), 2);
    assert!(queries[0].filter.is_some());
    assert!(queries[1].filter.is_none());
    assert!(h.chat.requests().await[1].user_content.contains("Relevant products:[{"));
}

#[tokio::test]
async fn png_image_turn_uploads_and_skips_routing() {
    let h = harness();
    h.search
        .push_image(SearchOutcome::Items(vec![item("p9", "Kệ sách gỗ")]))
        .await;
    h.chat.push(MockReply::text("Dạ, đây là kệ sách gỗ ạ.")).await;

    let reply = h.orchestrator.handle(image("u1", None)).await.unwrap();

    assert!(reply.image_url.as_deref().unwrap().ends_with(".png"));
    assert_eq!(reply.query, "Tìm sản phẩm bằng hình");
    assert_eq!(reply.items[0].id, "p9");
    assert_eq!(h.store.uploads().await, vec![(PNG.len(), "image/png".to_string())]);

    assert_eq!(h.chat.calls(), 1, "only synthesis runs on image turns");
    assert_eq!(h.search.text_calls().await, 0);
    let context = &h.chat.requests().await[0].user_content;
    assert!(context.starts_with("User's intent: Tìm sản phẩm bằng hình\nRelevant products:[{"));
}

#[tokio::test]
async fn image_turn_with_text_uses_it_as_intent() {
    let h = harness();
    h.chat.push(MockReply::text("ok")).await;
    let reply = h
        .orchestrator
        .handle(image("u1", Some("Có màu trắng không?")))
        .await
        .unwrap();
    assert_eq!(reply.query, "Có màu trắng không?");
}

#[tokio::test]
async fn history_outage_degrades_to_empty_history() {
    let h = harness();
    h.history.fail_reads(true);
    h.chat.push(MockReply::text(ALREADY_KNOWN)).await;
    h.chat.push(MockReply::text("Chào bạn!")).await;

    let reply = h.orchestrator.handle(text("u1", "Xin chào")).await.unwrap();

    assert_eq!(reply.reply_text, "Chào bạn!");
    let router_input = &h.chat.requests().await[0].user_content;
    assert!(router_input.contains("Past conversations: No past conversations found."));
}

#[tokio::test]
async fn search_outage_degrades_to_no_context() {
    let h = harness();
    h.chat.push(MockReply::text(FILTERED_PRODUCTS)).await;
    h.chat.push(MockReply::text("Xin lỗi, hiện chưa tìm được sản phẩm.")).await;
    h.search.push_text(SearchOutcome::Unavailable).await;

    let reply = h.orchestrator.handle(text("u1", "áo thun")).await.unwrap();
    assert!(reply.items.is_empty());
    assert_eq!(h.search.text_calls().await, 1);
}

#[tokio::test]
async fn malformed_routing_output_fails_the_turn() {
    let h = harness();
    h.chat.push(MockReply::text("I think you want shoes")).await;

    let failure = h.orchestrator.handle(text("u1", "giày")).await.unwrap_err();

    assert_eq!(failure.stage, TurnStage::Routing);
    assert_eq!(h.chat.calls(), 1);
    assert!(h.orchestrator.drain(Duration::from_secs(1)).await);
    assert_eq!(h.history.append_calls(), 0);
}

#[tokio::test]
async fn synthesis_failure_fails_the_turn() {
    let h = harness();
    h.chat.push(MockReply::Permanent).await;

    let failure = h.orchestrator.handle(image("u1", None)).await.unwrap_err();

    assert_eq!(failure.stage, TurnStage::Synthesis);
    assert!(h.orchestrator.drain(Duration::from_secs(1)).await);
    assert_eq!(h.history.append_calls(), 0);
}

#[tokio::test]
async fn invalid_request_fails_before_any_call() {
    let h = harness();
    let failure = h.orchestrator.handle(text(" ", "hi")).await.unwrap_err();
    assert_eq!(failure.stage, TurnStage::Start);
    assert!(failure.into_error().is_client_error());
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn upload_failure_keeps_the_turn() {
    let h = harness_with_store(MockObjectStore::failing());
    h.chat.push(MockReply::text("Dạ, đây là sản phẩm tương tự ạ.")).await;

    let reply = h.orchestrator.handle(image("u1", None)).await.unwrap();

    assert!(reply.image_url.is_none());
    assert_eq!(h.search.image_calls(), 1);
}

#[tokio::test]
async fn write_failures_are_invisible_to_the_caller() {
    let h = harness();
    h.history.fail_writes(true);
    h.chat.push(MockReply::text(ALREADY_KNOWN)).await;
    h.chat.push(MockReply::text("Dạ vâng.")).await;

    let reply = h.orchestrator.handle(text("u1", "cảm ơn")).await.unwrap();
    assert_eq!(reply.reply_text, "Dạ vâng.");

    assert!(h.orchestrator.drain(Duration::from_secs(1)).await);
    assert_eq!(h.history.append_calls(), 1);
    assert!(h.history.entries().await.is_empty());
}

#[tokio::test]
async fn reply_is_persisted_and_summarized_in_the_background() {
    let h = harness();
    h.chat.push(MockReply::text(FILTERED_PRODUCTS)).await;
    h.chat.push(MockReply::text("Dạ, có áo thun cotton 99.000đ ạ.")).await;
    h.search
        .push_text(SearchOutcome::Items(vec![item("p2", "Áo thun cotton")]))
        .await;
    h.summary_model
        .push(MockReply::text(
            r#"{"personal_info": [], "preferences": ["áo thun giá rẻ"]}"#,
        ))
        .await;

    let reply = h.orchestrator.handle(text("u1", "áo thun dưới 100k")).await.unwrap();
    assert!(h.orchestrator.drain(Duration::from_secs(5)).await);
    assert_eq!(h.orchestrator.pending_writes(), 0);

    let entries = h.history.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_query, "áo thun dưới 100k");
    assert_eq!(entries[0].response, reply.reply_text);
    assert_eq!(entries[0].conversation_id.as_deref(), Some("c1"));
    assert_eq!(entries[0].retrieved_items[0].id, "p2");
    assert!(entries[0].context_snapshot.contains("Relevant products"));
    assert_eq!(entries[0].timestamp, reply.timestamp);

    match h.personalization.retrieve("u1").await.unwrap() {
        Retrieved::Found(summary) => assert_eq!(summary.preferences, vec!["áo thun giá rẻ"]),
        Retrieved::NotFound => panic!("summary should have been written"),
    }
}

#[tokio::test]
async fn next_turn_sees_the_previous_exchange() {
    let h = harness();
    h.chat.push(MockReply::text(ALREADY_KNOWN)).await;
    h.chat.push(MockReply::text("Chào Lan!")).await;
    h.orchestrator.handle(text("u1", "Mình tên Lan")).await.unwrap();
    assert!(h.orchestrator.drain(Duration::from_secs(1)).await);

    let pairs = h.history.recent("u1", 1).await.unwrap();
    assert_eq!(pairs, vec![("Mình tên Lan".to_string(), "Chào Lan!".to_string())]);
}
