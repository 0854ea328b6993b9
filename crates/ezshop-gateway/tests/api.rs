// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use ezshop_agent::{Orchestrator, Synthesizer, TurnSettings};
use ezshop_config::model::{AgentConfig, MemoryConfig};
use ezshop_core::PluginAdapter;
use ezshop_gateway::{GatewayState, HealthState, app};
use ezshop_memory::{InMemoryCache, PersonalizationStore, Summarizer};
use ezshop_resilience::RetryPolicy;
use ezshop_router::{RetrievalGateway, Router};
use ezshop_test_utils::{
    MockGeneration, MockHistory, MockObjectStore, MockReply, MockSearch, SearchOutcome, item,
};

const ALREADY_KNOWN: &str =
    r#"{"needs_context": false, "intent": "chào hỏi", "query": "", "target": "already_known"}"#;
const BOUNDARY: &str = "ezshop-test-boundary";
const PNG: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

struct Fixture {
    app: axum::Router,
    chat: Arc<MockGeneration>,
    search: Arc<MockSearch>,
}

fn fixture_with(request_timeout: Duration, metrics: bool) -> Fixture {
    let chat = Arc::new(MockGeneration::new());
    let search = Arc::new(MockSearch::new());
    let history = Arc::new(MockHistory::new());

    let summarizer = Summarizer::new(
        Arc::new(MockGeneration::new()),
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
        personalization,
        Router::new(chat.clone(), "gpt-4o-mini", Duration::from_secs(300)).unwrap(),
        RetrievalGateway::new(search.clone(), Duration::from_secs(5)),
        Synthesizer::new(chat.clone(), "gpt-4o-mini", Duration::from_secs(300)),
        TurnSettings::from_config(&AgentConfig::default()),
    )
    .with_object_store(Arc::new(MockObjectStore::new()));

    let adapters: Vec<Arc<dyn PluginAdapter>> = vec![search.clone(), history];
    let mut health = HealthState::new(adapters);
    if metrics {
        health = health.with_metrics(Arc::new(|| "ezshop_turns_total 3\n".to_string()));
    }
    let state = GatewayState {
        orchestrator: Arc::new(orchestrator),
        request_timeout,
        health,
    };

    Fixture {
        app: app(state, 1024 * 1024),
        chat,
        search,
    }
}

fn fixture() -> Fixture {
    fixture_with(Duration::from_secs(120), false)
}

fn text_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/agent/text")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"shelf.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/agent/image")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn text_turn_returns_success_envelope() {
    let f = fixture();
    f.chat.push(MockReply::text(ALREADY_KNOWN)).await;
    f.chat.push(MockReply::text("Chào bạn, mình có thể giúp gì?")).await;

    let response = f
        .app
        .oneshot(text_request("conversation_id=c1&user_id=u1&text=Xin+ch%C3%A0o"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["action"], "get_response");
    assert_eq!(body["status"], "success");
    assert_eq!(body["response"]["user_id"], "u1");
    assert_eq!(body["response"]["query"], "Xin chào");
    assert_eq!(body["response"]["reply_text"], "Chào bạn, mình có thể giúp gì?");
    assert!(body["response"]["items"].as_array().unwrap().is_empty());
    assert!(body["response"].get("image_url").is_none());
    assert!(body["response"]["latency_seconds"].is_number());
}

#[tokio::test]
async fn text_turn_without_user_is_rejected() {
    let f = fixture();
    let response = f
        .app
        .oneshot(text_request("conversation_id=c1&text=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "Invalid input data");
    assert_eq!(f.chat.calls(), 0);
}

#[tokio::test]
async fn blank_user_fails_validation() {
    let f = fixture();
    let response = f
        .app
        .oneshot(text_request("conversation_id=c1&user_id=+&text=hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["message"]
        .as_str()
        .unwrap()
        .contains("user_id"));
}

#[tokio::test]
async fn routing_failure_is_a_generic_500() {
    let f = fixture();
    f.chat.push(MockReply::text("not json at all")).await;

    let response = f
        .app
        .oneshot(text_request("conversation_id=c1&user_id=u1&text=gi%C3%A0y"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["message"], "An unexpected error occurred");
}

#[tokio::test(start_paused = true)]
async fn slow_turn_times_out_with_504() {
    let f = fixture_with(Duration::from_secs(30), false);
    f.chat.push(MockReply::Hang).await;

    let response = f
        .app
        .oneshot(text_request("conversation_id=c1&user_id=u1&text=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["error"], "Gateway timeout");
}

#[tokio::test]
async fn image_turn_uploads_and_replies() {
    let f = fixture();
    f.search
        .push_image(SearchOutcome::Items(vec![item("p9", "Kệ sách gỗ")]))
        .await;
    f.chat.push(MockReply::text("Dạ, đây là kệ sách gỗ ạ.")).await;

    let response = f
        .app
        .oneshot(multipart_request(
            &[("conversation_id", "c1"), ("user_id", "u1")],
            Some(&PNG),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["response"]["query"], "Tìm sản phẩm bằng hình");
    assert_eq!(body["response"]["items"][0]["id"], "p9");
    assert!(body["response"]["image_url"].as_str().unwrap().ends_with(".png"));
}

#[tokio::test]
async fn image_turn_without_file_is_rejected() {
    let f = fixture();
    let response = f
        .app
        .oneshot(multipart_request(
            &[("conversation_id", "c1"), ("user_id", "u1"), ("text", "cái này")],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "invalid argument: missing image file");
    assert_eq!(f.search.image_calls(), 0);
}

#[tokio::test]
async fn image_route_rejects_non_multipart_body() {
    let f = fixture();
    let response = f
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/agent/image")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"user_id": "u1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid input data");
    assert_eq!(f.search.image_calls(), 0);
    assert_eq!(f.chat.calls(), 0);
}

#[tokio::test]
async fn health_reports_adapters() {
    let f = fixture();
    let response = f
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn metrics_are_served_only_when_enabled() {
    let disabled = fixture();
    let response = disabled
        .app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let enabled = fixture_with(Duration::from_secs(120), true);
    let response = enabled
        .app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ezshop_turns_total 3\n");
}
