// tests/api_http.rs
//
// HTTP-level tests for the command surface without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /health
// - POST /cycle          (missing parameter, happy path)
// - GET  /alerts/pending
// - POST /alerts/{id}/ack (unknown id, tracked id)

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use escalation_alert_engine::classify::ClassifyGateway;
use escalation_alert_engine::dedup::SeenSet;
use escalation_alert_engine::relevance::RelevanceFilter;
use escalation_alert_engine::retry::AlertTracker;
use escalation_alert_engine::{
    api, AlertPayload, ChannelSource, CycleEngine, Notifier, Oracle, RawMessage,
};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct StubSource;

#[async_trait::async_trait]
impl ChannelSource for StubSource {
    async fn fetch_recent(&self, _channel: &str, _limit: usize) -> anyhow::Result<Vec<RawMessage>> {
        Ok(vec![RawMessage {
            id: 31337,
            date: Utc::now().timestamp() - 60,
            message: "Rocket attack confirmed by the Pentagon".into(),
        }])
    }
    async fn is_connected(&self) -> bool {
        true
    }
    async fn reconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn name(&self) -> &'static str {
        "stub"
    }
}

struct ConfirmingOracle;

#[async_trait::async_trait]
impl Oracle for ConfirmingOracle {
    async fn generate(&self, _model: &str, _prompt: &str) -> anyhow::Result<String> {
        Ok(r#"[{"id":0,"confirmed":true,"confidence":92,"reason":"official"}]"#.into())
    }
    fn name(&self) -> &'static str {
        "confirming"
    }
}

#[derive(Clone, Default)]
struct SilentNotifier {
    sends: Arc<Mutex<Vec<AlertPayload>>>,
}

#[async_trait::async_trait]
impl Notifier for SilentNotifier {
    async fn send(&self, payload: &AlertPayload) -> anyhow::Result<()> {
        self.sends.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Build the same Router the binary uses, on stub collaborators.
fn test_router() -> Router {
    let notifier = SilentNotifier::default();
    let tracker = AlertTracker::with_policy(
        Arc::new(notifier.clone()),
        Duration::from_secs(3600),
        3,
    );
    let engine = Arc::new(CycleEngine::new(
        Arc::new(StubSource),
        ClassifyGateway::new(Arc::new(ConfirmingOracle)),
        Arc::new(notifier),
        tracker,
        SeenSet::new(),
        Arc::new(RelevanceFilter::from_toml().expect("rules")),
        vec!["testchan".to_string()],
    ));
    api::create_router(api::AppState { engine })
}

async fn json_body(resp: shuttle_axum::axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "ok");
}

#[tokio::test]
async fn cycle_without_channel_is_a_400() {
    let app = test_router();

    let req = Request::builder()
        .method("POST")
        .uri("/cycle")
        .body(Body::empty())
        .expect("build POST /cycle");

    let resp = app.oneshot(req).await.expect("oneshot /cycle");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v = json_body(resp).await;
    assert_eq!(v["error"], "Missing channel parameter");
}

#[tokio::test]
async fn ack_of_unknown_alert_is_not_found_not_an_error() {
    let app = test_router();

    let req = Request::builder()
        .method("POST")
        .uri("/alerts/does-not-exist/ack")
        .body(Body::empty())
        .expect("build POST ack");

    let resp = app.oneshot(req).await.expect("oneshot ack");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let v = json_body(resp).await;
    assert_eq!(v["status"], "not_found");
}

#[tokio::test]
async fn pending_starts_empty() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/alerts/pending")
        .body(Body::empty())
        .expect("build GET pending");

    let resp = app.oneshot(req).await.expect("oneshot pending");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v, serde_json::json!([]));
}

#[tokio::test]
async fn full_flow_cycle_then_pending_then_ack() {
    let app = test_router();

    // Trigger one cycle by configured-channel index.
    let req = Request::builder()
        .method("POST")
        .uri("/cycle?channel=0")
        .body(Body::empty())
        .expect("build POST /cycle");
    let resp = app.clone().oneshot(req).await.expect("oneshot cycle");
    assert_eq!(resp.status(), StatusCode::OK);
    let report = json_body(resp).await;
    assert_eq!(report["channel"], "testchan");
    assert_eq!(report["batch"], 1);
    assert_eq!(report["confirmed"], 1);
    assert_eq!(report["dispatched"], true);

    // The confirmed alert shows up in the pending view.
    let req = Request::builder()
        .method("GET")
        .uri("/alerts/pending")
        .body(Body::empty())
        .expect("build GET pending");
    let resp = app.clone().oneshot(req).await.expect("oneshot pending");
    let pending = json_body(resp).await;
    assert_eq!(pending[0]["alert_id"], "31337");
    assert_eq!(pending[0]["retry_count"], 0);

    // Acknowledge it; the pending view empties.
    let req = Request::builder()
        .method("POST")
        .uri("/alerts/31337/ack")
        .body(Body::empty())
        .expect("build POST ack");
    let resp = app.clone().oneshot(req).await.expect("oneshot ack");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["status"], "acknowledged");

    let req = Request::builder()
        .method("GET")
        .uri("/alerts/pending")
        .body(Body::empty())
        .expect("build GET pending");
    let resp = app.oneshot(req).await.expect("oneshot pending");
    let pending = json_body(resp).await;
    assert_eq!(pending, serde_json::json!([]));
}
