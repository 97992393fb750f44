//! End-to-end smoke tests for the full firebridged stack.
//!
//! Each test wires the real hub client, Firestore client, sync engine,
//! runtime and axum router against wiremock servers standing in for the hub
//! and the store. The HTTP layer is exercised via `tower::ServiceExt::oneshot`
//! so no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firebridge_adapter_firestore::{FirestoreClient, StoreConfig};
use firebridge_adapter_http_axum::router;
use firebridge_adapter_http_axum::state::AppState;
use firebridge_adapter_hub::{HubClient, HubConfig};
use firebridge_app::engine::SyncEngine;
use firebridge_app::event_bus::InProcessEventBus;
use firebridge_app::memory::SyncMemory;
use firebridge_app::runtime::SyncRuntime;
use firebridge_domain::document::DocumentRecord;
use firebridge_domain::event::{ChangeKind, DocumentChange, HubEvent};
use firebridge_domain::id::DocumentKey;
use firebridge_domain::identity::IdentityMapper;

const COMMIT: &str = "/v1/projects/home-1234/databases/(default)/documents:commit";
const DOCUMENT_ROOT: &str = "projects/home-1234/databases/(default)/documents/device";

struct Stack {
    hub_server: MockServer,
    store_server: MockServer,
    hub: Arc<HubClient>,
    store: FirestoreClient,
    bus: Arc<InProcessEventBus>,
}

impl Stack {
    async fn start() -> Self {
        let hub_server = MockServer::start().await;
        let store_server = MockServer::start().await;

        let hub = HubClient::new(HubConfig {
            base_url: format!("{}/core", hub_server.uri()),
            token: SecretString::from("hub-token".to_string()),
            ..HubConfig::default()
        })
        .unwrap();
        let store = FirestoreClient::new(StoreConfig {
            base_url: format!("{}/v1", store_server.uri()),
            project_id: "home-1234".to_string(),
            ..StoreConfig::default()
        })
        .unwrap();

        Self {
            hub_server,
            store_server,
            hub: Arc::new(hub),
            store,
            bus: Arc::new(InProcessEventBus::new(64)),
        }
    }

    /// Feed the given inputs through a full runtime and wait until it drains.
    async fn run(&self, events: Vec<HubEvent>, changes: Vec<DocumentChange>) {
        let engine = SyncEngine::new(
            Arc::clone(&self.hub),
            self.store.clone(),
            Arc::new(SyncMemory::new()),
            IdentityMapper::new(),
        )
        .with_settle_delay(Duration::from_millis(20));
        let runtime = SyncRuntime::new(Arc::new(engine), Arc::clone(&self.bus));

        let (hub_tx, hub_rx) = mpsc::channel(16);
        let (doc_tx, doc_rx) = mpsc::channel(16);
        for event in events {
            hub_tx.send(event).await.unwrap();
        }
        for change in changes {
            doc_tx.send(change).await.unwrap();
        }
        drop(hub_tx);
        drop(doc_tx);

        tokio::time::timeout(Duration::from_secs(10), runtime.run(hub_rx, doc_rx))
            .await
            .unwrap();
    }

    fn app(&self) -> axum::Router {
        let state = AppState::new(Arc::clone(&self.hub), Arc::clone(&self.bus), true);
        router::build(state, "*")
    }
}

async fn body_json_of(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Hub → store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_propagate_hub_state_change_into_store() {
    let stack = Stack::start().await;

    Mock::given(method("POST"))
        .and(path(COMMIT))
        .and(body_partial_json(json!({
            "writes": [{
                "update": {
                    "name": format!("{DOCUMENT_ROOT}/living-room"),
                    "fields": {
                        "entity_id": {"stringValue": "light.living_room"},
                        "domain": {"stringValue": "light"},
                        "state": {"booleanValue": true}
                    }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&stack.store_server)
        .await;

    stack
        .run(
            vec![
                HubEvent::with_state("light.living_room", "on"),
                // Same state again: suppressed by the echo memory.
                HubEvent::with_state("light.living_room", "on"),
                // Not synchronized.
                HubEvent::with_state("sensor.temperature", "21.5"),
            ],
            vec![],
        )
        .await;
}

// ---------------------------------------------------------------------------
// Store → hub
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_reconcile_document_change_and_write_back_verified_state() {
    let stack = Stack::start().await;

    // Before the command the lamp is off, afterwards it is on.
    Mock::given(method("GET"))
        .and(path("/core/api/states/switch.lamp1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entity_id": "switch.lamp1", "state": "off"})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&stack.hub_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/api/states/switch.lamp1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entity_id": "switch.lamp1", "state": "on"})),
        )
        .mount(&stack.hub_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core/api/services/switch/turn_on"))
        .and(body_json(json!({"entity_id": "switch.lamp1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&stack.hub_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core/api/services/switch/toggle"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stack.hub_server)
        .await;

    Mock::given(method("POST"))
        .and(path(COMMIT))
        .and(body_partial_json(json!({
            "writes": [{
                "update": {
                    "name": format!("{DOCUMENT_ROOT}/lamp1"),
                    "fields": {"state": {"booleanValue": true}}
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&stack.store_server)
        .await;

    let change = DocumentChange::new(
        ChangeKind::Modified,
        DocumentKey::new("lamp1"),
        DocumentRecord {
            entity_id: Some("switch.lamp1".to_string()),
            domain: Some("switch".to_string()),
            state: Some(true),
            updated_at: None,
        },
    );

    stack.run(vec![], vec![change]).await;
}

#[tokio::test]
async fn should_skip_command_when_hub_already_matches() {
    let stack = Stack::start().await;

    Mock::given(method("GET"))
        .and(path("/core/api/states/light.kitchen"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entity_id": "light.kitchen", "state": "off"})),
        )
        .expect(1)
        .mount(&stack.hub_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stack.hub_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stack.store_server)
        .await;

    let change = DocumentChange::new(
        ChangeKind::Modified,
        DocumentKey::new("kitchen"),
        DocumentRecord {
            domain: Some("light".to_string()),
            state: Some(false),
            ..DocumentRecord::default()
        },
    );

    stack.run(vec![], vec![change]).await;
}

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_health_with_store_enabled() {
    let stack = Stack::start().await;

    let response = stack
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json_of(response).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["store_enabled"], true);
}

#[tokio::test]
async fn should_proxy_hub_states_listing() {
    let stack = Stack::start().await;
    let listing = json!([{"entity_id": "switch.lamp1", "state": "on"}]);

    Mock::given(method("GET"))
        .and(path("/core/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
        .mount(&stack.hub_server)
        .await;

    let response = stack
        .app()
        .oneshot(Request::builder().uri("/api/states").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_of(response).await, listing);
}

#[tokio::test]
async fn should_return_bad_gateway_when_hub_is_down() {
    let stack = Stack::start().await;

    Mock::given(method("GET"))
        .and(path("/core/api/states"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&stack.hub_server)
        .await;

    let response = stack
        .app()
        .oneshot(Request::builder().uri("/api/states").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_json_of(response).await["error"].is_string());
}

#[tokio::test]
async fn should_send_manual_state_change_as_explicit_service() {
    let stack = Stack::start().await;

    Mock::given(method("POST"))
        .and(path("/core/api/services/light/turn_off"))
        .and(body_json(json!({"entity_id": "light.kitchen"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"entity_id": "light.kitchen", "state": "off"}])),
        )
        .expect(1)
        .mount(&stack.hub_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core/api/services/light/toggle"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stack.hub_server)
        .await;

    let response = stack
        .app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/state")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"entity_id": "light.kitchen", "state": false}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json_of(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"][0]["state"], "off");
}

#[tokio::test]
async fn should_forward_service_call_to_hub() {
    let stack = Stack::start().await;

    Mock::given(method("POST"))
        .and(path("/core/api/services/light/turn_on"))
        .and(body_json(json!({"entity_id": "light.kitchen", "brightness": 80})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&stack.hub_server)
        .await;

    let response = stack
        .app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/service")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "service": "light/turn_on",
                        "entity_id": "light.kitchen",
                        "data": {"brightness": 80}
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_of(response).await["service"], "light/turn_on");
}
