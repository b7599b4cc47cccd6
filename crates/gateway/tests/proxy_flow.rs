#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests driving the gateway's HTTP surface over a real TCP
//! listener, the way the teacher's own gateway integration tests do
//! (`tests/auth_middleware.rs`): bind `127.0.0.1:0`, spawn `axum::serve`,
//! then talk to it with `reqwest`. Covers spec.md §8 scenarios S1
//! (login), S2 (connect + publish), and S4 (subscribe authorization).

use std::{net::SocketAddr, sync::Arc, time::Duration};

use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use relaymesh_auth::{InMemoryUserRegistry, TokenConfig, UserRegistry};
use relaymesh_gateway::{build_router, GatewayState};
use relaymesh_routing::{Router, RouterConfig};
use relaymesh_store::{memory::MemoryStore, keys::worker_stream_key, RoutingStore, StreamCursor};

async fn start_server() -> (SocketAddr, GatewayState) {
    let store: Arc<dyn RoutingStore> = Arc::new(MemoryStore::new());
    store.register_worker("w0").await.unwrap();

    let router = Arc::new(Router::new(Arc::clone(&store), RouterConfig::default()));
    let users = Arc::new(InMemoryUserRegistry::new());
    let tokens = TokenConfig {
        session_secret: SecretString::from("session-secret".to_string()),
        broker_secret: SecretString::from("broker-secret".to_string()),
        session_ttl: Duration::from_secs(3_600),
        broker_ttl: Duration::from_secs(3_600),
    };
    let state = GatewayState::new(store, router, users, tokens);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

#[tokio::test]
async fn s1_login_happy_path_is_idempotent_on_user_id() {
    let (addr, _state) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"name": "Alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let first: Value = resp.json().await.unwrap();
    assert_eq!(first["user"]["name"], "Alice");
    assert!(first["token"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(first["centrifugoToken"].as_str().is_some_and(|s| !s.is_empty()));

    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"name": "Alice"}))
        .send()
        .await
        .unwrap();
    let second: Value = resp.json().await.unwrap();
    assert_eq!(first["user"]["id"], second["user"]["id"]);
}

#[tokio::test]
async fn s2_connect_then_publish_lands_one_record_on_the_resolved_worker() {
    let (addr, state) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/centrifugo/connect"))
        .json(&json!({
            "client": "c1",
            "transport": "websocket",
            "protocol": "json",
            "encoding": "json",
            "data": {"userId": "u1", "userName": "Alice"},
        }))
        .send()
        .await
        .unwrap();
    let connect_body: Value = resp.json().await.unwrap();
    assert!(connect_body.get("result").is_some());

    let resp = client
        .post(format!("http://{addr}/centrifugo/publish"))
        .json(&json!({
            "client": "c1",
            "user": "u1",
            "channel": "chat",
            "data": {"text": "hi"},
            "info": {"name": "Alice"},
        }))
        .send()
        .await
        .unwrap();
    let publish_body: Value = resp.json().await.unwrap();
    let data = &publish_body["result"]["data"];
    assert_eq!(data["text"], "hi");
    assert_eq!(data["user"]["id"], "u1");
    assert_eq!(data["user"]["name"], "Alice");
    assert!(data["id"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(data["timestamp"].as_str().is_some());

    let worker_id = state.router.resolve("chat").await.unwrap();
    let records = state
        .store
        .read_records(
            &worker_stream_key(&worker_id),
            &StreamCursor::Earliest,
            10,
            Duration::from_millis(0),
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn s4_subscribe_authorization() {
    let (addr, state) = start_server().await;
    state.users.upsert("u1", "Alice").await.unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/centrifugo/subscribe"))
        .json(&json!({"client": "c1", "user": "u1", "channel": "user:u2"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], 4003);
    assert_eq!(body["error"]["message"], "Cannot subscribe to other user channels");

    let resp = client
        .post(format!("http://{addr}/centrifugo/subscribe"))
        .json(&json!({"client": "c1", "user": "u1", "channel": "user:u1"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("result").is_some());

    let resp = client
        .post(format!("http://{addr}/centrifugo/subscribe"))
        .json(&json!({"client": "c1", "user": "u1", "channel": "news"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], 4003);
    assert_eq!(body["error"]["message"], "Invalid channel");
}
