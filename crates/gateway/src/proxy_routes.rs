//! The three broker proxy callbacks (§4.C): `connect`, `subscribe`,
//! `publish`. Each always answers HTTP 200, with `{result}` or
//! `{error:{code,message}}` in the body — the broker's proxy contract, not
//! ours to deviate from.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use relaymesh_channels::{enrich, user_channel_owner, validate_channel_name};
use relaymesh_store::keys::worker_stream_key;

use crate::{
    error::ProxyError,
    state::GatewayState,
};

fn ok(value: impl Serialize) -> impl IntoResponse {
    Json(serde_json::json!({ "result": value }))
}

fn err(error: ProxyError) -> impl IntoResponse {
    Json(serde_json::json!({ "error": error.body() }))
}

// ── Connect ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConnectData {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "userName")]
    user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    #[allow(dead_code)]
    client: Option<String>,
    #[allow(dead_code)]
    transport: Option<String>,
    #[allow(dead_code)]
    protocol: Option<String>,
    #[allow(dead_code)]
    encoding: Option<String>,
    data: Option<ConnectData>,
}

#[derive(Debug, Serialize)]
struct ConnectInfo {
    name: String,
}

#[derive(Debug, Serialize)]
struct ConnectResult {
    user: String,
    info: ConnectInfo,
}

/// `POST /centrifugo/connect` (§4.C "Connect").
pub async fn connect(
    State(state): State<GatewayState>,
    Json(req): Json<ConnectRequest>,
) -> impl IntoResponse {
    let Some(data) = req.data else {
        return err(ProxyError::missing_user_data()).into_response();
    };
    let (Some(user_id), Some(user_name)) = (data.user_id, data.user_name) else {
        return err(ProxyError::missing_user_data()).into_response();
    };

    match state.users.upsert(&user_id, &user_name).await {
        Ok(user) => ok(ConnectResult {
            user: user.id,
            info: ConnectInfo { name: user.name },
        })
        .into_response(),
        Err(e) => err(e.into()).into_response(),
    }
}

// ── Subscribe ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[allow(dead_code)]
    client: Option<String>,
    user: String,
    channel: String,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct SubscribeResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<serde_json::Value>,
}

/// `POST /centrifugo/subscribe` (§4.C "Subscribe").
pub async fn subscribe(
    State(state): State<GatewayState>,
    Json(req): Json<SubscribeRequest>,
) -> impl IntoResponse {
    if state.users.find_by_id(&req.user).await.is_none() {
        return err(ProxyError::user_not_found()).into_response();
    }

    if let Err(e) = validate_channel_name(&req.channel) {
        return err(e.into()).into_response();
    }

    if let Some(owner) = user_channel_owner(&req.channel) {
        if owner != req.user {
            return err(ProxyError::cannot_subscribe_other_user()).into_response();
        }
    }

    ok(SubscribeResult { info: req.data }).into_response()
}

// ── Publish ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct PublishData {
    text: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct PublishInfo {
    #[allow(dead_code)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    client: Option<String>,
    user: String,
    channel: String,
    data: PublishData,
    #[allow(dead_code)]
    info: Option<PublishInfo>,
}

#[derive(Debug, Serialize)]
struct PublishUser {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct PublishResultData {
    id: String,
    text: String,
    user: PublishUser,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct PublishResult {
    data: PublishResultData,
}

#[derive(Debug, Serialize)]
struct StreamPayload<'a> {
    id: &'a str,
    channel: &'a str,
    #[serde(rename = "workerId")]
    worker_id: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "userName")]
    user_name: &'a str,
    text: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
    /// The original, un-enriched publish payload as received from the
    /// broker (§6 stream entry field `raw`), so a worker can recover
    /// anything the typed fields above don't carry forward.
    raw: serde_json::Value,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none")]
    client_id: Option<&'a str>,
}

/// `POST /centrifugo/publish` (§4.C "Publish").
pub async fn publish(
    State(state): State<GatewayState>,
    Json(req): Json<PublishRequest>,
) -> impl IntoResponse {
    let Some(user) = state.users.find_by_id(&req.user).await else {
        return err(ProxyError::user_not_found()).into_response();
    };

    let raw = serde_json::to_value(&req.data).unwrap_or_default();

    let Some(serde_json::Value::String(raw_text)) = req.data.text else {
        return err(ProxyError::new(
            crate::error::ProxyCode::InvalidChannelOrMessage,
            "Message text must be a non-empty string",
        ))
        .into_response();
    };

    let message = match enrich(&raw_text, user, &req.channel) {
        Ok(message) => message,
        Err(e) => return err(e.into()).into_response(),
    };

    let worker_id = match state.router.resolve(&req.channel).await {
        Ok(worker_id) => worker_id,
        Err(e) => return err(e.into()).into_response(),
    };

    let payload = StreamPayload {
        id: &message.id,
        channel: &message.channel,
        worker_id: &worker_id,
        user_id: &message.user.id,
        user_name: &message.user.name,
        text: &message.text,
        timestamp: message.timestamp,
        raw,
        client_id: req.client.as_deref(),
    };
    let Ok(payload_bytes) = serde_json::to_vec(&payload) else {
        return err(ProxyError::internal("Failed to encode message")).into_response();
    };

    let stream_key = worker_stream_key(&worker_id);
    if let Err(e) = state.store.append_record(&stream_key, &payload_bytes).await {
        state.router.invalidate(&req.channel).await;
        return err(ProxyError::new(
            crate::error::ProxyCode::Internal,
            format!("Failed to process message: {e}"),
        ))
        .into_response();
    }

    ok(PublishResult {
        data: PublishResultData {
            id: message.id,
            text: message.text,
            user: PublishUser {
                id: message.user.id,
                name: message.user.name,
            },
            timestamp: message.timestamp,
        },
    })
    .into_response()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relaymesh_auth::{InMemoryUserRegistry, UserRegistry};
    use relaymesh_routing::{Router, RouterConfig};
    use relaymesh_store::{memory::MemoryStore, RoutingStore};

    use super::*;

    async fn state_with_worker() -> (GatewayState, String) {
        let store: Arc<dyn RoutingStore> = Arc::new(MemoryStore::new());
        store.register_worker("w0").await.unwrap();
        let router = Arc::new(Router::new(store.clone(), RouterConfig::default()));
        let users: Arc<dyn UserRegistry> = Arc::new(InMemoryUserRegistry::new());
        let state = GatewayState::new(
            store,
            router,
            users,
            relaymesh_auth::TokenConfig {
                session_secret: secrecy::SecretString::from("s".to_string()),
                broker_secret: secrecy::SecretString::from("b".to_string()),
                session_ttl: std::time::Duration::from_secs(3_600),
                broker_ttl: std::time::Duration::from_secs(3_600),
            },
        );
        (state, "w0".to_string())
    }

    #[tokio::test]
    async fn connect_rejects_missing_user_data() {
        let (state, _) = state_with_worker().await;
        let resp = connect(
            State(state),
            Json(ConnectRequest {
                client: None,
                transport: None,
                protocol: None,
                encoding: None,
                data: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn subscribe_rejects_unknown_user() {
        let (state, _) = state_with_worker().await;
        let resp = subscribe(
            State(state),
            Json(SubscribeRequest {
                client: None,
                user: "nope".to_string(),
                channel: "chat".to_string(),
                data: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn subscribe_rejects_other_users_channel() {
        let (state, _) = state_with_worker().await;
        let user = state.users.upsert("u1", "Alice").await.unwrap();

        let resp = subscribe(
            State(state.clone()),
            Json(SubscribeRequest {
                client: None,
                user: user.id.clone(),
                channel: "user:u2".to_string(),
                data: None,
            }),
        )
        .await
        .into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], 4003);

        let resp = subscribe(
            State(state),
            Json(SubscribeRequest {
                client: None,
                user: user.id.clone(),
                channel: format!("user:{}", user.id),
                data: None,
            }),
        )
        .await
        .into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("result").is_some());
    }

    #[tokio::test]
    async fn publish_appends_enriched_message_to_the_resolved_workers_stream() {
        let (state, worker_id) = state_with_worker().await;
        let user = state.users.upsert("u1", "Alice").await.unwrap();

        let resp = publish(
            State(state.clone()),
            Json(PublishRequest {
                client: Some("c1".to_string()),
                user: user.id.clone(),
                channel: "chat".to_string(),
                data: PublishData {
                    text: Some(serde_json::Value::String("hi".to_string())),
                },
                info: None,
            }),
        )
        .await
        .into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["result"]["data"]["text"], "hi");
        assert_eq!(json["result"]["data"]["user"]["id"], user.id);

        let stream_key = worker_stream_key(&worker_id);
        let records = state
            .store
            .read_records(
                &stream_key,
                &relaymesh_store::StreamCursor::Earliest,
                10,
                std::time::Duration::from_millis(0),
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        let record: serde_json::Value = serde_json::from_slice(&records[0].payload).unwrap();
        assert_eq!(record["raw"], serde_json::json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn publish_rejects_empty_text() {
        let (state, _) = state_with_worker().await;
        let user = state.users.upsert("u1", "Alice").await.unwrap();

        let resp = publish(
            State(state),
            Json(PublishRequest {
                client: None,
                user: user.id,
                channel: "chat".to_string(),
                data: PublishData {
                    text: Some(serde_json::Value::String("   ".to_string())),
                },
                info: None,
            }),
        )
        .await
        .into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], 4003);
    }
}
