//! `GET /health` (§6 **[AMBIENT]**): a best-effort routing-store ping
//! folded into the reported status.

use axum::{extract::State, response::IntoResponse, Json};

use crate::state::GatewayState;

/// `GET /health` — `{status, timestamp}`; `status` degrades to
/// `"degraded"` when the routing store cannot be reached.
pub async fn health(State(state): State<GatewayState>) -> impl IntoResponse {
    let status = match state.store.list_active_workers().await {
        Ok(_) => "ok",
        Err(_) => "degraded",
    };

    Json(serde_json::json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use relaymesh_auth::InMemoryUserRegistry;
    use relaymesh_routing::{Router, RouterConfig};
    use relaymesh_store::memory::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn reports_ok_when_store_reachable() {
        let store = Arc::new(MemoryStore::new());
        let state = GatewayState::new(
            store.clone(),
            Arc::new(Router::new(store, RouterConfig::default())),
            Arc::new(InMemoryUserRegistry::new()),
            relaymesh_auth::TokenConfig {
                session_secret: secrecy::SecretString::from("s".to_string()),
                broker_secret: secrecy::SecretString::from("b".to_string()),
                session_ttl: Duration::from_secs(3_600),
                broker_ttl: Duration::from_secs(3_600),
            },
        );

        let resp = health(State(state)).await.into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
    }
}
