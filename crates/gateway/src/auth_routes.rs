//! `POST /auth/login` (§4.E, §6).

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct UserDto {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    user: UserDto,
    token: String,
    #[serde(rename = "centrifugoToken")]
    centrifugo_token: String,
}

/// `POST /auth/login` — `{name}` → `{user:{id,name}, token, centrifugoToken}`
/// (§4.E steps 1–4), or 400 on an invalid name.
pub async fn login(
    State(state): State<GatewayState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match state.users.upsert_by_name(&req.name).await {
        Ok(user) => user,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response()
        },
    };

    let token = state.tokens.mint_session_token(&user.id, &user.name);
    let centrifugo_token = state.tokens.mint_broker_token(&user.id, &user.name);

    Json(LoginResponse {
        user: UserDto {
            id: user.id,
            name: user.name,
        },
        token,
        centrifugo_token,
    })
    .into_response()
}
