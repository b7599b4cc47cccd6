//! HTTP server wiring (§4.C, §6, §4.E): builds the `axum::Router` and
//! serves it.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::{auth_routes, health, proxy_routes, state::GatewayState};

/// Build the gateway router over `state` (shared between production
/// startup and tests).
#[must_use]
pub fn build_router(state: GatewayState) -> Router {
    let http_trace = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth_routes::login))
        .route("/centrifugo/connect", post(proxy_routes::connect))
        .route("/centrifugo/subscribe", post(proxy_routes::subscribe))
        .route("/centrifugo/publish", post(proxy_routes::publish))
        .layer(http_trace)
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Bind `addr` and serve the gateway router until the process is killed.
pub async fn serve(addr: SocketAddr, state: GatewayState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "relaymesh-gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Same as [`serve`], but stops accepting new connections and returns once
/// `shutdown` resolves — the graceful-shutdown entry point used by
/// `relaymesh-cli` to honor SIGINT/SIGTERM (§6 "CLI").
pub async fn serve_with_shutdown<F>(addr: SocketAddr, state: GatewayState, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "relaymesh-gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
