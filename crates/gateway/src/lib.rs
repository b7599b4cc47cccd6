//! The gateway process: the HTTP surface over the proxy callbacks (§4.C)
//! and token issuance (§4.E), plus the ambient `/health` endpoint.
//!
//! Domain logic lives in `relaymesh-channels`, `relaymesh-routing`, and
//! `relaymesh-auth`; this crate only wires HTTP requests to it through
//! [`state::GatewayState`].

pub mod auth_routes;
pub mod error;
pub mod health;
pub mod proxy_routes;
pub mod server;
pub mod state;

pub use {
    server::{build_router, serve, serve_with_shutdown},
    state::GatewayState,
};
