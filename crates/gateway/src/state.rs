//! Shared state injected into every handler (§4.C, §4.E).

use std::sync::Arc;

use relaymesh_auth::{token::TokenConfig, UserRegistry};
use relaymesh_routing::Router;
use relaymesh_store::RoutingStore;

/// State shared across the HTTP surface. Handlers depend on this, never
/// the reverse (§9 "Cyclic references between the Router and callback
/// handlers").
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn RoutingStore>,
    pub router: Arc<Router>,
    pub users: Arc<dyn UserRegistry>,
    pub tokens: TokenConfig,
}

impl GatewayState {
    #[must_use]
    pub fn new(
        store: Arc<dyn RoutingStore>,
        router: Arc<Router>,
        users: Arc<dyn UserRegistry>,
        tokens: TokenConfig,
    ) -> Self {
        Self {
            store,
            router,
            users,
            tokens,
        }
    }
}
