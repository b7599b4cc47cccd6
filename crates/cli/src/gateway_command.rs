//! `relaymesh gateway` — the callback/HTTP process (§4.C, §4.E, §6).

use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Args;
use secrecy::SecretString;

use relaymesh_auth::{InMemoryUserRegistry, TokenConfig};
use relaymesh_config::{discover_gateway_config, validate_gateway, Severity};
use relaymesh_routing::{Router, RouterConfig};
use relaymesh_store::{redis_store::RedisStore, RoutingStore};

use crate::{shutdown, telemetry};

/// CLI flags for the gateway process. Every flag also reads from a
/// `RELAYMESH_*` environment variable (§6 Environment) and falls back to
/// `relaymesh.toml` / hardcoded defaults when omitted.
#[derive(Args, Debug)]
pub struct GatewayArgs {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "RELAYMESH_BIND")]
    bind: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "RELAYMESH_PORT")]
    port: Option<u16>,

    /// Routing store URL (§4.A).
    #[arg(long, env = "RELAYMESH_ROUTING_STORE_URL")]
    routing_store_url: Option<String>,

    /// Secret used to sign session tokens (§4.E).
    #[arg(long, env = "RELAYMESH_SESSION_SECRET")]
    session_secret: String,

    /// Secret used to sign broker tokens (§4.E).
    #[arg(long, env = "RELAYMESH_BROKER_SECRET")]
    broker_secret: String,

    /// Session token lifetime in seconds, clamped to 1-24h (§3).
    #[arg(long, env = "RELAYMESH_SESSION_TTL_SECS")]
    session_ttl_secs: Option<u64>,

    /// Broker token lifetime in seconds, clamped to 1-24h (§3).
    #[arg(long, env = "RELAYMESH_BROKER_TTL_SECS")]
    broker_ttl_secs: Option<u64>,

    #[arg(long, env = "RELAYMESH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "RELAYMESH_JSON_LOGS", default_value_t = false)]
    json_logs: bool,
}

pub async fn run(args: GatewayArgs) -> anyhow::Result<()> {
    telemetry::init(&args.log_level, args.json_logs);

    let mut config = discover_gateway_config();
    apply_overrides(&mut config, &args);

    let validation = validate_gateway(&config);
    for diagnostic in &validation.diagnostics {
        match diagnostic.severity {
            Severity::Error => tracing::error!(message = %diagnostic.message, "config error"),
            Severity::Warning => tracing::warn!(message = %diagnostic.message, "config warning"),
        }
    }
    if !validation.is_ok() {
        anyhow::bail!("invalid gateway configuration, see logged errors above");
    }

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {:?}: {e}", config.bind_addr))?;

    let store: Arc<dyn RoutingStore> =
        Arc::new(RedisStore::connect(&config.common.store.redis_url).await?);
    let router = Arc::new(Router::new(
        Arc::clone(&store),
        RouterConfig {
            worker_timeout: config.common.heartbeat_ttl(),
            cache_ttl: config.common.binding_cache_ttl(),
        },
    ));
    let users = Arc::new(InMemoryUserRegistry::new());
    let tokens = TokenConfig {
        session_secret: SecretString::from(args.session_secret),
        broker_secret: SecretString::from(args.broker_secret),
        session_ttl: TokenConfig::clamp_ttl(Duration::from_secs(config.session_token_ttl_secs)),
        broker_ttl: TokenConfig::clamp_ttl(Duration::from_secs(config.broker_token_ttl_secs)),
    };

    let state = relaymesh_gateway::GatewayState::new(store, router, users, tokens);
    relaymesh_gateway::serve_with_shutdown(addr, state, shutdown::wait_for_signal()).await
}

fn apply_overrides(config: &mut relaymesh_config::GatewayConfig, args: &GatewayArgs) {
    if args.bind.is_some() || args.port.is_some() {
        let host = args.bind.clone().unwrap_or_else(|| host_of(&config.bind_addr));
        let port = args.port.unwrap_or_else(|| port_of(&config.bind_addr));
        config.bind_addr = format!("{host}:{port}");
    }
    if let Some(url) = &args.routing_store_url {
        config.common.store.redis_url = url.clone();
    }
    if let Some(ttl) = args.session_ttl_secs {
        config.session_token_ttl_secs = ttl;
    }
    if let Some(ttl) = args.broker_ttl_secs {
        config.broker_token_ttl_secs = ttl;
    }
}

fn host_of(bind_addr: &str) -> String {
    bind_addr
        .rsplit_once(':')
        .map_or_else(|| bind_addr.to_string(), |(host, _)| host.to_string())
}

fn port_of(bind_addr: &str) -> u16 {
    bind_addr
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse().ok())
        .unwrap_or(8080)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_port_split_default_bind_addr() {
        assert_eq!(host_of("0.0.0.0:8080"), "0.0.0.0");
        assert_eq!(port_of("0.0.0.0:8080"), 8080);
    }
}
