//! Config validation, reported as a list of diagnostics rather than a
//! first-error-wins `Result` so a caller can surface everything wrong at
//! once.

use serde::Serialize;

use crate::schema::{GatewayConfig, WorkerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        });
    }
}

/// Token lifetimes must fall within the 1-24h window from §3.
const TOKEN_TTL_MIN_SECS: u64 = 3_600;
const TOKEN_TTL_MAX_SECS: u64 = 24 * 3_600;

/// Check that a store URL is at least well-formed, independent of whether
/// anything is listening on it.
fn check_redis_url(result: &mut ValidationResult, redis_url: &str) {
    if let Err(e) = url::Url::parse(redis_url) {
        result.error(format!("routing store url {redis_url:?} is not a valid url: {e}"));
    }
}

pub fn validate_gateway(config: &GatewayConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (name, ttl) in [
        ("session_token_ttl_secs", config.session_token_ttl_secs),
        ("broker_token_ttl_secs", config.broker_token_ttl_secs),
    ] {
        if !(TOKEN_TTL_MIN_SECS..=TOKEN_TTL_MAX_SECS).contains(&ttl) {
            result.error(format!(
                "{name} must be between {TOKEN_TTL_MIN_SECS} and {TOKEN_TTL_MAX_SECS} seconds, got {ttl}"
            ));
        }
    }

    if config.common.binding_cache_ttl_secs == 0 {
        result.warn("binding_cache_ttl_secs is 0: every resolve() re-reads the store");
    }

    check_redis_url(&mut result, &config.common.store.redis_url);

    result
}

pub fn validate_worker(config: &WorkerConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.worker_id.trim().is_empty() {
        result.error("worker_id must not be empty");
    }

    if config.heartbeat_interval_secs >= config.common.heartbeat_ttl_secs {
        result.error(format!(
            "heartbeat_interval_secs ({}) must be less than heartbeat_ttl_secs ({})",
            config.heartbeat_interval_secs, config.common.heartbeat_ttl_secs
        ));
    }

    if config.read_batch_size == 0 {
        result.error("read_batch_size must be at least 1");
    }

    check_redis_url(&mut result, &config.common.store.redis_url);

    result
}
