//! Config schema: the settings a gateway or worker process needs at
//! startup (§6). Every field here also has a CLI flag/env-var counterpart
//! on the relevant `relaymesh-cli` subcommand — the config file is an
//! alternative to passing them all on the command line, not the only way
//! to set them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the routing store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub redis_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Settings shared by every relaymesh process (§4.A, §4.B).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    pub store: StoreConfig,
    /// How long a worker is considered live after its last heartbeat.
    pub heartbeat_ttl_secs: u64,
    /// How long the router's local binding cache is trusted before re-read.
    pub binding_cache_ttl_secs: u64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            heartbeat_ttl_secs: 30,
            binding_cache_ttl_secs: 5,
        }
    }
}

impl CommonConfig {
    #[must_use]
    pub fn heartbeat_ttl(&self) -> Duration {
        Duration::from_secs(self.heartbeat_ttl_secs)
    }

    #[must_use]
    pub fn binding_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.binding_cache_ttl_secs)
    }
}

/// Gateway process settings (§4.C, §4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub common: CommonConfig,
    pub bind_addr: String,
    /// Session token lifetime, clamped to the 1-24h range from §3.
    pub session_token_ttl_secs: u64,
    /// Broker token lifetime, clamped to the 1-24h range from §3.
    pub broker_token_ttl_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            bind_addr: "0.0.0.0:8080".to_string(),
            session_token_ttl_secs: 3600,
            broker_token_ttl_secs: 3600,
        }
    }
}

/// Worker process settings (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub common: CommonConfig,
    pub worker_id: String,
    /// Heartbeat refresh period; must be well under `heartbeat_ttl_secs`.
    pub heartbeat_interval_secs: u64,
    /// Max records pulled per `readRecords` call.
    pub read_batch_size: usize,
    /// How long a `readRecords` call blocks waiting for new records.
    pub read_block_ms: u64,
    /// Start reading each newly observed stream from the beginning rather
    /// than only new records.
    pub read_from_earliest: bool,
    /// How long a channel may sit idle before it is swept to `Inactive`.
    pub channel_inactivity_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            worker_id: "worker-0".to_string(),
            heartbeat_interval_secs: 10,
            read_batch_size: 100,
            read_block_ms: 5_000,
            read_from_earliest: false,
            channel_inactivity_secs: 30,
        }
    }
}
