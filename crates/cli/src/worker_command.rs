//! `relaymesh worker` — a single worker-runtime process (§4.D, §6).

use std::sync::Arc;

use clap::{Args, ValueEnum};

use relaymesh_config::{discover_worker_config, validate_worker, Severity};
use relaymesh_store::{redis_store::RedisStore, RoutingStore};
use relaymesh_worker::{EventCallback, EventHandlers, WorkerEvent, WorkerRuntime};

use crate::{shutdown, telemetry};

/// Where a newly-started worker begins reading its stream (§4.D "Cursor
/// initial value").
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StartPosition {
    Earliest,
    Latest,
}

/// CLI flags for a worker process. Every flag also reads from a
/// `RELAYMESH_*` environment variable (§6 Environment).
#[derive(Args, Debug)]
pub struct WorkerArgs {
    /// Worker id; auto-generated if omitted (§6 "worker id (required or auto-generated)").
    #[arg(long = "id", env = "RELAYMESH_WORKER_ID")]
    worker_id: Option<String>,

    /// Routing store URL (§4.A).
    #[arg(long, env = "RELAYMESH_ROUTING_STORE_URL")]
    routing_store_url: Option<String>,

    /// Max records pulled per `readRecords` call.
    #[arg(long, env = "RELAYMESH_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// How long a `readRecords` call blocks for new records.
    #[arg(long, env = "RELAYMESH_BLOCK_MS")]
    block_ms: Option<u64>,

    /// How often this worker refreshes its heartbeat.
    #[arg(long, env = "RELAYMESH_HEARTBEAT_INTERVAL_MS")]
    heartbeat_interval_ms: Option<u64>,

    /// How long a worker may go without a heartbeat before the router
    /// considers it dead (§3 "Worker registry entry").
    #[arg(long, env = "RELAYMESH_WORKER_TIMEOUT_MS")]
    worker_timeout_ms: Option<u64>,

    /// How long a channel may sit idle before the sweeper marks it
    /// inactive (§4.D "Inactivity sweeper").
    #[arg(long, env = "RELAYMESH_INACTIVITY_TIMEOUT_MS")]
    inactivity_timeout_ms: Option<u64>,

    /// Where to start reading this worker's stream on a fresh start.
    #[arg(long, env = "RELAYMESH_START_POSITION", value_enum)]
    start_position: Option<StartPosition>,

    #[arg(long, env = "RELAYMESH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "RELAYMESH_JSON_LOGS", default_value_t = false)]
    json_logs: bool,
}

pub async fn run(args: WorkerArgs) -> anyhow::Result<()> {
    telemetry::init(&args.log_level, args.json_logs);

    let mut config = discover_worker_config();
    apply_overrides(&mut config, &args);

    let validation = validate_worker(&config);
    for diagnostic in &validation.diagnostics {
        match diagnostic.severity {
            Severity::Error => tracing::error!(message = %diagnostic.message, "config error"),
            Severity::Warning => tracing::warn!(message = %diagnostic.message, "config warning"),
        }
    }
    if !validation.is_ok() {
        anyhow::bail!("invalid worker configuration, see logged errors above");
    }

    let store: Arc<dyn RoutingStore> =
        Arc::new(RedisStore::connect(&config.common.store.redis_url).await?);
    let runtime = WorkerRuntime::new(store, config, logging_event_handlers());

    runtime.start().await?;
    tracing::info!(worker_id = runtime.worker_id(), "worker running, awaiting shutdown signal");

    shutdown::wait_for_signal().await;

    tracing::info!(worker_id = runtime.worker_id(), "shutdown signal received, stopping gracefully");
    runtime.stop().await;
    Ok(())
}

fn apply_overrides(config: &mut relaymesh_config::WorkerConfig, args: &WorkerArgs) {
    if let Some(id) = &args.worker_id {
        config.worker_id = id.clone();
    } else if config.worker_id.trim().is_empty() {
        config.worker_id = format!("worker-{}", uuid::Uuid::new_v4());
    }
    if let Some(url) = &args.routing_store_url {
        config.common.store.redis_url = url.clone();
    }
    if let Some(v) = args.batch_size {
        config.read_batch_size = v;
    }
    if let Some(v) = args.block_ms {
        config.read_block_ms = v;
    }
    if let Some(ms) = args.heartbeat_interval_ms {
        config.heartbeat_interval_secs = ms_to_secs(ms);
    }
    if let Some(ms) = args.worker_timeout_ms {
        config.common.heartbeat_ttl_secs = ms_to_secs(ms);
    }
    if let Some(ms) = args.inactivity_timeout_ms {
        config.channel_inactivity_secs = ms_to_secs(ms);
    }
    if let Some(position) = args.start_position {
        config.read_from_earliest = matches!(position, StartPosition::Earliest);
    }
}

/// Config granularity is whole seconds; a sub-second override still rounds
/// up to at least one second rather than silently becoming zero.
fn ms_to_secs(ms: u64) -> u64 {
    ms.div_ceil(1_000).max(1)
}

/// Every worker event logged through `tracing` (§4.D "Event surface").
/// A production embedder of the worker SDK would wire its own callbacks
/// here instead; the CLI process only needs visibility, not dispatch.
fn logging_event_handlers() -> EventHandlers {
    EventHandlers {
        on_channel_active: Some(log_callback()),
        on_channel_message: Some(log_callback()),
        on_channel_inactive: Some(log_callback()),
        on_presence_join: Some(log_callback()),
        on_presence_leave: Some(log_callback()),
        on_error: Some(log_callback()),
    }
}

fn log_callback() -> EventCallback {
    Arc::new(|event: WorkerEvent| {
        Box::pin(async move {
            tracing::info!(?event, "worker event");
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_overrides_round_up_to_one_second() {
        assert_eq!(ms_to_secs(1), 1);
        assert_eq!(ms_to_secs(999), 1);
        assert_eq!(ms_to_secs(1_000), 1);
        assert_eq!(ms_to_secs(1_001), 2);
    }
}
