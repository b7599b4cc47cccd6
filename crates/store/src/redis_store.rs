//! Redis-backed [`RoutingStore`] (§4.A): sorted sets for the worker
//! registry, plain strings for channel bindings, Redis Streams for the
//! per-worker durable log.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::error::Context;
use crate::keys::WORKERS_ACTIVE;
use crate::{now_ms, Result, RoutingStore, StreamCursor, StreamRecord, StreamSeq};

/// A [`RoutingStore`] backed by a single Redis connection, auto-reconnecting
/// via [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).inspect_err(|e| {
            warn!(error = %e, "routing store url rejected by redis client");
        })?;
        let conn = client
            .get_connection_manager()
            .await
            .inspect_err(|e| warn!(error = %e, "failed to connect to routing store"))
            .context(format!("connecting to routing store at {url}"))?;
        info!("connected to routing store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl RoutingStore for RedisStore {
    async fn register_worker(&self, worker_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(WORKERS_ACTIVE, worker_id, now_ms()).await?;
        Ok(())
    }

    async fn update_heartbeat(&self, worker_id: &str) -> Result<()> {
        self.register_worker(worker_id).await
    }

    async fn unregister_worker(&self, worker_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(WORKERS_ACTIVE, worker_id).await?;
        Ok(())
    }

    async fn list_active_workers(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let workers: Vec<String> = conn.zrange(WORKERS_ACTIVE, 0, -1).await?;
        Ok(workers)
    }

    async fn get_heartbeat(&self, worker_id: &str) -> Result<Option<i64>> {
        let mut conn = self.conn.clone();
        let score: Option<i64> = conn.zscore(WORKERS_ACTIVE, worker_id).await?;
        Ok(score)
    }

    async fn get_binding(&self, channel: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let worker_id: Option<String> = conn.get(crate::keys::binding_key(channel)).await?;
        Ok(worker_id)
    }

    async fn set_binding(&self, channel: &str, worker_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(crate::keys::binding_key(channel), worker_id).await?;
        Ok(())
    }

    async fn delete_binding(&self, channel: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(crate::keys::binding_key(channel)).await?;
        Ok(())
    }

    async fn append_record(&self, stream_key: &str, payload: &[u8]) -> Result<StreamSeq> {
        let mut conn = self.conn.clone();
        let seq: String = conn.xadd(stream_key, "*", &[("payload", payload)]).await?;
        Ok(seq)
    }

    async fn read_records(
        &self,
        stream_key: &str,
        from: &StreamCursor,
        max_count: usize,
        block: Duration,
    ) -> Result<Vec<StreamRecord>> {
        let mut conn = self.conn.clone();
        let id = match from {
            StreamCursor::Earliest => "0".to_string(),
            StreamCursor::Latest => "$".to_string(),
            StreamCursor::After(seq) => seq.clone(),
        };

        let opts = StreamReadOptions::default()
            .count(max_count)
            .block(block.as_millis() as usize);

        let reply: StreamReadReply = conn
            .xread_options(&[stream_key], &[id.as_str()], &opts)
            .await?;

        let mut records = Vec::new();
        for stream_key_reply in reply.keys {
            for entry in stream_key_reply.ids {
                let payload: Vec<u8> = entry
                    .map
                    .get("payload")
                    .and_then(|v| redis::from_redis_value::<Vec<u8>>(v).ok())
                    .unwrap_or_default();
                records.push(StreamRecord {
                    seq: entry.id,
                    payload,
                });
            }
        }
        Ok(records)
    }
}
