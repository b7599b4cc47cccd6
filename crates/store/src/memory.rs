//! In-process [`RoutingStore`] used by unit tests for the router and
//! worker so they never need a live Redis instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::{now_ms, Result, RoutingStore, StreamCursor, StreamRecord, StreamSeq};

#[derive(Default)]
struct Stream {
    records: Vec<StreamRecord>,
    notify: Notify,
}

/// In-memory stand-in for the Redis-backed store. Cheap to clone (internally
/// `Arc`-wrapped) so a single instance can be shared across a test's
/// simulated gateway/router/worker processes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    registry: Arc<RwLock<HashMap<String, i64>>>,
    bindings: Arc<RwLock<HashMap<String, String>>>,
    streams: Arc<RwLock<HashMap<String, Stream>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn stream_len(&self, stream_key: &str) -> usize {
        self.streams
            .read()
            .await
            .get(stream_key)
            .map_or(0, |s| s.records.len())
    }
}

#[async_trait]
impl RoutingStore for MemoryStore {
    async fn register_worker(&self, worker_id: &str) -> Result<()> {
        self.registry
            .write()
            .await
            .insert(worker_id.to_string(), now_ms());
        Ok(())
    }

    async fn update_heartbeat(&self, worker_id: &str) -> Result<()> {
        self.register_worker(worker_id).await
    }

    async fn unregister_worker(&self, worker_id: &str) -> Result<()> {
        self.registry.write().await.remove(worker_id);
        Ok(())
    }

    async fn list_active_workers(&self) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        let mut workers: Vec<(String, i64)> =
            registry.iter().map(|(id, score)| (id.clone(), *score)).collect();
        workers.sort_by_key(|(_, score)| *score);
        Ok(workers.into_iter().map(|(id, _)| id).collect())
    }

    async fn get_heartbeat(&self, worker_id: &str) -> Result<Option<i64>> {
        Ok(self.registry.read().await.get(worker_id).copied())
    }

    async fn get_binding(&self, channel: &str) -> Result<Option<String>> {
        Ok(self.bindings.read().await.get(channel).cloned())
    }

    async fn set_binding(&self, channel: &str, worker_id: &str) -> Result<()> {
        self.bindings
            .write()
            .await
            .insert(channel.to_string(), worker_id.to_string());
        Ok(())
    }

    async fn delete_binding(&self, channel: &str) -> Result<()> {
        self.bindings.write().await.remove(channel);
        Ok(())
    }

    async fn append_record(&self, stream_key: &str, payload: &[u8]) -> Result<StreamSeq> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(stream_key.to_string()).or_default();
        let seq = format!("{}-{}", now_ms(), stream.records.len());
        stream.records.push(StreamRecord {
            seq: seq.clone(),
            payload: payload.to_vec(),
        });
        stream.notify.notify_waiters();
        Ok(seq)
    }

    async fn read_records(
        &self,
        stream_key: &str,
        from: &StreamCursor,
        max_count: usize,
        block: Duration,
    ) -> Result<Vec<StreamRecord>> {
        let start_len = self.stream_len(stream_key).await;

        let select = |records: &[StreamRecord]| -> Vec<StreamRecord> {
            let start = match from {
                StreamCursor::Earliest => 0,
                StreamCursor::Latest => start_len,
                StreamCursor::After(seq) => records
                    .iter()
                    .position(|r| &r.seq == seq)
                    .map_or(records.len(), |idx| idx + 1),
            };
            records
                .iter()
                .skip(start)
                .take(max_count)
                .cloned()
                .collect()
        };

        {
            let streams = self.streams.read().await;
            if let Some(stream) = streams.get(stream_key) {
                let batch = select(&stream.records);
                if !batch.is_empty() {
                    return Ok(batch);
                }
            }
        }

        if block.is_zero() {
            return Ok(Vec::new());
        }

        let mut streams = self.streams.write().await;
        let notified = streams.entry(stream_key.to_string()).or_default().notify.notified();
        drop(streams);

        let _ = tokio::time::timeout(block, notified).await;

        let streams = self.streams.read().await;
        Ok(streams
            .get(stream_key)
            .map(|s| select(&s.records))
            .unwrap_or_default())
    }
}
