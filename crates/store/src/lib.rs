//! The Routing Store (§4.A): a thin abstraction over a shared key-value +
//! stream service providing the worker registry, channel bindings, and
//! per-worker durable streams.
//!
//! [`RoutingStore`] is the trait every caller programs against;
//! [`redis_store::RedisStore`] is the production implementation and
//! [`memory::MemoryStore`] is an in-process stand-in used by tests.

pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

pub use error::{Error, Result};

/// Opaque position in a per-worker stream. Redis Streams IDs
/// (`<ms>-<seq>`) are used as the concrete representation so ordering is
/// a plain string/tuple comparison.
pub type StreamSeq = String;

/// Where to start reading a worker's stream (§4.D "Cursor initial value").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamCursor {
    /// Beginning of the stream.
    Earliest,
    /// Only records appended after this read begins.
    Latest,
    /// Resume strictly after a previously observed sequence number.
    After(StreamSeq),
}

impl StreamCursor {
    /// Advance the cursor past the last record in a freshly read batch.
    /// A no-op on an empty batch.
    #[must_use]
    pub fn advanced_past(records: &[StreamRecord]) -> Option<Self> {
        records.last().map(|r| Self::After(r.seq.clone()))
    }
}

/// A single record read from a worker stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub seq: StreamSeq,
    pub payload: Vec<u8>,
}

/// Primitive operations on the shared routing store (§4.A).
#[async_trait]
pub trait RoutingStore: Send + Sync {
    /// Insert/update `(id, now)` in the worker registry.
    async fn register_worker(&self, worker_id: &str) -> Result<()>;

    /// Refresh a worker's heartbeat score. Same effect as `register_worker`.
    async fn update_heartbeat(&self, worker_id: &str) -> Result<()>;

    /// Remove a worker from the registry.
    async fn unregister_worker(&self, worker_id: &str) -> Result<()>;

    /// All worker ids currently in the registry, ordered by registration score.
    async fn list_active_workers(&self) -> Result<Vec<String>>;

    /// Last heartbeat timestamp (ms since epoch) for a worker, if registered.
    async fn get_heartbeat(&self, worker_id: &str) -> Result<Option<i64>>;

    /// Current binding for a channel, if any.
    async fn get_binding(&self, channel: &str) -> Result<Option<String>>;

    /// Persist `(channel -> worker_id)` with no expiry.
    async fn set_binding(&self, channel: &str, worker_id: &str) -> Result<()>;

    /// Remove a channel's binding.
    async fn delete_binding(&self, channel: &str) -> Result<()>;

    /// Append `payload` to a worker's stream, returning its sequence number.
    async fn append_record(&self, stream_key: &str, payload: &[u8]) -> Result<StreamSeq>;

    /// Read up to `max_count` records starting from `from`, blocking up to
    /// `block` when the stream has nothing new. Returns an empty batch on
    /// timeout rather than erroring.
    async fn read_records(
        &self,
        stream_key: &str,
        from: &StreamCursor,
        max_count: usize,
        block: Duration,
    ) -> Result<Vec<StreamRecord>>;
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
