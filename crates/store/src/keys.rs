//! Key naming for the routing store (§4.A, §6). These must match across
//! every process that touches the store — callback processes, worker
//! processes, and any operational tooling.

/// Sorted-set key holding every live worker id, scored by last heartbeat.
pub const WORKERS_ACTIVE: &str = "workers:active";

/// String key holding the worker id a channel is currently bound to.
pub fn binding_key(channel: &str) -> String {
    format!("channel:route:{channel}")
}

/// Append-only stream key for a single worker's inbound message log.
pub fn worker_stream_key(worker_id: &str) -> String {
    format!("messages:worker:{worker_id}")
}
