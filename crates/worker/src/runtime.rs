//! The Worker Runtime (§4.D): one process per worker id. Registers a
//! heartbeat, consumes its own stream, tracks channel lifecycle, and
//! dispatches events to user code.
//!
//! Shutdown follows a timer-loop pattern: a `Notify` wakes every sleeping
//! task, a `running` flag is checked at each safe suspension point, and
//! `stop()` awaits the spawned handles so the unregister-on-stop step
//! always runs.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::{
    sync::{broadcast, Mutex, Notify, RwLock},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use relaymesh_config::WorkerConfig;
use relaymesh_store::{RoutingStore, StreamCursor, StreamRecord};

use crate::{
    event::{parse_event, Event},
    handlers::{EventHandlers, WorkerEvent},
    lifecycle::LifecycleTracker,
};

/// How often the inactivity sweeper scans tracked channels (§4.D default 5s).
const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(5);

/// Backoff after a `readRecords` error before retrying (§4.D "sleep briefly").
const READ_ERROR_BACKOFF: StdDuration = StdDuration::from_secs(1);

/// Broadcast channel capacity for the worker's event sink.
const BROADCAST_CAPACITY: usize = 1024;

pub struct WorkerRuntime {
    worker_id: String,
    store: Arc<dyn RoutingStore>,
    config: WorkerConfig,
    handlers: EventHandlers,
    tracker: RwLock<LifecycleTracker>,
    sender: broadcast::Sender<WorkerEvent>,
    running: RwLock<bool>,
    shutdown: Notify,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerRuntime {
    #[must_use]
    pub fn new(store: Arc<dyn RoutingStore>, config: WorkerConfig, handlers: EventHandlers) -> Arc<Self> {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Arc::new(Self {
            worker_id: config.worker_id.clone(),
            store,
            config,
            handlers,
            tracker: RwLock::new(LifecycleTracker::new()),
            sender,
            running: RwLock::new(false),
            shutdown: Notify::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Subscribe to the broadcast event sink (§4.D "Event surface").
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.sender.subscribe()
    }

    /// Register with the routing store and spawn the heartbeat, consume,
    /// and sweeper tasks (§4.D "Registration & heartbeat").
    pub async fn start(self: &Arc<Self>) -> relaymesh_store::Result<()> {
        self.store.register_worker(&self.worker_id).await?;
        *self.running.write().await = true;
        info!(worker_id = %self.worker_id, "worker started");

        let mut handles = Vec::new();

        let heartbeat = Arc::clone(self);
        handles.push(tokio::spawn(async move { heartbeat.heartbeat_loop().await }));

        let consume = Arc::clone(self);
        handles.push(tokio::spawn(async move { consume.consume_loop().await }));

        let sweep = Arc::clone(self);
        handles.push(tokio::spawn(async move { sweep.sweeper_loop().await }));

        *self.tasks.lock().await = handles;
        Ok(())
    }

    /// Graceful stop (§4.D "On graceful `stop`"): cancel background tasks,
    /// mark every tracked channel inactive, and leave the worker registry.
    pub async fn stop(&self) {
        *self.running.write().await = false;
        self.shutdown.notify_waiters();

        let handles = std::mem::take(&mut *self.tasks.lock().await);
        for handle in handles {
            let _ = handle.await;
        }

        let drained = self.tracker.write().await.drain_all();
        for (channel, entry) in drained {
            self.emit(WorkerEvent::ChannelInactive {
                channel,
                message_count: entry.message_count,
            })
            .await;
        }

        if let Err(e) = self.store.unregister_worker(&self.worker_id).await {
            warn!(worker_id = %self.worker_id, error = %e, "failed to unregister worker on stop");
        }
        info!(worker_id = %self.worker_id, "worker stopped");
    }

    async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    async fn heartbeat_loop(self: Arc<Self>) {
        let interval = StdDuration::from_secs(self.config.heartbeat_interval_secs.max(1));
        loop {
            if !self.is_running().await {
                return;
            }

            tokio::select! {
                () = tokio::time::sleep(interval) => {},
                () = self.shutdown.notified() => continue,
            }

            if !self.is_running().await {
                return;
            }

            if let Err(e) = self.store.update_heartbeat(&self.worker_id).await {
                warn!(worker_id = %self.worker_id, error = %e, "heartbeat update failed");
            }
        }
    }

    async fn consume_loop(self: Arc<Self>) {
        let stream_key = relaymesh_store::keys::worker_stream_key(&self.worker_id);
        let mut cursor = if self.config.read_from_earliest {
            StreamCursor::Earliest
        } else {
            StreamCursor::Latest
        };
        let block = StdDuration::from_millis(self.config.read_block_ms);

        loop {
            if !self.is_running().await {
                return;
            }

            match self
                .store
                .read_records(&stream_key, &cursor, self.config.read_batch_size, block)
                .await
            {
                Ok(records) => {
                    for record in &records {
                        self.dispatch_record(record).await;
                    }
                    if let Some(next) = StreamCursor::advanced_past(&records) {
                        cursor = next;
                    }
                },
                Err(e) => {
                    error!(worker_id = %self.worker_id, error = %e, "stream read failed, backing off");
                    tokio::select! {
                        () = tokio::time::sleep(READ_ERROR_BACKOFF) => {},
                        () = self.shutdown.notified() => continue,
                    }
                },
            }
        }
    }

    /// Dispatch one record. The cursor is always advanced past it by the
    /// caller regardless of outcome (§4.D "Cursor advance is
    /// unconditional").
    async fn dispatch_record(&self, record: &StreamRecord) {
        let event = match parse_event(&record.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(worker_id = %self.worker_id, error = %e, "dropping malformed record");
                self.emit(WorkerEvent::Error {
                    channel: None,
                    message: e.to_string(),
                })
                .await;
                return;
            },
        };

        match event {
            Event::Message { channel, message, .. } => {
                let timestamp = message.timestamp;
                let (is_new, message_count) = {
                    let mut tracker = self.tracker.write().await;
                    let is_new = tracker.record_message(&channel, timestamp);
                    let count = tracker.get(&channel).map_or(1, |entry| entry.message_count);
                    (is_new, count)
                };

                if is_new {
                    self.emit(WorkerEvent::ChannelActive {
                        channel: channel.clone(),
                        first_message_at: timestamp,
                    })
                    .await;
                }

                self.emit(WorkerEvent::ChannelMessage {
                    channel,
                    message,
                    message_count,
                })
                .await;
            },
            Event::Join { channel, user_id, .. } => {
                self.emit(WorkerEvent::PresenceJoin { channel, user_id }).await;
            },
            Event::Leave { channel, user_id, .. } => {
                self.emit(WorkerEvent::PresenceLeave { channel, user_id }).await;
            },
        }
    }

    async fn sweeper_loop(self: Arc<Self>) {
        let inactivity_timeout = ChronoDuration::seconds(self.config.channel_inactivity_secs as i64);
        loop {
            if !self.is_running().await {
                return;
            }

            tokio::select! {
                () = tokio::time::sleep(SWEEP_INTERVAL) => {},
                () = self.shutdown.notified() => continue,
            }

            if !self.is_running().await {
                return;
            }

            let cutoff = Utc::now() - inactivity_timeout;
            let stale = self.tracker.write().await.sweep_inactive(cutoff);
            for (channel, entry) in stale {
                debug!(worker_id = %self.worker_id, channel, "channel swept inactive");
                self.emit(WorkerEvent::ChannelInactive {
                    channel,
                    message_count: entry.message_count,
                })
                .await;
            }
        }
    }

    /// Broadcast `event` and await the matching callback (§4.D "the consume
    /// loop does not advance the cursor until the handler returns" — here,
    /// until the emit for this record's events has returned). A callback
    /// error is caught and re-emitted as [`WorkerEvent::Error`] rather than
    /// propagated (§4.D "Event surface").
    async fn emit(&self, event: WorkerEvent) {
        let _ = self.sender.send(event.clone());

        let channel = match &event {
            WorkerEvent::ChannelActive { channel, .. }
            | WorkerEvent::ChannelMessage { channel, .. }
            | WorkerEvent::ChannelInactive { channel, .. }
            | WorkerEvent::PresenceJoin { channel, .. }
            | WorkerEvent::PresenceLeave { channel, .. } => Some(channel.clone()),
            WorkerEvent::Error { channel, .. } => channel.clone(),
        };

        if let Err(e) = self.handlers.dispatch(event).await {
            warn!(worker_id = %self.worker_id, error = %e, "event callback raised an error");
            let error_event = WorkerEvent::Error {
                channel,
                message: e.to_string(),
            };
            let _ = self.sender.send(error_event.clone());
            if let Some(on_error) = &self.handlers.on_error {
                let _ = on_error(error_event).await;
            }
        }
    }
}
