//! The worker's event surface: an `EventHandlers` record of optional async
//! callbacks plus a broadcast sink, both seeing every event (§4.D "Event
//! surface", §9 "Dynamic dispatch in the worker event surface").

use std::{future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, Utc};
use relaymesh_common::types::Message;

/// Every event a worker runtime can emit, in one finite type so both the
/// callback surface and the broadcast sink share a single payload shape.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// First message observed for a channel (§4.D).
    ChannelActive {
        channel: String,
        first_message_at: DateTime<Utc>,
    },
    /// A message dispatched for an already-active channel.
    ChannelMessage {
        channel: String,
        message: Message,
        message_count: u64,
    },
    /// A channel swept (or drained on stop) after `channelInactivityTimeout`.
    ChannelInactive { channel: String, message_count: u64 },
    /// A `join` record.
    PresenceJoin {
        channel: String,
        user_id: Option<String>,
    },
    /// A `leave` record.
    PresenceLeave {
        channel: String,
        user_id: Option<String>,
    },
    /// A callback raised an error while handling another event (§4.D "Event
    /// surface": "Errors thrown from callbacks are caught and re-emitted on
    /// an `error` channel; they do not kill the worker").
    Error { channel: Option<String>, message: String },
}

type CallbackFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A single async event callback: a boxed future-returning closure rather
/// than a trait object, since the event type is closed and finite.
pub type EventCallback = Arc<dyn Fn(WorkerEvent) -> CallbackFuture + Send + Sync>;

/// Optional callbacks a worker runtime invokes for each event kind. Every
/// field is independent — a caller wires up only the events it cares
/// about. The consume loop awaits whichever is present before advancing
/// (§4.D "the consume loop does not advance the cursor until the handler
/// returns" is honored per-record, not per-callback: see `runtime.rs`).
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub on_channel_active: Option<EventCallback>,
    pub on_channel_message: Option<EventCallback>,
    pub on_channel_inactive: Option<EventCallback>,
    pub on_presence_join: Option<EventCallback>,
    pub on_presence_leave: Option<EventCallback>,
    pub on_error: Option<EventCallback>,
}

impl EventHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn callback_for(&self, event: &WorkerEvent) -> Option<&EventCallback> {
        match event {
            WorkerEvent::ChannelActive { .. } => self.on_channel_active.as_ref(),
            WorkerEvent::ChannelMessage { .. } => self.on_channel_message.as_ref(),
            WorkerEvent::ChannelInactive { .. } => self.on_channel_inactive.as_ref(),
            WorkerEvent::PresenceJoin { .. } => self.on_presence_join.as_ref(),
            WorkerEvent::PresenceLeave { .. } => self.on_presence_leave.as_ref(),
            WorkerEvent::Error { .. } => self.on_error.as_ref(),
        }
    }

    /// Invoke the matching callback for `event`, if one is registered.
    /// Errors are swallowed by the caller (`runtime.rs` turns them into an
    /// `Error` event) rather than here, so this never itself re-enters
    /// `on_error` recursively.
    pub async fn dispatch(&self, event: WorkerEvent) -> anyhow::Result<()> {
        if let Some(callback) = self.callback_for(&event) {
            callback(event).await
        } else {
            Ok(())
        }
    }
}
