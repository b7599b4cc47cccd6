//! The Worker Runtime (§4.D): registration/heartbeat, the consume loop
//! over a worker's durable stream, the channel-lifecycle tracker, and the
//! event callback/broadcast surface the SDK exposes on top of it.

pub mod error;
pub mod event;
pub mod handlers;
pub mod lifecycle;
pub mod runtime;

pub use {
    error::{Error, Result},
    event::{parse_event, Event},
    handlers::{EventCallback, EventHandlers, WorkerEvent},
    lifecycle::{ChannelLifecycle, ChannelState, LifecycleTracker},
    runtime::WorkerRuntime,
};
