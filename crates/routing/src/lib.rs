//! The Sticky Channel Router (§4.B): given a channel name, resolve the
//! worker id that owns it, creating or repairing the binding in the
//! routing store as needed.
//!
//! [`Router`] is a pure function over a [`relaymesh_store::RoutingStore`]
//! plus a process-local cache — it never depends on the callback handlers
//! that use it (§9 "Cyclic references").

pub mod error;
pub mod router;

pub use {
    error::{Error, Result},
    router::{Router, RouterConfig},
};
