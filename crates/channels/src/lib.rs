//! Channel name validation and message enrichment (§3, §4.C).
//!
//! `relaymesh-channels` is the home for the two pieces of domain logic the
//! proxy callbacks lean on before talking to the router or the store: is
//! this channel name one of the accepted forms, and what does a raw
//! publish turn into once it has been validated and stamped.

pub mod error;
pub mod message;
pub mod validate;

pub use error::{Error, Result};
pub use message::enrich;
pub use validate::{user_channel_owner, validate_channel_name};
