//! Shared types and error definitions used across all relaymesh crates.

pub mod error;
pub mod types;

pub use error::{Error, FromMessage, Result};
