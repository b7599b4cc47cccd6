//! Token issuance and user identity (§4.E).
//!
//! This crate provides:
//! - [`user`]: upsert-by-name and upsert-by-id user identity, owned by the
//!   callback process (§3 "User").
//! - [`token`]: HMAC-SHA256 session and broker token minting/verification
//!   (§3 "Session token / Broker token", §6 "Token format").

pub mod error;
pub mod token;
pub mod user;

pub use {
    error::{Error, Result},
    token::{BrokerClaims, SessionClaims, TokenConfig},
    user::{InMemoryUserRegistry, UserRegistry},
};
