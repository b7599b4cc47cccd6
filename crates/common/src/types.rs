//! Core data-model types shared between the gateway, router, and worker.
//!
//! See the data model notes on each type for the invariants callers may
//! rely on; construction helpers enforce them so an invalid value simply
//! cannot exist once built.

use serde::{Deserialize, Serialize};

/// A registered user identity: `(id, name)`.
///
/// `name` is immutable after creation; lookups by name are case-folded by
/// the caller (see `relaymesh-auth::users`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Trim and validate a display name: 1–50 characters after trimming.
pub fn validate_user_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("name must not be empty".into());
    }
    if trimmed.chars().count() > 50 {
        return Err("name must be at most 50 characters".into());
    }
    Ok(trimmed.to_string())
}

/// A message published to a channel, after enrichment by the publish
/// callback (§3 Message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub user: User,
    pub channel: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Validate and trim message text: non-empty after trim, at most 5000 chars.
pub fn validate_message_text(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("text must not be empty".into());
    }
    if trimmed.chars().count() > 5000 {
        return Err("text must be at most 5000 characters".into());
    }
    Ok(trimmed.to_string())
}
