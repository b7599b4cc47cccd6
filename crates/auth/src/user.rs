//! User identity (§3 "User"): `(id, name)`, created on first login for a
//! given name (looked up case-folded), immutable thereafter. The proxy
//! `connect` callback upserts by an externally-supplied id instead — both
//! paths share the same registry so a client's session-token subject and
//! its connect-time user id always resolve to the same record.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use relaymesh_common::types::{validate_user_name, User};

use crate::{Error, Result};

/// Owner of user identity (§5 "User and token data are owned by the
/// callback process"). An external user repository could implement this
/// trait in place of [`InMemoryUserRegistry`] without callers noticing.
#[async_trait]
pub trait UserRegistry: Send + Sync {
    /// Look up a user by id.
    async fn find_by_id(&self, id: &str) -> Option<User>;

    /// Find or create a user for a case-folded `name` (§4.E login flow).
    /// The id is minted on first creation and stable thereafter.
    async fn upsert_by_name(&self, name: &str) -> Result<User>;

    /// Find or create a user for an externally-supplied `(id, name)` pair
    /// (§4.C connect flow: "upsert the user (create if not found)").
    async fn upsert(&self, id: &str, name: &str) -> Result<User>;
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<String, User>,
    id_by_folded_name: HashMap<String, String>,
}

/// In-process [`UserRegistry`] backed by a `HashMap`. Cheap to clone
/// (internally `Arc`-wrapped), suitable for a single callback process or
/// for tests; a production deployment with multiple callback processes
/// would back this with a shared external user database instead (§1
/// non-goals: "persistent user databases" are out of scope here).
#[derive(Clone, Default)]
pub struct InMemoryUserRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRegistry for InMemoryUserRegistry {
    async fn find_by_id(&self, id: &str) -> Option<User> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    async fn upsert_by_name(&self, name: &str) -> Result<User> {
        let trimmed = validate_user_name(name).map_err(Error::InvalidName)?;
        let folded = trimmed.to_lowercase();

        let mut inner = self.inner.write().await;
        if let Some(id) = inner.id_by_folded_name.get(&folded) {
            return Ok(inner.by_id[id].clone());
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: trimmed,
        };
        inner.id_by_folded_name.insert(folded, user.id.clone());
        inner.by_id.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn upsert(&self, id: &str, name: &str) -> Result<User> {
        let trimmed = validate_user_name(name).map_err(Error::InvalidName)?;

        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.by_id.get(id) {
            return Ok(existing.clone());
        }

        let user = User {
            id: id.to_string(),
            name: trimmed,
        };
        inner
            .id_by_folded_name
            .insert(user.name.to_lowercase(), user.id.clone());
        inner.by_id.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_creates_then_returns_same_id() {
        let registry = InMemoryUserRegistry::new();
        let first = registry.upsert_by_name("Alice").await.unwrap();
        let second = registry.upsert_by_name("Alice").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn login_is_case_folded() {
        let registry = InMemoryUserRegistry::new();
        let first = registry.upsert_by_name("Alice").await.unwrap();
        let second = registry.upsert_by_name("ALICE").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn login_rejects_bad_names() {
        let registry = InMemoryUserRegistry::new();
        assert!(registry.upsert_by_name("").await.is_err());
        assert!(registry.upsert_by_name(&"a".repeat(51)).await.is_err());
    }

    #[tokio::test]
    async fn connect_upsert_creates_then_is_idempotent() {
        let registry = InMemoryUserRegistry::new();
        let first = registry.upsert("u1", "Alice").await.unwrap();
        let second = registry.upsert("u1", "Someone Else").await.unwrap();
        assert_eq!(first.name, second.name);
        assert_eq!(second.id, "u1");
    }

    #[tokio::test]
    async fn find_by_id_after_upsert() {
        let registry = InMemoryUserRegistry::new();
        registry.upsert("u1", "Alice").await.unwrap();
        assert_eq!(registry.find_by_id("u1").await.unwrap().name, "Alice");
        assert!(registry.find_by_id("u2").await.is_none());
    }
}
