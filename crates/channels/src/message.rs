//! Message enrichment for the publish callback (§3 Message, §4.C publish).

use relaymesh_common::types::{validate_message_text, Message, User};

use crate::{Error, Result};

/// Build the enriched message returned by a successful publish: a fresh
/// id and the enrichment timestamp are minted here, never supplied by the
/// caller.
pub fn enrich(raw_text: &str, user: User, channel: &str) -> Result<Message> {
    let text = validate_message_text(raw_text).map_err(Error::invalid_text)?;
    Ok(Message {
        id: uuid::Uuid::new_v4().to_string(),
        text,
        user,
        channel: channel.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[test]
    fn enriches_trimmed_text() {
        let msg = enrich("  hi  ", user(), "chat").unwrap();
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.user.id, "u1");
        assert_eq!(msg.channel, "chat");
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn rejects_empty_text() {
        assert!(enrich("   ", user(), "chat").is_err());
    }

    #[test]
    fn rejects_oversized_text() {
        assert!(enrich(&"x".repeat(5001), user(), "chat").is_err());
    }

    #[test]
    fn each_message_gets_a_unique_id() {
        let a = enrich("hi", user(), "chat").unwrap();
        let b = enrich("hi", user(), "chat").unwrap();
        assert_ne!(a.id, b.id);
    }
}
