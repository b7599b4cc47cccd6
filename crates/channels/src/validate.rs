//! Channel name validation (§3): `chat`, `chat:<slug>`, `user:<userId>`.
//! Slug/userId characters are word characters or hyphen. Anything else is
//! rejected — callers see this as the 4003 "invalid channel" error (§4.C).

use std::sync::LazyLock;

use regex::Regex;

static CHANNEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(chat(:[\w-]+)?|user:[\w-]+)$")
        .unwrap_or_else(|e| panic!("built-in channel pattern must be valid regex: {e}"))
});

/// Validate a channel name against the accepted forms. Does not check
/// whether the caller is authorized to use it — see the subscribe policy
/// in `relaymesh-gateway` for the `user:<id>` ownership rule.
pub fn validate_channel_name(channel: &str) -> crate::Result<()> {
    if CHANNEL_PATTERN.is_match(channel) {
        Ok(())
    } else {
        Err(crate::Error::invalid_channel(channel))
    }
}

/// The user id a `user:<id>` channel belongs to, if `channel` is that form.
#[must_use]
pub fn user_channel_owner(channel: &str) -> Option<&str> {
    channel.strip_prefix("user:")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    // §8 boundary behaviors: chat, chat:room-1, user:u1, chatroom, chat:,
    // user:, chat:room 1 → accept, accept, accept, reject, reject, reject,
    // reject. (The `user:u2` "wrong owner" case is a subscribe-policy
    // check, not a channel-name-shape check — see `relaymesh-gateway`.)
    #[rstest]
    #[case("chat", true)]
    #[case("chat:room-1", true)]
    #[case("user:u1", true)]
    #[case("user:u2", true)]
    #[case("chatroom", false)]
    #[case("chat:", false)]
    #[case("user:", false)]
    #[case("chat:room 1", false)]
    fn channel_name_shape(#[case] channel: &str, #[case] accepted: bool) {
        assert_eq!(validate_channel_name(channel).is_ok(), accepted);
    }

    #[test]
    fn owner_extraction() {
        assert_eq!(user_channel_owner("user:u1"), Some("u1"));
        assert_eq!(user_channel_owner("chat"), None);
    }
}
