/// Crate-wide result type for channel/message validation.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed validation errors for channel names and message payloads (§3).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Channel name does not match any of the accepted forms.
    #[error("invalid channel name: {0}")]
    InvalidChannel(String),

    /// Message text failed validation (empty after trim, or too long).
    #[error("invalid message text: {0}")]
    InvalidText(String),
}

impl Error {
    #[must_use]
    pub fn invalid_channel(channel: impl Into<String>) -> Self {
        Self::InvalidChannel(channel.into())
    }

    #[must_use]
    pub fn invalid_text(reason: impl Into<String>) -> Self {
        Self::InvalidText(reason.into())
    }
}
