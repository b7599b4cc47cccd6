/// Errors raised by a [`crate::RoutingStore`] implementation.
///
/// All variants are transient from the caller's point of view (§7
/// `StoreError`): the router backs off and the caller retries, it never
/// represents a validation or authorization failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("routing store unavailable: {0}")]
    Unavailable(String),

    #[error("routing store operation failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}

impl relaymesh_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Backend(message)
    }
}

relaymesh_common::impl_context!();
