/// Errors raised while validating names or minting/verifying tokens (§4.E, §7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Display name failed the 1–50 char (after trim) validation (§3 "User").
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Token signature did not match, or the compact form was malformed.
    #[error("invalid token")]
    InvalidToken,

    /// Token parsed and verified but its `exp` claim is in the past.
    #[error("token expired")]
    Expired,
}

pub type Result<T> = std::result::Result<T, Error>;
