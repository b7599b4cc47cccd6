//! The proxy error body (§4.C, §6, §7): `{error: {code, message}}`, always
//! returned with HTTP 200 per the broker's proxy contract.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyCode {
    /// `connect`: required user data missing.
    MissingUserData = 4000,
    /// Subscription not allowed by policy.
    SubscriptionNotAllowed = 4001,
    /// Referenced user id does not exist.
    UserNotFound = 4002,
    /// Invalid channel name, or publish payload failed validation.
    InvalidChannelOrMessage = 4003,
    /// Message-validation failure surfaced to the broker.
    MessageValidationFailed = 4004,
    /// Internal error (router/store failure, no workers available).
    Internal = 5000,
}

impl ProxyCode {
    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Serialize)]
pub struct ProxyErrorBody {
    pub code: u32,
    pub message: String,
}

/// A rejected proxy call (§4.C "Each returns either `{result: ...}` ...
/// or `{error: {code, message}}`").
#[derive(Debug)]
pub struct ProxyError {
    pub code: ProxyCode,
    pub message: String,
}

impl ProxyError {
    #[must_use]
    pub fn new(code: ProxyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing_user_data() -> Self {
        Self::new(ProxyCode::MissingUserData, "Missing user data")
    }

    #[must_use]
    pub fn user_not_found() -> Self {
        Self::new(ProxyCode::UserNotFound, "User not found")
    }

    #[must_use]
    pub fn invalid_channel() -> Self {
        Self::new(ProxyCode::InvalidChannelOrMessage, "Invalid channel")
    }

    #[must_use]
    pub fn cannot_subscribe_other_user() -> Self {
        Self::new(
            ProxyCode::InvalidChannelOrMessage,
            "Cannot subscribe to other user channels",
        )
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProxyCode::Internal, message)
    }

    #[must_use]
    pub fn body(&self) -> ProxyErrorBody {
        ProxyErrorBody {
            code: self.code.code(),
            message: self.message.clone(),
        }
    }
}

impl From<relaymesh_channels::Error> for ProxyError {
    fn from(err: relaymesh_channels::Error) -> Self {
        match err {
            relaymesh_channels::Error::InvalidChannel(_) => {
                Self::new(ProxyCode::InvalidChannelOrMessage, "Invalid channel")
            },
            relaymesh_channels::Error::InvalidText(reason) => {
                Self::new(ProxyCode::InvalidChannelOrMessage, reason)
            },
        }
    }
}

impl From<relaymesh_routing::Error> for ProxyError {
    fn from(err: relaymesh_routing::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<relaymesh_store::Error> for ProxyError {
    fn from(err: relaymesh_store::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<relaymesh_auth::Error> for ProxyError {
    fn from(err: relaymesh_auth::Error) -> Self {
        Self::new(ProxyCode::Internal, err.to_string())
    }
}
