//! Parsing a worker stream record's payload into a typed [`Event`] (§4.D
//! "Dispatch & channel lifecycle", §6 "Routing store keys").
//!
//! The wire shape is a flat JSON object (§6): `{id, channel, workerId,
//! userId, userName, text, timestamp, raw, clientId, type?}`. `type` is
//! optional and defaults to `"message"` — consumers must tolerate it being
//! absent (§6 "Consumers tolerate missing `type`").

use chrono::{DateTime, Utc};
use relaymesh_common::types::Message;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<String>,
    channel: String,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "userName")]
    user_name: Option<String>,
    text: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    raw: serde_json::Value,
    #[serde(rename = "clientId")]
    client_id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// A single dispatchable event from a worker stream (§9 "small, finite variant").
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A published message (§4.D "For `message` events").
    Message {
        channel: String,
        message: Message,
        client_id: Option<String>,
        /// The original, un-enriched publish payload (§6 stream entry
        /// field `raw`), carried through for consumers that need more
        /// than the typed fields above.
        raw: serde_json::Value,
    },
    /// A subscriber joined a channel.
    Join {
        channel: String,
        user_id: Option<String>,
        client_id: Option<String>,
    },
    /// A subscriber left a channel.
    Leave {
        channel: String,
        user_id: Option<String>,
        client_id: Option<String>,
    },
}

impl Event {
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            Self::Message { channel, .. } | Self::Join { channel, .. } | Self::Leave { channel, .. } => {
                channel
            },
        }
    }
}

/// Parse a raw stream record payload (§6) into a typed [`Event`].
pub fn parse_event(payload: &[u8]) -> Result<Event> {
    let raw: RawRecord =
        serde_json::from_slice(payload).map_err(|e| Error::MalformedRecord(e.to_string()))?;

    let kind = raw.kind.as_deref().unwrap_or("message");
    match kind {
        "join" => Ok(Event::Join {
            channel: raw.channel,
            user_id: raw.user_id,
            client_id: raw.client_id,
        }),
        "leave" => Ok(Event::Leave {
            channel: raw.channel,
            user_id: raw.user_id,
            client_id: raw.client_id,
        }),
        "message" => {
            let id = raw
                .id
                .ok_or_else(|| Error::MalformedRecord("message record missing id".to_string()))?;
            let text = raw
                .text
                .ok_or_else(|| Error::MalformedRecord("message record missing text".to_string()))?;
            let user_id = raw
                .user_id
                .ok_or_else(|| Error::MalformedRecord("message record missing userId".to_string()))?;
            let user_name = raw.user_name.unwrap_or_default();
            let timestamp = raw.timestamp.unwrap_or_else(Utc::now);

            Ok(Event::Message {
                channel: raw.channel.clone(),
                message: Message {
                    id,
                    text,
                    user: relaymesh_common::types::User {
                        id: user_id,
                        name: user_name,
                    },
                    channel: raw.channel,
                    timestamp,
                },
                client_id: raw.client_id,
                raw: raw.raw,
            })
        },
        other => Err(Error::MalformedRecord(format!("unknown record type: {other}"))),
    }
}
