//! HMAC-SHA256 bearer tokens (§3 "Session token / Broker token", §6 "Token
//! format", §9 "Token minting").
//!
//! Both token kinds share the same compact three-segment shape
//! (`header.payload.signature`, base64url without padding) but are signed
//! with independent secrets so rotating one never invalidates the other.
//! The header is emitted byte-for-byte as `{"alg":"HS256","typ":"JWT"}` —
//! the broker this interoperates with does not tolerate reordered keys.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Byte-for-byte fixed header; see module docs.
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Token lifetime bounds from §3: 1–24h.
pub const MIN_TTL: Duration = Duration::from_secs(3_600);
pub const MAX_TTL: Duration = Duration::from_secs(24 * 3_600);

/// Session token claims (§3, §4.E step 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// The `info` object carried by a broker token (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerInfo {
    pub name: String,
}

/// Broker token claims (§3, §4.E step 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerClaims {
    pub sub: String,
    pub info: BrokerInfo,
    pub exp: i64,
}

/// Independent HMAC secrets and token lifetimes to mint with (§3 "The two
/// tokens use independent secrets so rotation is decoupled"). The two TTLs
/// are independent config values too (§6 `session_token_ttl_secs` /
/// `broker_token_ttl_secs`), even though both default to the same value.
#[derive(Clone)]
pub struct TokenConfig {
    pub session_secret: SecretString,
    pub broker_secret: SecretString,
    pub session_ttl: Duration,
    pub broker_ttl: Duration,
}

impl TokenConfig {
    /// Clamp a configured TTL into the 1–24h window mandated by §3.
    #[must_use]
    pub fn clamp_ttl(ttl: Duration) -> Duration {
        ttl.clamp(MIN_TTL, MAX_TTL)
    }

    /// Mint a session token for `user` (§4.E step 3).
    #[must_use]
    pub fn mint_session_token(&self, user_id: &str, name: &str) -> String {
        let now = now_epoch();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now + self.session_ttl.as_secs() as i64,
        };
        encode(&claims, self.session_secret.expose_secret())
    }

    /// Mint a broker token for `user` (§4.E step 3).
    #[must_use]
    pub fn mint_broker_token(&self, user_id: &str, name: &str) -> String {
        let claims = BrokerClaims {
            sub: user_id.to_string(),
            info: BrokerInfo {
                name: name.to_string(),
            },
            exp: now_epoch() + self.broker_ttl.as_secs() as i64,
        };
        encode(&claims, self.broker_secret.expose_secret())
    }

    /// Verify and decode a session token (§8 property 4: round-trip with
    /// the right secret, failure with the wrong one).
    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims> {
        let claims: SessionClaims = decode(token, self.session_secret.expose_secret())?;
        check_not_expired(claims.exp)?;
        Ok(claims)
    }

    /// Verify and decode a broker token.
    pub fn verify_broker_token(&self, token: &str) -> Result<BrokerClaims> {
        let claims: BrokerClaims = decode(token, self.broker_secret.expose_secret())?;
        check_not_expired(claims.exp)?;
        Ok(claims)
    }
}

fn check_not_expired(exp: i64) -> Result<()> {
    if now_epoch() >= exp {
        Err(Error::Expired)
    } else {
        Ok(())
    }
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn sign(signing_input: &str, secret: &str) -> String {
    #[allow(clippy::expect_used)]
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signing_input.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

fn encode<C: Serialize>(claims: &C, secret: &str) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(HEADER_JSON.as_bytes());
    let payload_json = serde_json::to_string(claims).unwrap_or_default();
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = sign(&signing_input, secret);
    format!("{signing_input}.{signature}")
}

fn decode<C: DeserializeOwned>(token: &str, secret: &str) -> Result<C> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidToken);
    };

    let signing_input = format!("{header_b64}.{payload_b64}");
    let expected = sign(&signing_input, secret);
    if !constant_time_eq(expected.as_bytes(), signature_b64.as_bytes()) {
        return Err(Error::InvalidToken);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| Error::InvalidToken)?;
    let claims: C = serde_json::from_slice(&payload).map_err(|_| Error::InvalidToken)?;

    Ok(claims)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig {
            session_secret: SecretString::from("session-secret".to_string()),
            broker_secret: SecretString::from("broker-secret".to_string()),
            session_ttl: Duration::from_secs(3_600),
            broker_ttl: Duration::from_secs(3_600),
        }
    }

    #[test]
    fn header_is_byte_for_byte() {
        let token = config().mint_session_token("u1", "Alice");
        let header_b64 = token.split('.').next().unwrap();
        let header = URL_SAFE_NO_PAD.decode(header_b64).unwrap();
        assert_eq!(header, HEADER_JSON.as_bytes());
    }

    #[test]
    fn session_round_trip() {
        let cfg = config();
        let token = cfg.mint_session_token("u1", "Alice");
        let claims = cfg.verify_session_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.name, "Alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn broker_round_trip() {
        let cfg = config();
        let token = cfg.mint_broker_token("u1", "Alice");
        let claims = cfg.verify_broker_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.info.name, "Alice");
    }

    #[test]
    fn wrong_secret_fails() {
        let cfg = config();
        let token = cfg.mint_session_token("u1", "Alice");

        let mut other = config();
        other.session_secret = SecretString::from("different-secret".to_string());
        assert!(other.verify_session_token(&token).is_err());
    }

    #[test]
    fn session_and_broker_secrets_are_independent() {
        let cfg = config();
        let session_token = cfg.mint_session_token("u1", "Alice");
        // A session token must not verify as a broker token even though both
        // happen to share a process — the secrets are independent.
        assert!(cfg.verify_broker_token(&session_token).is_err());
    }

    #[test]
    fn malformed_token_rejected() {
        let cfg = config();
        assert!(cfg.verify_session_token("not-a-token").is_err());
        assert!(cfg.verify_session_token("a.b.c.d").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let cfg = config();
        let expired = SessionClaims {
            sub: "u1".to_string(),
            name: "Alice".to_string(),
            iat: now_epoch() - 10,
            exp: now_epoch() - 1,
        };
        let token = encode(&expired, cfg.session_secret.expose_secret());
        assert!(matches!(
            cfg.verify_session_token(&token),
            Err(Error::Expired)
        ));
    }

    #[test]
    fn clamp_ttl_enforces_1_to_24h() {
        assert_eq!(TokenConfig::clamp_ttl(Duration::from_secs(10)), MIN_TTL);
        assert_eq!(TokenConfig::clamp_ttl(Duration::from_secs(999_999)), MAX_TTL);
        let mid = Duration::from_secs(7_200);
        assert_eq!(TokenConfig::clamp_ttl(mid), mid);
    }
}
