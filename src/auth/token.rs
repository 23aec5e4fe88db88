//! Stateless bearer tokens.
//!
//! A token is a compact HS256 JWS:
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(HMAC-SHA256)
//! ```
//!
//! The MAC covers the first two segments exactly as transmitted, so
//! validation never re-serializes anything before checking it.  The only
//! revocation mechanism is expiry.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::clock::{Clock, SystemClock};
use crate::crypto::keys::{SharedSecret, KEY_LEN};
use crate::errors::{KeeperError, Result};

const ALGORITHM: &str = "HS256";

/// The caller identity carried by a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub login: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: i64,
    username: String,
    user_id: String,
}

/// Issues and validates bearer tokens with a key derived from the shared
/// secret.  Holds no per-token state.
pub struct TokenAuthority {
    signing_key: Zeroizing<[u8; KEY_LEN]>,
    validity_secs: i64,
    clock: Arc<dyn Clock>,
}

impl TokenAuthority {
    /// Longest validity a token may be issued with (ten years).
    pub const MAX_VALIDITY: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

    pub fn new(secret: &SharedSecret, validity: Duration) -> Result<Self> {
        if validity > Self::MAX_VALIDITY {
            return Err(KeeperError::Config(format!(
                "token duration is too large (at most {} minutes)",
                Self::MAX_VALIDITY.as_secs() / 60
            )));
        }
        let validity_secs = validity.as_secs() as i64;
        if validity_secs == 0 {
            return Err(KeeperError::Config(
                "token duration must be at least one second".into(),
            ));
        }

        Ok(Self {
            signing_key: Zeroizing::new(secret.derive_signing_key()?),
            validity_secs,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the wall clock, e.g. with a `ManualClock` in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a token for `user_id`/`login` expiring one validity period from now.
    pub fn issue(&self, user_id: &str, login: &str) -> Result<String> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            exp: self
                .clock
                .unix_now()
                .checked_add(self.validity_secs)
                .ok_or_else(|| KeeperError::Config("token expiry is out of range".into()))?,
            username: login.to_string(),
            user_id: user_id.to_string(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(to_json(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(to_json(&claims)?);

        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{header_b64}.{claims_b64}.{signature}"))
    }

    /// Verify the signature and expiry of `token` and return its identity.
    pub fn validate(&self, token: &str) -> Result<Identity> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(rejected("malformed token"));
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| rejected("malformed token signature"))?;

        // Signature first: nothing below runs on unauthenticated input.
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| rejected("token signature mismatch"))?;

        let header: Header = from_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(rejected("unexpected token signing method"));
        }

        let claims: Claims = from_segment(claims_b64)?;
        if self.clock.unix_now() >= claims.exp {
            return Err(rejected("token expired"));
        }

        Ok(Identity {
            user_id: claims.user_id,
            login: claims.username,
        })
    }

    fn mac(&self) -> Result<Hmac<Sha256>> {
        Hmac::<Sha256>::new_from_slice(&self.signing_key[..])
            .map_err(|e| KeeperError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))
    }
}

fn rejected(reason: &str) -> KeeperError {
    KeeperError::Unauthenticated(reason.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| KeeperError::Serialization(format!("token: {e}")))
}

fn from_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| rejected("malformed token segment"))?;
    serde_json::from_slice(&bytes).map_err(|_| rejected("malformed token claims"))
}
