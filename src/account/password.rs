//! How user passwords are stored.
//!
//! Two schemes exist:
//!
//! - `Argon2`: a salted Argon2id PHC string.  One-way.
//! - `Base64Legacy`: the password base64-encoded.  Reversible, so anyone
//!   who can read the `users` table can recover every password.  Kept only
//!   so databases written with it keep working; it must be chosen
//!   explicitly in the settings.
//!
//! The scheme in the settings decides how *new* passwords are written.
//! Verification looks at the stored value itself, so users registered
//! under the legacy scheme can still log in after switching to Argon2.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::kdf::{hash_password, verify_password, Argon2Params};
use crate::errors::Result;

const PHC_ARGON2_PREFIX: &str = "$argon2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    Argon2(Argon2Params),
    Base64Legacy,
}

impl Default for PasswordScheme {
    fn default() -> Self {
        Self::Argon2(Argon2Params::default())
    }
}

impl PasswordScheme {
    /// Produce the value to store for a newly registered password.
    pub fn encode(&self, password: &str) -> Result<String> {
        match self {
            Self::Argon2(params) => hash_password(password.as_bytes(), params),
            Self::Base64Legacy => Ok(BASE64.encode(password.as_bytes())),
        }
    }

    /// Check `candidate` against a stored value written by either scheme.
    pub fn verify(candidate: &str, stored: &str) -> Result<bool> {
        if stored.starts_with(PHC_ARGON2_PREFIX) {
            return verify_password(candidate.as_bytes(), stored);
        }

        // Legacy values that fail to decode simply never match.
        let Ok(decoded) = BASE64.decode(stored) else {
            return Ok(false);
        };
        let decoded = Zeroizing::new(decoded);
        Ok(decoded.as_slice().ct_eq(candidate.as_bytes()).into())
    }
}
