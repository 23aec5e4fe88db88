//! Key derivation helpers using HKDF-SHA256.
//!
//! From the single shared secret supplied at startup we derive:
//! - The **cipher key** used to encrypt secret payloads at rest.
//! - The **signing key** used to MAC bearer tokens.
//!
//! Each sub-key is bound to its purpose through the HKDF `info` string,
//! so knowing one does not reveal the other.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{KeeperError, Result};

/// Length of derived sub-keys (256 bits).
pub const KEY_LEN: usize = 32;

/// Fixed extract salt; the shared secret is operator-chosen text, not
/// uniformly random key material.
const EXTRACT_SALT: &[u8] = b"secret-keeper-v1";

/// Derive the at-rest encryption key from the shared secret.
pub fn derive_cipher_key(secret: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(secret, b"secret-keeper-cipher")
}

/// Derive the token signing key from the shared secret.
pub fn derive_signing_key(secret: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(secret, b"secret-keeper-token")
}

fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(Some(EXTRACT_SALT), ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| KeeperError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// The process-wide shared secret, wiped from memory when dropped.
///
/// Built once from configuration and handed to `TokenAuthority::new` and
/// `Cipher::new`; neither keeps a reference to it afterwards.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: secret.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn derive_cipher_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_cipher_key(&self.bytes)
    }

    pub fn derive_signing_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_signing_key(&self.bytes)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}
