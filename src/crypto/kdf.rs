//! Argon2id password hashing for stored user passwords.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...`), which carry
//! their own salt and cost parameters, so verification does not depend on
//! the currently configured `Argon2Params`.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::errors::{KeeperError, Result};

/// Length of the salt in bytes (128 bits).
const SALT_LEN: usize = 16;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the fields in `Settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 19 456 = 19 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 2).
    pub iterations: u32,
    /// Parallelism lanes (default: 1).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Params {
    fn hasher(&self) -> Result<Argon2<'static>> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(KeeperError::PasswordHashFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 || self.parallelism < 1 {
            return Err(KeeperError::PasswordHashFailed(
                "Argon2 iterations and parallelism must be at least 1".into(),
            ));
        }

        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| KeeperError::PasswordHashFailed(format!("invalid Argon2 params: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash `password` with a fresh random salt, returning a PHC string.
pub fn hash_password(password: &[u8], params: &Argon2Params) -> Result<String> {
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| KeeperError::PasswordHashFailed(format!("salt encoding failed: {e}")))?;
    let hash = params
        .hasher()?
        .hash_password(password, &salt)
        .map_err(|e| KeeperError::PasswordHashFailed(format!("Argon2id hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Generate a cryptographically random salt.
fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Check `candidate` against a stored PHC string.
///
/// Returns `Ok(false)` on a mismatch; a malformed stored hash is an error.
pub fn verify_password(candidate: &[u8], stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| KeeperError::PasswordHashFailed(format!("stored hash unreadable: {e}")))?;

    match Argon2::default().verify_password(candidate, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(KeeperError::PasswordHashFailed(format!(
            "Argon2id verification failed: {e}"
        ))),
    }
}
