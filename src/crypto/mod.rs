//! Cryptographic primitives for the keeper.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - HKDF-based derivation of the cipher and token-signing keys (`keys`)
//! - Argon2id password hashing for stored user passwords (`kdf`)

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::{decrypt, encrypt, Cipher};
pub use kdf::{hash_password, verify_password, Argon2Params};
pub use keys::{derive_cipher_key, derive_signing_key, SharedSecret};
