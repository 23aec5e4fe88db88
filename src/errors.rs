use thiserror::Error;

/// All errors that can occur in the keeper.
#[derive(Debug, Error)]
pub enum KeeperError {
    // --- Auth errors ---
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid credentials for login '{0}'")]
    InvalidCredentials(String),

    #[error("Caller identity missing: handler was not wrapped by the auth gate")]
    MissingIdentity,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashFailed(String),

    // --- Record errors ---
    #[error("{what} '{key}' already exists")]
    Conflict { what: &'static str, key: String },

    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // --- Storage errors ---
    #[error("Storage error during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Call errors ---
    #[error("Deadline exceeded before {0} could run")]
    DeadlineExceeded(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl KeeperError {
    pub(crate) fn secret_conflict(name: &str) -> Self {
        Self::Conflict {
            what: "Secret",
            key: name.to_string(),
        }
    }

    pub(crate) fn secret_not_found(name: &str) -> Self {
        Self::NotFound {
            what: "Secret",
            key: name.to_string(),
        }
    }

    pub(crate) fn storage(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Storage { op, source }
    }
}

/// Convenience type alias for keeper results.
pub type Result<T> = std::result::Result<T, KeeperError>;
