use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::account::PasswordScheme;
use crate::auth::TokenAuthority;
use crate::crypto::{Argon2Params, SharedSecret};
use crate::errors::{KeeperError, Result};

/// Server configuration, loaded from `keeper.toml`.
///
/// Every field except `secret_key` has a sensible default.  Values are
/// read once at startup and never change afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Address the RPC transport listens on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Shared secret from which the token-signing and cipher keys are derived.
    #[serde(default)]
    pub secret_key: String,

    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Token validity in minutes (default: 60).
    #[serde(default = "default_token_duration_minutes")]
    pub token_duration_minutes: u64,

    /// How long a statement may wait on a locked database, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// `argon2` (default) or `base64` (legacy, reversible).
    #[serde(default = "default_password_scheme")]
    pub password_scheme: String,

    /// Argon2 memory cost in KiB (default: 19 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 2).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 1).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1:3200".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("keeper.db")
}

fn default_token_duration_minutes() -> u64 {
    60
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_password_scheme() -> String {
    "argon2".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    Argon2Params::default().memory_kib
}

fn default_argon2_iterations() -> u32 {
    Argon2Params::default().iterations
}

fn default_argon2_parallelism() -> u32 {
    Argon2Params::default().parallelism
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            secret_key: String::new(),
            database_path: default_database_path(),
            token_duration_minutes: default_token_duration_minutes(),
            store_timeout_ms: default_store_timeout_ms(),
            password_scheme: default_password_scheme(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Default config file name.
    pub const FILE_NAME: &'static str = "keeper.toml";

    /// Load settings from `path`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            KeeperError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Reject settings the keeper cannot safely start with.
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.is_empty() {
            return Err(KeeperError::Config(
                "secret_key must be set (config file, --secret-key or KEEPER_SECRET_KEY)".into(),
            ));
        }
        if self.token_duration_minutes == 0 {
            return Err(KeeperError::Config(
                "token_duration_minutes must be at least 1".into(),
            ));
        }
        if self.token_duration() > TokenAuthority::MAX_VALIDITY {
            return Err(KeeperError::Config(format!(
                "token_duration_minutes must be at most {}",
                TokenAuthority::MAX_VALIDITY.as_secs() / 60
            )));
        }
        self.password_scheme().map(|_| ())
    }

    pub fn shared_secret(&self) -> SharedSecret {
        SharedSecret::new(self.secret_key.as_bytes())
    }

    pub fn token_duration(&self) -> Duration {
        Duration::from_secs(self.token_duration_minutes.saturating_mul(60))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    pub fn password_scheme(&self) -> Result<PasswordScheme> {
        match self.password_scheme.as_str() {
            "argon2" => Ok(PasswordScheme::Argon2(self.argon2_params())),
            "base64" => Ok(PasswordScheme::Base64Legacy),
            other => Err(KeeperError::Config(format!(
                "unknown password_scheme '{other}' (expected 'argon2' or 'base64')"
            ))),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("secret_key", &"<redacted>")
            .field("database_path", &self.database_path)
            .field("token_duration_minutes", &self.token_duration_minutes)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("password_scheme", &self.password_scheme)
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
