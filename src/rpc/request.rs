use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use zeroize::Zeroizing;

use crate::auth::Identity;
pub use crate::catalog::SecretBody;
use crate::catalog::SecretKind;

/// Metadata key holding the bearer token.
pub const AUTHORIZATION: &str = "authorization";

/// Call metadata: case-insensitive keys, possibly repeated values.
#[derive(Clone, Default)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata carrying a single `authorization: Bearer <token>` entry.
    pub fn bearer(token: &str) -> Self {
        let mut metadata = Self::new();
        metadata.insert(AUTHORIZATION, format!("Bearer {token}"));
        metadata
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The bearer token, with an optional `Bearer ` scheme prefix removed.
    pub fn token(&self) -> Option<&str> {
        let value = self.get(AUTHORIZATION)?.trim();
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        (!token.is_empty()).then_some(token)
    }
}

/// A named secret payload with its plaintext comment, as sent by Save/Update.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretInput {
    pub name: String,
    pub body: SecretBody,
    pub comment: String,
}

/// Every operation the keeper exposes.
pub enum Operation {
    Register {
        login: String,
        password: Zeroizing<String>,
    },
    Login {
        login: String,
        password: Zeroizing<String>,
    },
    Save(SecretInput),
    Get {
        kind: SecretKind,
        name: String,
    },
    Update(SecretInput),
    Delete {
        kind: SecretKind,
        name: String,
    },
    ListNames,
}

impl Operation {
    /// Wire method name, e.g. `SaveRaw`, `GetCard`, `ListNames`.
    pub fn method(&self) -> String {
        match self {
            Self::Register { .. } => "Register".to_string(),
            Self::Login { .. } => "Login".to_string(),
            Self::Save(input) => format!("Save{}", input.body.kind()),
            Self::Get { kind, .. } => format!("Get{kind}"),
            Self::Update(input) => format!("Update{}", input.body.kind()),
            Self::Delete { kind, .. } => format!("Delete{kind}"),
            Self::ListNames => "ListNames".to_string(),
        }
    }

    /// Register and Login are the only calls allowed without a token.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Register { .. } | Self::Login { .. })
    }
}

/// An inbound call.
pub struct Request {
    pub operation: Operation,
    pub metadata: Option<Metadata>,
    pub deadline: Option<Instant>,
    identity: Option<Identity>,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            metadata: None,
            deadline: None,
            identity: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_token(self, token: &str) -> Self {
        self.with_metadata(Metadata::bearer(token))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn method(&self) -> String {
        self.operation.method()
    }

    /// The caller resolved by the auth gate, if the request passed one.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub(crate) fn attach_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Successful call outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Authorized { user_id: String, token: String },
    Secret { body: SecretBody, comment: String },
    Names(Vec<String>),
    Done,
}
