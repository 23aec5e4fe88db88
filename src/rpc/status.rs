//! Error kind → wire status translation.
//!
//! This is the only place where a `KeeperError` is flattened; every layer
//! below forwards the typed error untouched.

use std::fmt;

use crate::errors::KeeperError;

/// Wire status codes (a subset of the gRPC codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Unauthenticated,
    AlreadyExists,
    NotFound,
    DeadlineExceeded,
    Internal,
}

impl From<&KeeperError> for Code {
    fn from(err: &KeeperError) -> Self {
        match err {
            KeeperError::Unauthenticated(_) | KeeperError::InvalidCredentials(_) => {
                Code::Unauthenticated
            }
            KeeperError::Conflict { .. } => Code::AlreadyExists,
            KeeperError::NotFound { .. } => Code::NotFound,
            KeeperError::DeadlineExceeded(_) => Code::DeadlineExceeded,
            _ => Code::Internal,
        }
    }
}

/// A failed call as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl From<KeeperError> for Status {
    fn from(err: KeeperError) -> Self {
        Self {
            code: Code::from(&err),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}
