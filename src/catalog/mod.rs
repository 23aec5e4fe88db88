//! Secret catalog: the four secret kinds and the single
//! serialize → encrypt → persist pipeline they share.

pub mod secret;
pub mod service;

pub use secret::{Card, Credential, SecretBody, SecretKind, SecretPayload};
pub use service::{SecretCatalog, Stored};
