//! Secret kinds and their canonical byte encodings.
//!
//! RAW text and FILE bytes are stored exactly as given.  CREDENTIAL and
//! CARD payloads are JSON objects whose field order is fixed by the struct
//! declarations below.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{KeeperError, Result};

/// Which payload shape a record holds.  The discriminant is the value
/// persisted in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    Raw = 0,
    Credential = 1,
    File = 2,
    Card = 3,
}

impl SecretKind {
    pub const ALL: [SecretKind; 4] = [Self::Raw, Self::Credential, Self::File, Self::Card];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "Raw",
            Self::Credential => "Credential",
            Self::File => "File",
            Self::Card => "Card",
        })
    }
}

impl FromStr for SecretKind {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "text" => Ok(Self::Raw),
            "credential" | "login" => Ok(Self::Credential),
            "file" | "binary" => Ok(Self::File),
            "card" => Ok(Self::Card),
            other => Err(KeeperError::CommandFailed(format!(
                "unknown secret kind '{other}' (expected raw, credential, file or card)"
            ))),
        }
    }
}

/// A login/password pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    pub login: String,
    pub password: String,
}

/// A payment card.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Card {
    pub number: String,
    pub month: String,
    pub year: String,
    pub holder: String,
    pub cvv: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self
            .number
            .get(self.number.len().saturating_sub(4)..)
            .unwrap_or_default();
        f.debug_struct("Card")
            .field("number", &format_args!("****{tail}"))
            .field("month", &self.month)
            .field("year", &self.year)
            .field("holder", &self.holder)
            .field("cvv", &"<redacted>")
            .finish()
    }
}

/// A typed secret payload with a canonical byte form.
pub trait SecretPayload: Sized {
    const KIND: SecretKind;

    fn encode(&self) -> Result<Zeroizing<Vec<u8>>>;

    fn decode(bytes: Zeroizing<Vec<u8>>) -> Result<Self>;
}

/// RAW: UTF-8 text, stored unchanged.
impl SecretPayload for String {
    const KIND: SecretKind = SecretKind::Raw;

    fn encode(&self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.as_bytes().to_vec()))
    }

    fn decode(mut bytes: Zeroizing<Vec<u8>>) -> Result<Self> {
        String::from_utf8(std::mem::take(&mut *bytes)).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            KeeperError::Serialization("raw secret is not valid UTF-8".to_string())
        })
    }
}

/// FILE: arbitrary bytes, stored unchanged.
impl SecretPayload for Vec<u8> {
    const KIND: SecretKind = SecretKind::File;

    fn encode(&self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.clone()))
    }

    fn decode(mut bytes: Zeroizing<Vec<u8>>) -> Result<Self> {
        Ok(std::mem::take(&mut *bytes))
    }
}

impl SecretPayload for Credential {
    const KIND: SecretKind = SecretKind::Credential;

    fn encode(&self) -> Result<Zeroizing<Vec<u8>>> {
        to_json(self, "credential")
    }

    fn decode(bytes: Zeroizing<Vec<u8>>) -> Result<Self> {
        from_json(&bytes, "credential")
    }
}

impl SecretPayload for Card {
    const KIND: SecretKind = SecretKind::Card;

    fn encode(&self) -> Result<Zeroizing<Vec<u8>>> {
        to_json(self, "card")
    }

    fn decode(bytes: Zeroizing<Vec<u8>>) -> Result<Self> {
        from_json(&bytes, "card")
    }
}

fn to_json<T: Serialize>(value: &T, what: &str) -> Result<Zeroizing<Vec<u8>>> {
    serde_json::to_vec(value)
        .map(Zeroizing::new)
        .map_err(|e| KeeperError::Serialization(format!("{what}: {e}")))
}

fn from_json<T: for<'de> Deserialize<'de>>(bytes: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| KeeperError::Serialization(format!("{what}: {e}")))
}

/// Any of the four payloads, as carried over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretBody {
    Raw(String),
    Credential(Credential),
    File(Vec<u8>),
    Card(Card),
}

impl SecretBody {
    pub fn kind(&self) -> SecretKind {
        match self {
            Self::Raw(_) => SecretKind::Raw,
            Self::Credential(_) => SecretKind::Credential,
            Self::File(_) => SecretKind::File,
            Self::Card(_) => SecretKind::Card,
        }
    }
}
