//! High-level secret operations.
//!
//! `SecretCatalog` funnels every kind through one pipeline:
//! encode → encrypt → `BlobStore` on the way in, and
//! `BlobStore` → decrypt → decode on the way out.  Plaintext lives only in
//! zeroizing buffers between those steps.

use std::sync::Arc;

use tracing::info;

use super::secret::{Card, Credential, SecretBody, SecretKind, SecretPayload};
use crate::crypto::Cipher;
use crate::errors::{KeeperError, Result};
use crate::store::{BlobStore, SecretRecord};

/// Longest accepted secret name, in bytes.
const MAX_NAME_LEN: usize = 256;

/// A decrypted payload together with its comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<P> {
    pub payload: P,
    pub comment: String,
}

pub struct SecretCatalog {
    store: Arc<dyn BlobStore>,
    cipher: Arc<Cipher>,
}

impl SecretCatalog {
    pub fn new(store: Arc<dyn BlobStore>, cipher: Arc<Cipher>) -> Self {
        Self { store, cipher }
    }

    // ------------------------------------------------------------------
    // Typed pipeline
    // ------------------------------------------------------------------

    /// Encrypt and store a new secret; an existing `name` is a conflict.
    pub fn save<P: SecretPayload>(
        &self,
        owner: &str,
        name: &str,
        payload: &P,
        comment: &str,
    ) -> Result<()> {
        validate_name(name)?;
        info!(owner, name, kind = %P::KIND, "saving secret");
        let record = self.seal(owner, name, payload, comment)?;
        self.store.save(&record)
    }

    /// Fetch, decrypt and decode the secret `name` of kind `P::KIND`.
    pub fn get<P: SecretPayload>(&self, owner: &str, name: &str) -> Result<Stored<P>> {
        info!(owner, name, kind = %P::KIND, "reading secret");
        let blob = self.store.get(owner, name, P::KIND)?;
        let plaintext = self.cipher.decrypt(&blob.ciphertext)?;
        Ok(Stored {
            payload: P::decode(plaintext)?,
            comment: blob.comment,
        })
    }

    /// Re-encrypt and replace an existing secret in place.
    pub fn update<P: SecretPayload>(
        &self,
        owner: &str,
        name: &str,
        payload: &P,
        comment: &str,
    ) -> Result<()> {
        info!(owner, name, kind = %P::KIND, "updating secret");
        let record = self.seal(owner, name, payload, comment)?;
        self.store.update(&record)
    }

    pub fn delete(&self, owner: &str, name: &str) -> Result<()> {
        info!(owner, name, "deleting secret");
        self.store.delete(owner, name)
    }

    /// Names of all secrets owned by `owner`, in no particular order.
    pub fn list_names(&self, owner: &str) -> Result<Vec<String>> {
        self.store.list_names(owner)
    }

    fn seal<P: SecretPayload>(
        &self,
        owner: &str,
        name: &str,
        payload: &P,
        comment: &str,
    ) -> Result<SecretRecord> {
        let plaintext = payload.encode()?;
        Ok(SecretRecord {
            name: name.to_string(),
            kind: P::KIND,
            owner: owner.to_string(),
            ciphertext: self.cipher.encrypt(&plaintext)?,
            comment: comment.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Wire-level dispatch on `SecretBody`
    // ------------------------------------------------------------------

    pub fn save_body(
        &self,
        owner: &str,
        name: &str,
        body: &SecretBody,
        comment: &str,
    ) -> Result<()> {
        match body {
            SecretBody::Raw(text) => self.save(owner, name, text, comment),
            SecretBody::Credential(cred) => self.save(owner, name, cred, comment),
            SecretBody::File(bytes) => self.save(owner, name, bytes, comment),
            SecretBody::Card(card) => self.save(owner, name, card, comment),
        }
    }

    pub fn update_body(
        &self,
        owner: &str,
        name: &str,
        body: &SecretBody,
        comment: &str,
    ) -> Result<()> {
        match body {
            SecretBody::Raw(text) => self.update(owner, name, text, comment),
            SecretBody::Credential(cred) => self.update(owner, name, cred, comment),
            SecretBody::File(bytes) => self.update(owner, name, bytes, comment),
            SecretBody::Card(card) => self.update(owner, name, card, comment),
        }
    }

    pub fn get_body(
        &self,
        owner: &str,
        name: &str,
        kind: SecretKind,
    ) -> Result<Stored<SecretBody>> {
        Ok(match kind {
            SecretKind::Raw => self.get::<String>(owner, name)?.map(SecretBody::Raw),
            SecretKind::Credential => self
                .get::<Credential>(owner, name)?
                .map(SecretBody::Credential),
            SecretKind::File => self.get::<Vec<u8>>(owner, name)?.map(SecretBody::File),
            SecretKind::Card => self.get::<Card>(owner, name)?.map(SecretBody::Card),
        })
    }
}

impl<P> Stored<P> {
    fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Stored<Q> {
        Stored {
            payload: f(self.payload),
            comment: self.comment,
        }
    }
}

/// Names must be non-empty, at most 256 bytes, and free of control characters.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(KeeperError::InvalidName("secret name cannot be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(KeeperError::InvalidName(format!(
            "secret name cannot exceed {MAX_NAME_LEN} bytes"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(KeeperError::InvalidName(
            "secret name cannot contain control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SharedSecret;
    use crate::store::{
        Database, SqliteBlobStore, SqliteUserStore, StoredBlob, UserRecord, UserStore,
    };

    fn catalog() -> (SecretCatalog, Arc<SqliteBlobStore>) {
        let db = Database::open_in_memory().unwrap();
        let users = SqliteUserStore::new(db.clone());
        for id in ["u1", "u2"] {
            users
                .save(&UserRecord {
                    id: id.into(),
                    login: id.into(),
                    password: "x".into(),
                })
                .unwrap();
        }
        let store = Arc::new(SqliteBlobStore::new(db));
        let cipher = Arc::new(Cipher::new(&SharedSecret::new("catalog-test")).unwrap());
        (
            SecretCatalog::new(Arc::clone(&store) as Arc<dyn BlobStore>, cipher),
            store,
        )
    }

    #[test]
    fn stored_form_is_ciphertext() {
        let (catalog, store) = catalog();
        catalog
            .save("u1", "note1", &"hello world".to_string(), "comment A")
            .unwrap();

        let StoredBlob {
            ciphertext,
            comment,
        } = store.get("u1", "note1", SecretKind::Raw).unwrap();
        assert_eq!(comment, "comment A");
        assert!(!ciphertext
            .windows(b"hello world".len())
            .any(|w| w == b"hello world"));
    }

    #[test]
    fn raw_lifecycle() {
        let (catalog, _) = catalog();
        catalog
            .save("u1", "note1", &"hello world".to_string(), "comment A")
            .unwrap();
        let got = catalog.get::<String>("u1", "note1").unwrap();
        assert_eq!(got.payload, "hello world");
        assert_eq!(got.comment, "comment A");

        catalog
            .update("u1", "note1", &"hello again".to_string(), "comment B")
            .unwrap();
        let got = catalog.get::<String>("u1", "note1").unwrap();
        assert_eq!(got.payload, "hello again");
        assert_eq!(got.comment, "comment B");

        catalog.delete("u1", "note1").unwrap();
        assert!(matches!(
            catalog.get::<String>("u1", "note1"),
            Err(KeeperError::NotFound { .. })
        ));
    }

    #[test]
    fn file_payload_keeps_arbitrary_bytes() {
        let (catalog, _) = catalog();
        let bytes: Vec<u8> = (0..=255).collect();
        catalog.save("u1", "blob", &bytes, "").unwrap();
        assert_eq!(catalog.get::<Vec<u8>>("u1", "blob").unwrap().payload, bytes);

        catalog.save("u1", "empty", &Vec::<u8>::new(), "").unwrap();
        assert!(catalog
            .get::<Vec<u8>>("u1", "empty")
            .unwrap()
            .payload
            .is_empty());
    }

    #[test]
    fn credential_roundtrip() {
        let (catalog, _) = catalog();
        let cred = Credential {
            login: "alice".into(),
            password: "s3cr3t".into(),
        };
        catalog.save("u1", "mail", &cred, "work").unwrap();

        let got = catalog.get::<Credential>("u1", "mail").unwrap();
        assert_eq!(got.payload, cred);
        assert_eq!(got.comment, "work");
    }

    #[test]
    fn reading_with_the_wrong_kind_is_not_found() {
        let (catalog, _) = catalog();
        catalog.save("u1", "note1", &"x".to_string(), "").unwrap();
        assert!(matches!(
            catalog.get::<Card>("u1", "note1"),
            Err(KeeperError::NotFound { .. })
        ));
    }

    #[test]
    fn corrupted_ciphertext_fails_instead_of_returning_data() {
        let (catalog, store) = catalog();
        catalog.save("u1", "note1", &"x".to_string(), "c").unwrap();

        let mut blob = store.get("u1", "note1", SecretKind::Raw).unwrap();
        blob.ciphertext[14] ^= 0x01;
        store
            .update(&SecretRecord {
                name: "note1".into(),
                kind: SecretKind::Raw,
                owner: "u1".into(),
                ciphertext: blob.ciphertext,
                comment: blob.comment,
            })
            .unwrap();

        assert!(matches!(
            catalog.get::<String>("u1", "note1"),
            Err(KeeperError::DecryptionFailed)
        ));
    }

    #[test]
    fn body_dispatch_matches_kind() {
        let (catalog, _) = catalog();
        let body = SecretBody::Raw("text".into());
        catalog.save_body("u1", "n", &body, "c").unwrap();

        let got = catalog.get_body("u1", "n", SecretKind::Raw).unwrap();
        assert_eq!(got.payload, body);
        assert!(catalog.get_body("u1", "n", SecretKind::File).is_err());
    }

    #[test]
    fn invalid_names_are_rejected_on_save() {
        let (catalog, _) = catalog();
        let long = "n".repeat(MAX_NAME_LEN + 1);
        for bad in ["", "   ", "tab\tname", long.as_str()] {
            assert!(matches!(
                catalog.save("u1", bad, &"x".to_string(), ""),
                Err(KeeperError::InvalidName(_))
            ));
        }
    }
}
