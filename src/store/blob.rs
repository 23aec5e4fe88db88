//! Encrypted secret-record persistence.
//!
//! The store sees only ciphertext: encryption happens in the catalog before
//! a record gets here.  Names are the table's primary key, so they are
//! unique across all owners; every read and write is nevertheless scoped
//! to the calling owner.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::db::{is_unique_violation, Database};
use crate::catalog::SecretKind;
use crate::errors::{KeeperError, Result};

/// A record as written by Save/Update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub name: String,
    pub kind: SecretKind,
    pub owner: String,
    pub ciphertext: Vec<u8>,
    pub comment: String,
}

/// What Get returns: the ciphertext and its plaintext comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub ciphertext: Vec<u8>,
    pub comment: String,
}

/// Persistence of `(name, kind, owner) → ciphertext + comment`.
///
/// Implementations report a duplicate name as `KeeperError::Conflict` and
/// a missing or foreign record as `KeeperError::NotFound`; callers never
/// inspect backend-specific errors.
pub trait BlobStore: Send + Sync {
    fn save(&self, record: &SecretRecord) -> Result<()>;

    /// Look up by owner + name + kind.
    fn get(&self, owner: &str, name: &str, kind: SecretKind) -> Result<StoredBlob>;

    /// Replace kind, ciphertext and comment of the record `name` owned by `owner`.
    fn update(&self, record: &SecretRecord) -> Result<()>;

    fn delete(&self, owner: &str, name: &str) -> Result<()>;

    fn list_names(&self, owner: &str) -> Result<Vec<String>>;
}

/// `BlobStore` over the `secrets` table.
#[derive(Clone)]
pub struct SqliteBlobStore {
    db: Database,
}

impl SqliteBlobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl BlobStore for SqliteBlobStore {
    fn save(&self, record: &SecretRecord) -> Result<()> {
        debug!(name = %record.name, kind = %record.kind, "inserting secret record");
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO secrets (name, kind, ciphertext, owner, comment)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.name,
                record.kind.code(),
                record.ciphertext,
                record.owner,
                record.comment
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                KeeperError::secret_conflict(&record.name)
            } else {
                self.db.failure("save secret")(e)
            }
        })?;
        Ok(())
    }

    fn get(&self, owner: &str, name: &str, kind: SecretKind) -> Result<StoredBlob> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT ciphertext, comment FROM secrets
             WHERE owner = ?1 AND name = ?2 AND kind = ?3",
            params![owner, name, kind.code()],
            |row| {
                Ok(StoredBlob {
                    ciphertext: row.get(0)?,
                    comment: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(self.db.failure("get secret"))?
        .ok_or_else(|| KeeperError::secret_not_found(name))
    }

    fn update(&self, record: &SecretRecord) -> Result<()> {
        let conn = self.db.lock()?;
        let affected = conn
            .execute(
                "UPDATE secrets SET kind = ?1, ciphertext = ?2, comment = ?3
                 WHERE name = ?4 AND owner = ?5",
                params![
                    record.kind.code(),
                    record.ciphertext,
                    record.comment,
                    record.name,
                    record.owner
                ],
            )
            .map_err(self.db.failure("update secret"))?;

        if affected == 0 {
            return Err(KeeperError::secret_not_found(&record.name));
        }
        Ok(())
    }

    fn delete(&self, owner: &str, name: &str) -> Result<()> {
        let conn = self.db.lock()?;
        let affected = conn
            .execute(
                "DELETE FROM secrets WHERE name = ?1 AND owner = ?2",
                params![name, owner],
            )
            .map_err(self.db.failure("delete secret"))?;

        if affected == 0 {
            return Err(KeeperError::secret_not_found(name));
        }
        Ok(())
    }

    fn list_names(&self, owner: &str) -> Result<Vec<String>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare("SELECT name FROM secrets WHERE owner = ?1")
            .map_err(self.db.failure("list secrets"))?;

        let rows = stmt
            .query_map([owner], |row| row.get::<_, String>(0))
            .map_err(self.db.failure("list secrets"))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(self.db.failure("list secrets"))?);
        }
        Ok(names)
    }
}
