//! User persistence.

use rusqlite::{params, OptionalExtension};

use super::db::{is_unique_violation, Database};
use crate::errors::{KeeperError, Result};

/// A registered user.  `password` holds whatever the configured password
/// scheme produced (a PHC hash or the legacy reversible encoding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub login: String,
    pub password: String,
}

pub trait UserStore: Send + Sync {
    /// Insert a new user; a taken login is `KeeperError::Conflict`.
    fn save(&self, user: &UserRecord) -> Result<()>;

    /// Look a user up by login; absence is `KeeperError::NotFound`.
    fn find_by_login(&self, login: &str) -> Result<UserRecord>;
}

#[derive(Clone)]
pub struct SqliteUserStore {
    db: Database,
}

impl SqliteUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl UserStore for SqliteUserStore {
    fn save(&self, user: &UserRecord) -> Result<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO users (id, login, password) VALUES (?1, ?2, ?3)",
            params![user.id, user.login, user.password],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                KeeperError::Conflict {
                    what: "User",
                    key: user.login.clone(),
                }
            } else {
                self.db.failure("save user")(e)
            }
        })?;
        Ok(())
    }

    fn find_by_login(&self, login: &str) -> Result<UserRecord> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT id, login, password FROM users WHERE login = ?1",
            [login],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    login: row.get(1)?,
                    password: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(self.db.failure("find user"))?
        .ok_or_else(|| KeeperError::NotFound {
            what: "User",
            key: login.to_string(),
        })
    }
}
