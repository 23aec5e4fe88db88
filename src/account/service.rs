//! Registration and login.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::password::PasswordScheme;
use crate::errors::{KeeperError, Result};
use crate::store::{UserRecord, UserStore};

pub struct AccountService {
    users: Arc<dyn UserStore>,
    scheme: PasswordScheme,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, scheme: PasswordScheme) -> Self {
        Self { users, scheme }
    }

    /// Create a user with a fresh id; a taken login is a conflict.
    pub fn register(&self, login: &str, password: &str) -> Result<String> {
        if login.trim().is_empty() {
            return Err(KeeperError::InvalidName("login cannot be empty".into()));
        }

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            login: login.to_string(),
            password: self.scheme.encode(password)?,
        };
        self.users.save(&user)?;

        info!(login, user_id = %user.id, "user registered");
        Ok(user.id)
    }

    /// Resolve `login` to its user id if `password` matches.
    pub fn login(&self, login: &str, password: &str) -> Result<String> {
        let user = self.users.find_by_login(login)?;

        if !PasswordScheme::verify(password, &user.password)? {
            info!(login, "password is invalid");
            return Err(KeeperError::InvalidCredentials(login.to_string()));
        }

        Ok(user.id)
    }
}
