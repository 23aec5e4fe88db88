//! Operation dispatch behind the auth gate.

use std::sync::Arc;

use tracing::debug;

use crate::account::{AccountService, PasswordScheme};
use crate::auth::TokenAuthority;
use crate::catalog::SecretCatalog;
use crate::crypto::Cipher;
use crate::errors::{KeeperError, Result};
use crate::rpc::{Handler, Operation, Reply, Request};
use crate::store::{Database, SqliteBlobStore, SqliteUserStore};

/// Routes each `Operation` to the account or catalog service.
///
/// Secret operations act on behalf of the identity the gate attached; a
/// request that reaches them without one fails with `MissingIdentity`.
/// The services are built per call on a database handle bounded by the
/// request deadline, so a call that waits too long on the store fails with
/// `DeadlineExceeded` rather than completing late.
pub struct KeeperService {
    db: Database,
    scheme: PasswordScheme,
    cipher: Arc<Cipher>,
    authority: Arc<TokenAuthority>,
}

impl KeeperService {
    pub fn new(
        db: Database,
        scheme: PasswordScheme,
        cipher: Arc<Cipher>,
        authority: Arc<TokenAuthority>,
    ) -> Self {
        Self {
            db,
            scheme,
            cipher,
            authority,
        }
    }

    fn accounts(&self, db: &Database) -> AccountService {
        AccountService::new(Arc::new(SqliteUserStore::new(db.clone())), self.scheme)
    }

    fn catalog(&self, db: &Database) -> SecretCatalog {
        SecretCatalog::new(
            Arc::new(SqliteBlobStore::new(db.clone())),
            Arc::clone(&self.cipher),
        )
    }

    fn authorized(&self, user_id: String, login: &str) -> Result<Reply> {
        let token = self.authority.issue(&user_id, login)?;
        Ok(Reply::Authorized { user_id, token })
    }
}

impl Handler for KeeperService {
    fn handle(&self, request: Request) -> Result<Reply> {
        let method = request.method();
        if request.deadline_passed() {
            return Err(KeeperError::DeadlineExceeded(method));
        }
        let db = self.db.with_deadline(request.deadline);

        if !request.operation.requires_auth() {
            return match request.operation {
                Operation::Register { login, password } => {
                    let user_id = self.accounts(&db).register(&login, &password)?;
                    self.authorized(user_id, &login)
                }
                Operation::Login { login, password } => {
                    let user_id = self.accounts(&db).login(&login, &password)?;
                    self.authorized(user_id, &login)
                }
                _ => Err(KeeperError::MissingIdentity),
            };
        }

        let owner = request
            .identity()
            .map(|identity| identity.user_id.clone())
            .ok_or(KeeperError::MissingIdentity)?;
        debug!(%method, owner = %owner, "dispatching");
        let catalog = self.catalog(&db);

        match request.operation {
            Operation::Save(input) => {
                catalog.save_body(&owner, &input.name, &input.body, &input.comment)?;
                Ok(Reply::Done)
            }
            Operation::Get { kind, name } => {
                let stored = catalog.get_body(&owner, &name, kind)?;
                Ok(Reply::Secret {
                    body: stored.payload,
                    comment: stored.comment,
                })
            }
            Operation::Update(input) => {
                catalog.update_body(&owner, &input.name, &input.body, &input.comment)?;
                Ok(Reply::Done)
            }
            // Delete addresses a record by name alone; the kind in the call
            // only selects the wire method.
            Operation::Delete { name, .. } => {
                catalog.delete(&owner, &name)?;
                Ok(Reply::Done)
            }
            Operation::ListNames => Ok(Reply::Names(catalog.list_names(&owner)?)),
            Operation::Register { .. } | Operation::Login { .. } => {
                Err(KeeperError::MissingIdentity)
            }
        }
    }
}
