//! The composition root: builds every service from `Settings` and exposes
//! the gated handler to transports.

pub mod service;

pub use service::KeeperService;

use std::sync::Arc;

use tracing::{info, info_span, warn};

use crate::auth::{AuthGate, Clock, SystemClock, TokenAuthority};
use crate::config::Settings;
use crate::crypto::Cipher;
use crate::errors::Result;
use crate::rpc::{Handler, Reply, Request, Status};
use crate::store::Database;

pub struct Keeper {
    handler: AuthGate<KeeperService>,
}

impl Keeper {
    /// Validate `settings`, open the configured database and wire the
    /// services together.
    pub fn open(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let db = Database::open(&settings.database_path, settings.store_timeout())?;
        Self::with_database(settings, db, Arc::new(SystemClock))
    }

    /// Build on an already-open database, with an explicit clock.
    pub fn with_database(
        settings: &Settings,
        db: Database,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        settings.validate()?;
        let secret = settings.shared_secret();

        let authority = Arc::new(
            TokenAuthority::new(&secret, settings.token_duration())?.with_clock(clock),
        );
        let cipher = Arc::new(Cipher::new(&secret)?);

        let service = KeeperService::new(
            db,
            settings.password_scheme()?,
            cipher,
            Arc::clone(&authority),
        );
        info!(scheme = %settings.password_scheme, "keeper ready");

        Ok(Self {
            handler: AuthGate::new(authority, service),
        })
    }

    /// Serve one call and translate a failure into its wire status.
    pub fn call(&self, request: Request) -> std::result::Result<Reply, Status> {
        let method = request.method();
        let _span = info_span!("call", %method).entered();

        self.handler.handle(request).map_err(|e| {
            let status = Status::from(e);
            warn!(code = ?status.code, "call failed");
            status
        })
    }
}
