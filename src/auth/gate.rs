//! The auth gate: a `Handler` decorator that refuses every
//! authenticated-required call lacking a valid bearer token.
//!
//! Rejection happens before the wrapped handler is invoked, so a refused
//! call never partially executes.  On success the caller's `Identity` is
//! attached to the request for the handlers below.

use std::sync::Arc;

use tracing::{debug, warn};

use super::token::TokenAuthority;
use crate::errors::{KeeperError, Result};
use crate::rpc::{Handler, Reply, Request};

pub struct AuthGate<H> {
    authority: Arc<TokenAuthority>,
    inner: H,
}

impl<H: Handler> AuthGate<H> {
    pub fn new(authority: Arc<TokenAuthority>, inner: H) -> Self {
        Self { authority, inner }
    }

    fn authenticate(&self, request: &mut Request) -> Result<()> {
        let metadata = request
            .metadata
            .as_ref()
            .ok_or_else(|| KeeperError::Unauthenticated("metadata is not provided".into()))?;

        let token = metadata.token().ok_or_else(|| {
            KeeperError::Unauthenticated("authorization token is not provided".into())
        })?;

        let identity = self.authority.validate(token)?;
        request.attach_identity(identity);
        Ok(())
    }
}

impl<H: Handler> Handler for AuthGate<H> {
    fn handle(&self, mut request: Request) -> Result<Reply> {
        if !request.operation.requires_auth() {
            debug!(method = %request.method(), "unauthenticated call allowed");
            return self.inner.handle(request);
        }

        if let Err(e) = self.authenticate(&mut request) {
            warn!(method = %request.method(), error = %e, "call rejected by auth gate");
            return Err(e);
        }

        self.inner.handle(request)
    }
}
