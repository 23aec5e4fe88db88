//! Transport-agnostic call surface.
//!
//! A transport (gRPC, HTTP, the local CLI) turns its wire messages into a
//! [`Request`], hands it to a [`Handler`] and maps the outcome back with
//! [`Status`].  Handlers compose as decorators: the auth gate is a
//! `Handler` wrapping another `Handler`.

pub mod request;
pub mod status;

pub use request::{Metadata, Operation, Reply, Request, SecretBody, SecretInput, AUTHORIZATION};
pub use status::{Code, Status};

use crate::errors::Result;

/// Something that can serve a call.
pub trait Handler: Send + Sync {
    fn handle(&self, request: Request) -> Result<Reply>;
}

impl<H: Handler + ?Sized> Handler for std::sync::Arc<H> {
    fn handle(&self, request: Request) -> Result<Reply> {
        (**self).handle(request)
    }
}
