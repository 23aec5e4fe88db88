//! Relational persistence: SQLite-backed user and secret-record stores.
//!
//! This module provides:
//! - The shared connection handle and table bootstrap (`db`)
//! - The `BlobStore` trait and its SQLite implementation (`blob`)
//! - The `UserStore` trait and its SQLite implementation (`users`)

pub mod blob;
pub mod db;
pub mod users;

pub use blob::{BlobStore, SecretRecord, SqliteBlobStore, StoredBlob};
pub use db::Database;
pub use users::{SqliteUserStore, UserRecord, UserStore};
