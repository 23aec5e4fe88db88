//! One module per `keeper` subcommand.

pub mod account;
pub mod delete;
pub mod get;
pub mod list;
pub mod save;
