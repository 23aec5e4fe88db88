pub mod account;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod rpc;
pub mod server;
pub mod store;
