//! Accounts: registration, login and the stored-password schemes.

pub mod password;
pub mod service;

pub use password::PasswordScheme;
pub use service::AccountService;
