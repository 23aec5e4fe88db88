//! CLI module: Clap argument parser, output helpers, and command implementations.
//!
//! Every command opens the keeper in-process against the configured
//! database and goes through the same gated call path a remote transport
//! would use.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::catalog::{Card, Credential, SecretBody, SecretKind};
use crate::config::Settings;
use crate::errors::{KeeperError, Result};
use crate::rpc::{Reply, Request};
use crate::server::Keeper;

/// Keeper CLI: a personal vault for passwords, notes, files and cards.
#[derive(Parser)]
#[command(
    name = "keeper",
    about = "Personal vault for passwords, notes, files and cards",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: keeper.toml)
    #[arg(long, env = "KEEPER_CONFIG", default_value = Settings::FILE_NAME, global = true)]
    pub config: PathBuf,

    /// SQLite database file (overrides the config file)
    #[arg(long, env = "KEEPER_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Shared secret for token signing and encryption (overrides the config file)
    #[arg(long, env = "KEEPER_SECRET_KEY", hide_env_values = true, global = true)]
    pub secret_key: Option<String>,

    /// Token validity in minutes (overrides the config file)
    #[arg(long, env = "KEEPER_TOKEN_DURATION", global = true)]
    pub token_duration: Option<u64>,

    /// Bearer token printed by `keeper login`
    #[arg(long, env = "KEEPER_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create an account and print a token for it
    Register {
        /// Account login
        login: String,
    },

    /// Log in and print a fresh token
    Login {
        /// Account login
        login: String,
    },

    /// Store a new secret (fails if the name is taken)
    Save {
        /// Secret kind: raw, credential, file or card
        kind: SecretKind,
        /// Secret name
        name: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Print a secret
    Get {
        /// Secret kind: raw, credential, file or card
        kind: SecretKind,
        /// Secret name
        name: String,
        /// Write file secrets here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace an existing secret
    Update {
        /// Secret kind: raw, credential, file or card
        kind: SecretKind,
        /// Secret name
        name: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Delete a secret
    Delete {
        /// Secret kind: raw, credential, file or card
        kind: SecretKind,
        /// Secret name
        name: String,
    },

    /// List the names of your secrets
    List,
}

/// Payload fields for `save` and `update`.  Which ones are required
/// depends on the secret kind.
#[derive(clap::Args, Default)]
pub struct PayloadArgs {
    /// Free-text comment stored unencrypted next to the secret
    #[arg(short, long, default_value = "")]
    pub comment: String,

    /// Text of a raw secret (read from stdin or prompted if omitted)
    #[arg(long)]
    pub text: Option<String>,

    /// File whose bytes make up a file secret
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Credential login
    #[arg(long)]
    pub login: Option<String>,

    /// Credential password (prompted if omitted)
    #[arg(long)]
    pub password: Option<String>,

    /// Card number
    #[arg(long)]
    pub number: Option<String>,

    /// Card expiry month
    #[arg(long)]
    pub month: Option<String>,

    /// Card expiry year
    #[arg(long)]
    pub year: Option<String>,

    /// Card holder name
    #[arg(long)]
    pub holder: Option<String>,

    /// Card verification code
    #[arg(long)]
    pub cvv: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load the config file and apply command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&cli.config)?;

    if let Some(path) = &cli.database {
        settings.database_path = path.clone();
    }
    if let Some(secret) = &cli.secret_key {
        settings.secret_key = secret.clone();
    }
    if let Some(minutes) = cli.token_duration {
        settings.token_duration_minutes = minutes;
    }

    Ok(settings)
}

/// Open the keeper described by the CLI arguments.
pub fn open_keeper(cli: &Cli) -> Result<Keeper> {
    Keeper::open(&load_settings(cli)?)
}

/// Issue `request` against the keeper, attaching the caller's token.
pub fn call(cli: &Cli, keeper: &Keeper, request: Request) -> Result<Reply> {
    let request = match &cli.token {
        Some(token) => request.with_token(token),
        None => request,
    };
    keeper
        .call(request)
        .map_err(|status| KeeperError::CommandFailed(status.to_string()))
}

/// Get the account password, trying in order:
/// 1. `KEEPER_PASSWORD` env var (scripts and CI)
/// 2. Interactive prompt (with confirmation when `confirm` is set)
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password(confirm: bool) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("KEEPER_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Enter account password");
    if confirm {
        prompt = prompt.with_confirmation(
            "Confirm account password",
            "Passwords do not match, try again",
        );
    }
    let pw = prompt
        .interact()
        .map_err(|e| KeeperError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Build the secret body for `kind` from the payload arguments.
pub fn read_payload(kind: SecretKind, args: &PayloadArgs) -> Result<SecretBody> {
    match kind {
        SecretKind::Raw => Ok(SecretBody::Raw(read_text(args)?)),
        SecretKind::File => {
            let path = required(&args.file, "--file", kind)?;
            Ok(SecretBody::File(std::fs::read(path)?))
        }
        SecretKind::Credential => {
            let login = required(&args.login, "--login", kind)?.clone();
            let password = match &args.password {
                Some(pw) => pw.clone(),
                None => dialoguer::Password::new()
                    .with_prompt(format!("Password for {login}"))
                    .interact()
                    .map_err(|e| KeeperError::CommandFailed(format!("input prompt: {e}")))?,
            };
            Ok(SecretBody::Credential(Credential { login, password }))
        }
        SecretKind::Card => Ok(SecretBody::Card(Card {
            number: required(&args.number, "--number", kind)?.clone(),
            month: required(&args.month, "--month", kind)?.clone(),
            year: required(&args.year, "--year", kind)?.clone(),
            holder: required(&args.holder, "--holder", kind)?.clone(),
            cvv: required(&args.cvv, "--cvv", kind)?.clone(),
        })),
    }
}

/// Raw text from `--text`, piped stdin, or a hidden prompt.
fn read_text(args: &PayloadArgs) -> Result<String> {
    if let Some(text) = &args.text {
        output::warning("Value provided on command line; it may appear in shell history.");
        return Ok(text.clone());
    }

    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf.trim_end().to_string());
    }

    dialoguer::Password::new()
        .with_prompt("Enter secret text")
        .interact()
        .map_err(|e| KeeperError::CommandFailed(format!("input prompt: {e}")))
}

fn required<'a, T>(value: &'a Option<T>, flag: &str, kind: SecretKind) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| KeeperError::CommandFailed(format!("{flag} is required for {kind} secrets")))
}
