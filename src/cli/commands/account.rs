//! `keeper register` and `keeper login`: obtain a bearer token.

use crate::cli::output;
use crate::cli::{call, open_keeper, prompt_password, Cli};
use crate::errors::{KeeperError, Result};
use crate::rpc::{Operation, Reply, Request};

/// Execute the `register` command.
pub fn register(cli: &Cli, login: &str) -> Result<()> {
    let keeper = open_keeper(cli)?;
    let password = prompt_password(true)?;

    let reply = call(
        cli,
        &keeper,
        Request::new(Operation::Register {
            login: login.to_string(),
            password,
        }),
    )?;

    output::success(&format!("Registered '{login}'"));
    print_token(reply)
}

/// Execute the `login` command.
pub fn login(cli: &Cli, login: &str) -> Result<()> {
    let keeper = open_keeper(cli)?;
    let password = prompt_password(false)?;

    let reply = call(
        cli,
        &keeper,
        Request::new(Operation::Login {
            login: login.to_string(),
            password,
        }),
    )?;

    output::success(&format!("Logged in as '{login}'"));
    print_token(reply)
}

/// The token goes to stdout on its own line so it can be captured.
fn print_token(reply: Reply) -> Result<()> {
    let Reply::Authorized { token, .. } = reply else {
        return Err(KeeperError::CommandFailed(format!(
            "unexpected reply: {reply:?}"
        )));
    };

    println!("{token}");
    output::tip("Pass it with --token or export KEEPER_TOKEN.");
    Ok(())
}
