//! `keeper save` and `keeper update`: encrypt and store a secret.

use crate::catalog::SecretKind;
use crate::cli::output;
use crate::cli::{call, open_keeper, read_payload, Cli, PayloadArgs};
use crate::errors::Result;
use crate::rpc::{Operation, Request, SecretInput};

/// Execute the `save` command.
pub fn save(cli: &Cli, kind: SecretKind, name: &str, args: &PayloadArgs) -> Result<()> {
    let input = secret_input(kind, name, args)?;
    let keeper = open_keeper(cli)?;

    call(cli, &keeper, Request::new(Operation::Save(input)))?;

    output::success(&format!("Saved {kind} secret '{name}'"));
    Ok(())
}

/// Execute the `update` command.
pub fn update(cli: &Cli, kind: SecretKind, name: &str, args: &PayloadArgs) -> Result<()> {
    let input = secret_input(kind, name, args)?;
    let keeper = open_keeper(cli)?;

    call(cli, &keeper, Request::new(Operation::Update(input)))?;

    output::success(&format!("Updated {kind} secret '{name}'"));
    Ok(())
}

fn secret_input(kind: SecretKind, name: &str, args: &PayloadArgs) -> Result<SecretInput> {
    Ok(SecretInput {
        name: name.to_string(),
        body: read_payload(kind, args)?,
        comment: args.comment.clone(),
    })
}
