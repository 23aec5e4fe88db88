//! `keeper delete`: remove a secret.

use crate::catalog::SecretKind;
use crate::cli::output;
use crate::cli::{call, open_keeper, Cli};
use crate::errors::Result;
use crate::rpc::{Operation, Request};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, kind: SecretKind, name: &str) -> Result<()> {
    let keeper = open_keeper(cli)?;

    call(
        cli,
        &keeper,
        Request::new(Operation::Delete {
            kind,
            name: name.to_string(),
        }),
    )?;

    output::success(&format!("Deleted secret '{name}'"));
    Ok(())
}
