//! `keeper get`: decrypt and print a single secret.

use std::io::{self, Write};
use std::path::Path;

use crate::catalog::{SecretBody, SecretKind};
use crate::cli::output;
use crate::cli::{call, open_keeper, Cli};
use crate::errors::{KeeperError, Result};
use crate::rpc::{Operation, Reply, Request};

/// Execute the `get` command.
pub fn execute(cli: &Cli, kind: SecretKind, name: &str, output_path: Option<&Path>) -> Result<()> {
    let keeper = open_keeper(cli)?;

    let reply = call(
        cli,
        &keeper,
        Request::new(Operation::Get {
            kind,
            name: name.to_string(),
        }),
    )?;
    let Reply::Secret { body, comment } = reply else {
        return Err(KeeperError::CommandFailed(format!(
            "unexpected reply: {reply:?}"
        )));
    };

    match &body {
        SecretBody::Raw(text) => println!("{text}"),
        SecretBody::Credential(cred) => output::print_fields_table(&[
            ("login", cred.login.as_str()),
            ("password", cred.password.as_str()),
        ]),
        SecretBody::Card(card) => output::print_fields_table(&[
            ("number", card.number.as_str()),
            ("month", card.month.as_str()),
            ("year", card.year.as_str()),
            ("holder", card.holder.as_str()),
            ("cvv", card.cvv.as_str()),
        ]),
        SecretBody::File(bytes) => match output_path {
            Some(path) => {
                std::fs::write(path, bytes)?;
                output::success(&format!(
                    "Wrote {} byte(s) to {}",
                    bytes.len(),
                    path.display()
                ));
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(bytes)?;
                stdout.flush()?;
            }
        },
    }

    let binary_on_stdout = matches!(body, SecretBody::File(_)) && output_path.is_none();
    if !comment.is_empty() && !binary_on_stdout {
        output::info(&format!("Comment: {comment}"));
    }

    Ok(())
}
