//! `keeper list`: display the caller's secret names in a table.

use crate::cli::output;
use crate::cli::{call, open_keeper, Cli};
use crate::errors::{KeeperError, Result};
use crate::rpc::{Operation, Reply, Request};

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let keeper = open_keeper(cli)?;

    let Reply::Names(names) = call(cli, &keeper, Request::new(Operation::ListNames))? else {
        return Err(KeeperError::CommandFailed("unexpected reply to ListNames".into()));
    };

    output::print_names_table(&names);
    Ok(())
}
