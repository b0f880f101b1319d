//! `autolink completions` command
//!
//! Prints a completion script for `autolink` and its `generate`/`list`
//! flags to stdout, e.g. `autolink completions zsh > _autolink`.

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(args.shell, &mut cmd, name, &mut io::stdout());

    Ok(())
}
