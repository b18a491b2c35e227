//! `completions`: shell completion scripts.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::{Cli, CompletionsArgs};

/// Print the completion script for the requested shell to stdout.
pub fn run(args: &CompletionsArgs) {
    write_script(args.shell, &mut std::io::stdout());
}

fn write_script(shell: Shell, out: &mut impl Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}
