//! Tissue hierarchy CLI library.
//!
//! The types and command handlers behind the `tissue-hier` binary. The
//! binary parses arguments, installs tracing and calls [`run`]; other
//! front ends can build a [`Cli`](cli::Cli) themselves or call the
//! handlers in [`commands`] directly.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;

use cli::{Cli, Commands};

/// Dispatch a parsed [`Cli`] to the appropriate command handler.
pub fn run(cli: Cli) -> error::CliResult<()> {
    match cli.command {
        Commands::Assign {
            input,
            policy,
            output,
            format,
        } => commands::assign::run(&input, &policy, output.as_deref(), format, cli.quiet),

        Commands::Validate { input, policy } => {
            commands::validate::run(&input, &policy, cli.quiet)
        }

        Commands::Presets { name } => commands::presets::run(name.as_deref()),
    }
}
