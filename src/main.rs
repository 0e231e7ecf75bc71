//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use clap::Parser;
use kumiki::{cli::Cli, runner};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse().with_default_command();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
    match runner::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "runner failed");
            drop(writeln!(io::stderr(), "Error: {err:?}"));
            ExitCode::FAILURE
        }
    }
}
