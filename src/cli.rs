//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Relative
//! paths given on the command line are interpreted inside `--directory` when
//! it is set.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{DuplicatePolicy, HostPlatform};
use crate::manifest::DEFAULT_MANIFEST;

mod parsing;

use parsing::parse_var;

/// Compile a YAML list of build requests into CMake custom-command rules.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the manifest file to use.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Add or override a manifest variable; may be repeated.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Platform the generated rules target; defaults to the current one.
    #[arg(long, value_name = "HOST", value_parser = HostPlatform::from_str)]
    pub host: Option<HostPlatform>,

    /// Warn about colliding request, target, or variable names instead of
    /// failing.
    #[arg(long)]
    pub allow_duplicate_names: bool,

    /// Optional subcommand to execute; defaults to `emit` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Emit { file: None });
        }
        self
    }

    /// Resolve `path` against `--directory`.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.directory
            .as_ref()
            .map_or_else(|| path.to_path_buf(), |dir| dir.join(path))
    }

    /// Location of the manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.resolve_path(&self.file)
    }

    /// Duplicate-name policy selected by the flags.
    #[must_use]
    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.allow_duplicate_names {
            DuplicatePolicy::Allow
        } else {
            DuplicatePolicy::Reject
        }
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Write the generated CMake rules.
    Emit {
        /// Destination file; standard output when omitted or `-`.
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Compile the manifest and report what it contains without writing rules.
    Check,

    /// Print the intermediate rule records as JSON.
    Rules,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kumiki").chain(args.iter().copied()))
            .expect("parse")
            .with_default_command()
    }

    #[rstest]
    fn defaults_to_emit_on_stdout() {
        let cli = parse(&[]);
        assert_eq!(cli.file, PathBuf::from(DEFAULT_MANIFEST));
        assert_eq!(cli.command, Some(Commands::Emit { file: None }));
        assert_eq!(cli.duplicate_policy(), DuplicatePolicy::Reject);
        assert!(cli.host.is_none());
    }

    #[rstest]
    fn collects_overrides_in_order() {
        let cli = parse(&["--var", "A=1", "--var", "B=2", "--var", "A=3", "check"]);
        let vars: Vec<_> = cli
            .vars
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        assert_eq!(vars, ["A=1", "B=2", "A=3"]);
        assert_eq!(cli.command, Some(Commands::Check));
    }

    #[rstest]
    fn parses_host_and_duplicate_flags() {
        let cli = parse(&["--host", "windows", "--allow-duplicate-names", "rules"]);
        assert_eq!(cli.host, Some(HostPlatform::Windows));
        assert_eq!(cli.duplicate_policy(), DuplicatePolicy::Allow);
        assert_eq!(cli.command, Some(Commands::Rules));
    }

    #[rstest]
    fn directory_prefixes_relative_paths() {
        let cli = parse(&["-C", "work", "-f", "rules.yml", "emit", "out.cmake"]);
        assert_eq!(cli.manifest_path(), Path::new("work").join("rules.yml"));
        assert_eq!(
            cli.resolve_path(Path::new("out.cmake")),
            Path::new("work").join("out.cmake")
        );
    }

    #[rstest]
    #[case(&["--var", "NOEQUALS"])]
    #[case(&["--host", "beos"])]
    fn rejects_invalid_values(#[case] args: &[&str]) {
        let argv = std::iter::once("kumiki").chain(args.iter().copied());
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
