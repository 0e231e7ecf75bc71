//! CLI execution and command dispatch logic.
//!
//! This module keeps [`main`] minimal by providing a single entry point that
//! loads the manifest, builds the shared configuration, and runs the selected
//! command.

use crate::ast::BuildManifest;
use crate::cli::{Cli, Commands};
use crate::config::SharedConfig;
use crate::ir::RuleSet;
use crate::{cmake_gen, manifest};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, compilation fails, or
/// the output cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Emit { file: None });
    let manifest_path = cli.manifest_path();
    let manifest = manifest::from_path(&manifest_path)
        .with_context(|| format!("loading manifest at {}", manifest_path.display()))?;
    let cfg = shared_config(cli, &manifest);

    match command {
        Commands::Emit { file } => {
            let text = cmake_gen::emit(cfg.build_dirs(), &manifest.requests, &cfg)
                .context("generating CMake rules")?;
            match file.filter(|path| path.as_os_str() != "-") {
                Some(path) => write_atomic(&cli.resolve_path(&path), &text),
                None => write_stdout(&text),
            }
        }
        Commands::Check => {
            let set = RuleSet::from_requests(&manifest.requests, &cfg)
                .context("compiling requests")?;
            cmake_gen::generate(&set, cfg.build_dirs(), &cfg).context("generating CMake rules")?;
            write_stdout(&format!(
                "{}: {} requests, {} records\n",
                manifest_path.display(),
                manifest.requests.len(),
                set.records.len()
            ))
        }
        Commands::Rules => {
            let set = RuleSet::from_requests(&manifest.requests, &cfg)
                .context("compiling requests")?;
            let mut json = serde_json::to_string_pretty(&set).context("serialising rules")?;
            json.push('\n');
            write_stdout(&json)
        }
    }
}

/// Build the [`SharedConfig`] from the manifest and command-line overrides.
///
/// Overrides are applied in order, so the last `--var` for a key wins.
#[must_use]
pub fn shared_config(cli: &Cli, manifest: &BuildManifest) -> SharedConfig {
    let mut vars = manifest.vars.clone();
    for (key, value) in &cli.vars {
        debug!(key = key.as_str(), value = value.as_str(), "variable override");
        vars.insert(key.clone(), value.clone());
    }
    debug!(
        requests = manifest.requests.len(),
        vars = vars.len(),
        "loaded manifest"
    );
    SharedConfig::new(vars)
        .with_build_dirs(manifest.build_dirs.clone())
        .with_host(cli.host.unwrap_or_default())
        .with_duplicate_policy(cli.duplicate_policy())
}

fn write_stdout(text: &str) -> Result<()> {
    let mut handle = io::stdout().lock();
    handle
        .write_all(text.as_bytes())
        .and_then(|()| handle.flush())
        .context("writing to standard output")
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so readers never observe a partly written file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, or
/// moved into place.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("writing {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Generated CMake rules at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuplicatePolicy, HostPlatform};
    use clap::Parser;
    use rstest::rstest;

    #[rstest]
    fn overrides_replace_and_extend_manifest_vars() {
        let manifest = manifest::from_str(concat!(
            "kumiki_version: \"1.0.0\"\n",
            "vars: { OUT_DIR: out, TMP_DIR: tmp }\n",
            "build_dirs: [\"{OUT_DIR}\"]\n",
        ))
        .expect("parse");
        let cli = Cli::try_parse_from([
            "kumiki",
            "--var",
            "OUT_DIR=dist",
            "--var",
            "PKG_DIR=pkg",
            "--host",
            "posix",
            "--allow-duplicate-names",
        ])
        .expect("cli");
        let cfg = shared_config(&cli, &manifest);
        let vars: Vec<_> = cfg
            .vars()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        assert_eq!(vars, ["OUT_DIR=dist", "TMP_DIR=tmp", "PKG_DIR=pkg"]);
        assert_eq!(cfg.build_dirs(), ["{OUT_DIR}"]);
        assert_eq!(cfg.host(), HostPlatform::Posix);
        assert_eq!(cfg.duplicate_policy(), DuplicatePolicy::Allow);
    }

    #[rstest]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("rules.cmake");
        std::fs::write(&path, "old").expect("seed file");
        write_atomic(&path, "new contents\n").expect("write");
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "new contents\n");
        let entries = std::fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(entries, 1, "temporary file must not be left behind");
    }
}
