//! Helpers for constructing manifest fixtures in tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use kumiki::manifest::DEFAULT_MANIFEST;

/// Prefix the provided manifest body with the standard version header.
#[must_use]
pub fn manifest_yaml(body: &str) -> String {
    format!("kumiki_version: \"1.0.0\"\n{body}")
}

/// Write `body`, with the version header, to `dir/kumiki.yml`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_manifest(dir: &Path, body: &str) -> Result<PathBuf> {
    let path = dir.join(DEFAULT_MANIFEST);
    fs::write(&path, manifest_yaml(body))
        .with_context(|| format!("write manifest to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn written_manifest_parses() -> Result<()> {
        let dir = tempfile::tempdir().context("temp dir")?;
        let path = write_manifest(dir.path(), "requests: []\n")?;
        let manifest = kumiki::manifest::from_path(&path)?;
        anyhow::ensure!(manifest.requests.is_empty());
        Ok(())
    }
}
