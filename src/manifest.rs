//! Manifest loading helpers.
//!
//! A manifest is a YAML document holding the shared variables, the build
//! directories, and the ordered request list. It is parsed in one pass with
//! `serde_saphyr`; structural mistakes surface as [`ManifestError::Parse`]
//! diagnostics pointing at the offending line.

use crate::ast::BuildManifest;
use anyhow::{Context, Result};
use std::{fs, path::Path};

mod diagnostics;
mod hints;

pub use diagnostics::{ManifestError, ManifestName, ManifestSource, map_yaml_error};

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "kumiki.yml";

/// Major manifest format version understood by this build.
pub const SUPPORTED_MAJOR: u64 = 1;

/// Parse a manifest, labelling diagnostics with `name`.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] when the YAML is malformed or does not
/// match the manifest structure, and [`ManifestError::UnsupportedVersion`]
/// when `kumiki_version` has the wrong major version.
pub fn from_str_named(
    yaml: &str,
    name: &ManifestName,
) -> std::result::Result<BuildManifest, ManifestError> {
    let source = ManifestSource::from(yaml);
    let manifest: BuildManifest =
        serde_saphyr::from_str(yaml).map_err(|e| ManifestError::Parse {
            source: map_yaml_error(e, &source, name),
        })?;
    if manifest.kumiki_version.major != SUPPORTED_MAJOR {
        return Err(ManifestError::UnsupportedVersion {
            name: name.to_string(),
            version: manifest.kumiki_version,
            supported: SUPPORTED_MAJOR,
        });
    }
    Ok(manifest)
}

/// Parse a manifest string.
///
/// # Errors
///
/// See [`from_str_named`].
///
/// # Examples
///
/// ```
/// let manifest = kumiki::manifest::from_str("kumiki_version: \"1.2.0\"\n").expect("parse");
/// assert!(manifest.requests.is_empty());
/// ```
pub fn from_str(yaml: &str) -> std::result::Result<BuildManifest, ManifestError> {
    from_str_named(yaml, &ManifestName::from(DEFAULT_MANIFEST))
}

/// Load a [`BuildManifest`] from the given file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to parse.
pub fn from_path(path: impl AsRef<Path>) -> Result<BuildManifest> {
    let path_ref = path.as_ref();
    let data = fs::read_to_string(path_ref)
        .with_context(|| format!("failed to read {}", path_ref.display()))?;
    let name = ManifestName::new(path_ref.display().to_string());
    Ok(from_str_named(&data, &name)?)
}
