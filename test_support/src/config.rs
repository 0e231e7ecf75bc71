//! Configuration and file reference fixtures.

use indexmap::IndexMap;
use kumiki::ast::{DirGroup, FileRef};
use kumiki::config::{HostPlatform, SharedConfig};

/// Directory bindings used throughout the tests.
pub const SAMPLE_VARS: [(&str, &str); 7] = [
    ("SRC_DIR", "src"),
    ("IN_DIR", "data"),
    ("TMP_DIR", "build/tmp"),
    ("OUT_DIR", "build/out"),
    ("PKG_DIR", "build/pkg"),
    ("CWD_DIR", "."),
    ("FILTERS_DIR", "filters"),
];

/// [`SAMPLE_VARS`] as an ordered map.
#[must_use]
pub fn sample_vars() -> IndexMap<String, String> {
    SAMPLE_VARS
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// A POSIX configuration over [`SAMPLE_VARS`] that creates the output and
/// temporary directories.
#[must_use]
pub fn sample_config() -> SharedConfig {
    SharedConfig::new(sample_vars())
        .with_build_dirs(vec!["{OUT_DIR}".to_owned(), "{TMP_DIR}".to_owned()])
        .with_host(HostPlatform::Posix)
}

/// A file in the input tree.
#[must_use]
pub fn input(filename: &str) -> FileRef {
    FileRef::new(DirGroup::In, filename)
}

/// A file in the output tree.
#[must_use]
pub fn output(filename: &str) -> FileRef {
    FileRef::new(DirGroup::Out, filename)
}

/// A file in the temporary tree.
#[must_use]
pub fn tmp(filename: &str) -> FileRef {
    FileRef::new(DirGroup::Tmp, filename)
}
