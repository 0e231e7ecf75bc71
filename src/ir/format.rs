//! Path and name formatting for generated rules.
//!
//! File references are resolved to `<dir>/<filename>` expressions through the
//! shared configuration, and arbitrary labels are turned into identifiers
//! that are valid CMake target names.

use std::borrow::Cow;

use itertools::Itertools;

use crate::ast::{DirGroup, FileRef};
use crate::config::{ConfigError, SharedConfig};

/// Separator used between wrapped file lists.
const WRAP_SEPARATOR: &str = "\n\t\t";

/// Wrapping only applies to lists longer than this.
const WRAP_THRESHOLD: usize = 2;

/// Map a directory group to its unresolved directory template.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownLocalVariable`] when a local directory starts
/// with an unrecognised `$VARIABLE`.
///
/// # Examples
/// ```rust,ignore
/// assert_eq!(dir_template(&DirGroup::Out).unwrap(), "{OUT_DIR}");
/// assert_eq!(dir_template(&DirGroup::Local("data".into())).unwrap(), "{CWD_DIR}/data");
/// ```
pub(crate) fn dir_template(dir: &DirGroup) -> Result<Cow<'_, str>, ConfigError> {
    let fixed = match dir {
        DirGroup::Src => "{SRC_DIR}",
        DirGroup::In => "{IN_DIR}",
        DirGroup::Tmp => "{TMP_DIR}",
        DirGroup::Out => "{OUT_DIR}",
        DirGroup::Pkg => "{PKG_DIR}",
        DirGroup::Local(dirname) => return local_dir_template(dirname),
    };
    Ok(Cow::Borrowed(fixed))
}

fn local_dir_template(dirname: &str) -> Result<Cow<'_, str>, ConfigError> {
    if dirname.starts_with('/') {
        return Ok(Cow::Borrowed(dirname));
    }
    let Some(rest) = dirname.strip_prefix('$') else {
        return Ok(Cow::Owned(format!("{{CWD_DIR}}/{dirname}")));
    };
    let (variable, tail) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    let var = match variable {
        "SRC" => "{SRC_DIR}",
        "FILTERS" => "{FILTERS_DIR}",
        "CWD" => "{CWD_DIR}",
        other => {
            return Err(ConfigError::UnknownLocalVariable {
                variable: other.to_owned(),
                dirname: dirname.to_owned(),
            });
        }
    };
    Ok(Cow::Owned(format!("{var}{tail}")))
}

/// Resolve one file reference to `<dir>/<filename>`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the directory group cannot be resolved.
pub fn resolve_path(file: &FileRef, cfg: &SharedConfig) -> Result<String, ConfigError> {
    let dir = cfg.resolve(&dir_template(&file.dir)?)?;
    Ok(format!("{dir}/{}", file.filename))
}

/// Render `files` as backend path expressions.
///
/// An empty slice renders as an empty string and a single file renders as one
/// `<dir>/<filename>` token. Multiple files are joined by a space, or by a
/// newline and indent when `wrap` is set and there are more than two files.
///
/// # Errors
///
/// Returns [`ConfigError`] when any directory group cannot be resolved.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use kumiki::ast::{DirGroup, FileRef};
/// use kumiki::config::SharedConfig;
/// use kumiki::ir::format_files;
///
/// let mut vars = IndexMap::new();
/// vars.insert("IN_DIR".to_owned(), "data".to_owned());
/// let cfg = SharedConfig::new(vars);
/// let files = [FileRef::new(DirGroup::In, "a.txt"), FileRef::new(DirGroup::In, "b.txt")];
/// assert_eq!(format_files(&files, &cfg, false).expect("format"), "data/a.txt data/b.txt");
/// ```
pub fn format_files(
    files: &[FileRef],
    cfg: &SharedConfig,
    wrap: bool,
) -> Result<String, ConfigError> {
    let separator = if wrap && files.len() > WRAP_THRESHOLD {
        WRAP_SEPARATOR
    } else {
        " "
    };
    let paths: Vec<String> = files
        .iter()
        .map(|file| resolve_path(file, cfg))
        .collect::<Result<_, _>>()?;
    Ok(paths.iter().join(separator))
}

/// Returns whether `ch` may appear in a CMake target name.
const fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '+' | '-')
}

/// Replace every character outside `[A-Za-z0-9_.+-]` with `_`.
///
/// An empty label becomes `_` so the result is always a usable identifier.
#[must_use]
pub fn sanitize_identifier(label: &str) -> String {
    if label.is_empty() {
        return "_".to_owned();
    }
    label
        .chars()
        .map(|ch| if is_name_char(ch) { ch } else { '_' })
        .collect()
}

/// Resolve placeholders in `label` and sanitize the result into a target name.
///
/// The result never contains braces, so sanitizing it again returns it
/// unchanged.
///
/// # Errors
///
/// Returns [`ConfigError`] when `label` references an unbound variable.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use kumiki::config::SharedConfig;
/// use kumiki::ir::sanitize_name;
///
/// let mut vars = IndexMap::new();
/// vars.insert("TMP_DIR".to_owned(), "build/tmp".to_owned());
/// let cfg = SharedConfig::new(vars);
/// assert_eq!(sanitize_name("{TMP_DIR}_dirs", &cfg).expect("name"), "build_tmp_dirs");
/// ```
pub fn sanitize_name(label: &str, cfg: &SharedConfig) -> Result<String, ConfigError> {
    Ok(sanitize_identifier(&cfg.resolve(label)?))
}
