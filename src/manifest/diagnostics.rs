//! Translates manifest parsing errors into actionable diagnostics.
//!
//! [`ManifestSource`] retains the YAML content and [`ManifestName`] labels its
//! origin. [`map_yaml_error`] turns a `serde_saphyr` failure into a
//! [`miette`] diagnostic with a source span and, for common mistakes, a hint.

// The miette derive trips `unused_assignments` on some compiler versions, and
// `#[expect]` fails on the versions where it does not fire.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use semver::Version;
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

use super::hints::YAML_HINTS;

/// YAML source content for a manifest.
///
/// # Examples
/// ```rust
/// use kumiki::manifest::ManifestSource;
/// let source = ManifestSource::from("requests: []");
/// assert_eq!(source.as_str(), "requests: []");
/// ```
#[derive(Debug, Clone)]
pub struct ManifestSource(String);

impl ManifestSource {
    /// Wrap YAML text.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// Borrow the YAML text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestSource {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Display name for a manifest source used in diagnostics.
#[derive(Debug, Clone)]
pub struct ManifestName(String);

impl ManifestName {
    /// Wrap a display name, usually a file path.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the display name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ManifestName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while loading a manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The YAML is malformed or does not match the manifest structure.
    #[error("manifest parse error")]
    #[diagnostic(code(kumiki::manifest::parse))]
    Parse {
        /// Rendered YAML diagnostic.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },

    /// The manifest declares a format version this build does not read.
    #[error("{name}: unsupported kumiki_version {version}; expected {supported}.x")]
    #[diagnostic(
        code(kumiki::manifest::unsupported_version),
        help("set kumiki_version to a 1.x release")
    )]
    UnsupportedVersion {
        /// Manifest display name.
        name: String,
        /// Declared version.
        version: Version,
        /// Supported major version.
        supported: u64,
    },
}

/// Reconstruct the byte offset of a `serde_saphyr` location.
///
/// Columns past the end of a line clamp to the line end; `\r\n` line endings
/// are tolerated.
fn byte_index(src: &str, line: u64, column: u64) -> usize {
    let target_line = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let target_column = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut offset = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == target_line {
            let without_newline = segment.strip_suffix('\n').unwrap_or(segment);
            let cleaned = without_newline
                .strip_suffix('\r')
                .unwrap_or(without_newline);
            let column_offset = cleaned
                .char_indices()
                .nth(target_column)
                .map_or(cleaned.len(), |(byte_idx, _)| byte_idx);
            return offset + column_offset;
        }
        offset += segment.len();
    }
    src.len()
}

fn to_span(src: &ManifestSource, loc: Location) -> SourceSpan {
    let at = byte_index(src.as_ref(), loc.line(), loc.column());
    let bytes = src.as_ref().as_bytes();
    let is_line_break = |b: u8| b == b'\n' || b == b'\r';
    let (start, end) = match bytes.get(at) {
        Some(&b) if !is_line_break(b) => (at, at + 1),
        _ => {
            let start = if at > 0 && bytes.get(at - 1).is_some_and(|p| !is_line_break(*p)) {
                at - 1
            } else {
                at
            };
            (start, at)
        }
    };
    SourceSpan::new(start.into(), end.saturating_sub(start))
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kumiki::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    message: String,
}

fn has_tab_indent(src: &ManifestSource, location: Option<Location>) -> bool {
    let Some(loc) = location else {
        return false;
    };
    let line_idx = usize::try_from(loc.line().saturating_sub(1)).unwrap_or(usize::MAX);
    let line = src.as_ref().lines().nth(line_idx).unwrap_or("");
    line.chars()
        .take_while(|c| c.is_whitespace())
        .any(|c| c == '\t')
}

fn hint_for(err_str: &str, src: &ManifestSource, loc: Option<Location>) -> Option<String> {
    if has_tab_indent(src, loc) {
        return Some("Use spaces for indentation; tabs are invalid in YAML.".into());
    }
    let lower = err_str.to_lowercase();
    YAML_HINTS
        .iter()
        .find(|(needle, _)| lower.contains(*needle))
        .map(|(_, hint)| (*hint).into())
}

/// Map a `serde_saphyr` error into a [`miette`] diagnostic.
///
/// The message always carries a line and column; errors without a location
/// report line 1, column 1.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &ManifestSource,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let loc = err.location();
    let (line, col, span) = loc.map_or((1, 1, None), |l| {
        (l.line(), l.column(), Some(to_span(src, l)))
    });
    let err_str = err.to_string();
    let hint = hint_for(&err_str, src, loc);
    let mut message = format!("YAML parse error at line {line}, column {col}: {err_str}");
    if let Some(ref h) = hint {
        message.push_str("\nhelp: ");
        message.push_str(h);
    }

    Box::new(YamlDiagnostic {
        src: NamedSource::new(name.as_ref(), src.as_ref().to_owned()),
        span,
        help: hint,
        source: err,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BuildManifest;
    use anyhow::{Result, anyhow, ensure};
    use rstest::rstest;

    fn parse_error(src: &ManifestSource) -> Result<YamlError> {
        match serde_saphyr::from_str::<BuildManifest>(src.as_ref()) {
            Ok(_) => Err(anyhow!("expected parse error for {:?}", src.as_str())),
            Err(err) => Ok(err),
        }
    }

    #[rstest]
    fn tab_indentation_gets_a_hint() -> Result<()> {
        let src = ManifestSource::from("\tkumiki_version: \"unterminated");
        let diag = map_yaml_error(parse_error(&src)?, &src, &ManifestName::from("test"));
        let msg = diag.to_string();
        ensure!(msg.contains("Use spaces for indentation"), "message: {msg}");
        Ok(())
    }

    #[rstest]
    fn missing_location_defaults_to_first_line() -> Result<()> {
        let src = ManifestSource::from("requests: [");
        let err = YamlError::Eof {
            location: Location::UNKNOWN,
        };
        let diag = map_yaml_error(err, &src, &ManifestName::from("test"));
        ensure!(diag.to_string().contains("line 1, column 1"));
        Ok(())
    }

    #[rstest]
    fn unknown_request_kind_is_reported() -> Result<()> {
        let src = ManifestSource::from(concat!(
            "kumiki_version: \"1.0.0\"\n",
            "requests:\n",
            "  - kind: compile\n",
            "    name: x\n",
        ));
        let diag = map_yaml_error(parse_error(&src)?, &src, &ManifestName::from("test"));
        let msg = diag.to_string();
        ensure!(msg.starts_with("YAML parse error at line"), "message: {msg}");
        Ok(())
    }

    #[rstest]
    #[case("one\ntwo\nthree", 3, 3, "one\ntwo\nth".len())]
    #[case("one\r\ntwo\r\nthree", 2, 2, "one\r\nt".len())]
    #[case("short", 1, 42, "short".len())]
    #[case("caf\u{e9}: x", 1, 5, "caf\u{e9}".len())]
    #[case("a\nb", 9, 1, "a\nb".len())]
    fn byte_index_tracks_lines_and_chars(
        #[case] src: &str,
        #[case] line: u64,
        #[case] column: u64,
        #[case] expected: usize,
    ) {
        assert_eq!(byte_index(src, line, column), expected);
    }
}
