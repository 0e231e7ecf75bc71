//! Kumiki build request data model.
//!
//! This module defines the typed build requests consumed by the rule
//! compiler together with the manifest wrapper used by the command line
//! front end. The structures are deserialised from YAML with `serde_saphyr`.
//!
//! ```rust
//! use kumiki::ast::{BuildManifest, BuildRequest};
//!
//! let yaml = concat!(
//!     "kumiki_version: \"1.0.0\"\n",
//!     "requests:\n",
//!     "  - kind: copy\n",
//!     "    name: notice\n",
//!     "    input_file: { dir: in, filename: NOTICE }\n",
//!     "    output_file: { dir: out, filename: NOTICE }\n",
//! );
//! let manifest: BuildManifest = serde_saphyr::from_str(yaml).expect("parse");
//! assert!(matches!(manifest.requests[0], BuildRequest::Copy(_)));
//! ```

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Extra template bindings attached to an execution request.
pub type Bindings = IndexMap<String, StringOrList>;

/// Top-level manifest parsed from a `kumiki.yml` file.
///
/// ```yaml
/// kumiki_version: "1.0.0"
/// vars:
///   OUT_DIR: build/out
/// build_dirs: ["{OUT_DIR}"]
/// requests: []
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    /// Semantic version of the manifest format.
    pub kumiki_version: Version,

    /// Ordered variable bindings shared by every request.
    #[serde(default)]
    pub vars: IndexMap<String, String>,

    /// Directory templates created before any rule runs.
    #[serde(default)]
    pub build_dirs: Vec<String>,

    /// Build requests in emission order.
    #[serde(default)]
    pub requests: Vec<BuildRequest>,
}

/// One abstract build step.
///
/// The `kind` key selects the variant in YAML input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildRequest {
    /// Write literal content to a file.
    PrintFile(PrintFileRequest),
    /// Copy one file to another location.
    Copy(CopyRequest),
    /// Publish a list of files as a named variable.
    Variable(VariableRequest),
    /// Run a tool once over all of its inputs.
    SingleExecution(SingleExecutionRequest),
    /// Run a tool once per input file.
    RepeatedExecution(RepeatedExecutionRequest),
}

impl BuildRequest {
    /// Unique request name used to derive rule and variable names.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::PrintFile(r) => &r.name,
            Self::Copy(r) => &r.name,
            Self::Variable(r) => &r.name,
            Self::SingleExecution(r) => &r.name,
            Self::RepeatedExecution(r) => &r.name,
        }
    }

    /// Short label naming the request kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PrintFile(_) => "print_file",
            Self::Copy(_) => "copy",
            Self::Variable(_) => "variable",
            Self::SingleExecution(_) => "single_execution",
            Self::RepeatedExecution(_) => "repeated_execution",
        }
    }
}

/// Write `content` to `output_file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrintFileRequest {
    /// Request name.
    pub name: String,
    /// Destination file.
    pub output_file: FileRef,
    /// Literal file content.
    pub content: String,
}

/// Copy `input_file` to `output_file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CopyRequest {
    /// Request name.
    pub name: String,
    /// Source file.
    pub input_file: FileRef,
    /// Destination file.
    pub output_file: FileRef,
}

/// Expose `input_files` as a file-list variable named after the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VariableRequest {
    /// Request name.
    pub name: String,
    /// Files listed by the variable.
    #[serde(default)]
    pub input_files: Vec<FileRef>,
}

/// Invoke `tool` once with every input available.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SingleExecutionRequest {
    /// Request name.
    pub name: String,
    /// Tool to invoke.
    pub tool: ToolRef,
    /// Argument template passed to the tool.
    #[serde(default)]
    pub args: String,
    /// Extra bindings available to `args`.
    #[serde(default)]
    pub format_with: Bindings,
    /// Files produced by other requests that must exist first.
    #[serde(default)]
    pub dep_files: Vec<FileRef>,
    /// Files read by the tool.
    #[serde(default)]
    pub input_files: Vec<FileRef>,
    /// Files written by the tool.
    #[serde(default)]
    pub output_files: Vec<FileRef>,
}

impl SingleExecutionRequest {
    /// Full dependency closure: `dep_files` followed by `input_files`.
    #[must_use]
    pub fn all_input_files(&self) -> Vec<FileRef> {
        self.dep_files
            .iter()
            .chain(&self.input_files)
            .cloned()
            .collect()
    }
}

/// Invoke `tool` once for every entry in `input_files`.
///
/// `output_files`, `specific_dep_files`, and each `repeat_with` list are
/// aligned with `input_files` by position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepeatedExecutionRequest {
    /// Request name.
    pub name: String,
    /// Tool to invoke.
    pub tool: ToolRef,
    /// Argument template passed to the tool for every item.
    #[serde(default)]
    pub args: String,
    /// Extra bindings shared by every item.
    #[serde(default)]
    pub format_with: Bindings,
    /// Per-item bindings; each list holds one value per input file.
    #[serde(default)]
    pub repeat_with: IndexMap<String, Vec<String>>,
    /// Files processed one at a time.
    #[serde(default)]
    pub input_files: Vec<FileRef>,
    /// Output produced for the input at the same position.
    #[serde(default)]
    pub output_files: Vec<FileRef>,
    /// Dependencies shared by every item.
    #[serde(default)]
    pub common_dep_files: Vec<FileRef>,
    /// Dependencies of the input at the same position.
    #[serde(default)]
    pub specific_dep_files: Vec<Vec<FileRef>>,
}

/// Abstract reference to a file: a directory group plus a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileRef {
    /// Directory group resolved through the shared configuration.
    pub dir: DirGroup,
    /// File name relative to the directory group, possibly with subdirectories.
    pub filename: String,
}

impl FileRef {
    /// Construct a reference from its parts.
    #[must_use]
    pub fn new(dir: DirGroup, filename: impl Into<String>) -> Self {
        Self {
            dir,
            filename: filename.into(),
        }
    }
}

/// Directory group tag of a [`FileRef`].
///
/// Written in YAML as `src`, `in`, `tmp`, `out`, `pkg`, or `local:<dirname>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum DirGroup {
    /// Source tree (`{SRC_DIR}`).
    Src,
    /// Input data tree (`{IN_DIR}`).
    In,
    /// Intermediate files (`{TMP_DIR}`).
    Tmp,
    /// Final outputs (`{OUT_DIR}`).
    Out,
    /// Packaging directory (`{PKG_DIR}`).
    Pkg,
    /// A directory named explicitly, relative to `{CWD_DIR}` unless absolute
    /// or prefixed with `$SRC`, `$FILTERS`, or `$CWD`.
    Local(String),
}

/// Error raised when a directory group tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirGroupParseError {
    /// The tag is not one of the known groups.
    #[error("unknown directory group '{0}'; expected src, in, tmp, out, pkg, or local:<dir>")]
    Unknown(String),
    /// A `local:` tag without a directory.
    #[error("local directory group requires a directory after 'local:'")]
    EmptyLocal,
}

impl FromStr for DirGroup {
    type Err = DirGroupParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "src" => Ok(Self::Src),
            "in" => Ok(Self::In),
            "tmp" => Ok(Self::Tmp),
            "out" => Ok(Self::Out),
            "pkg" => Ok(Self::Pkg),
            other => match other.strip_prefix("local:") {
                Some("") => Err(DirGroupParseError::EmptyLocal),
                Some(dir) => Ok(Self::Local(dir.to_owned())),
                None => Err(DirGroupParseError::Unknown(other.to_owned())),
            },
        }
    }
}

impl TryFrom<String> for DirGroup {
    type Error = DirGroupParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DirGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Src => f.write_str("src"),
            Self::In => f.write_str("in"),
            Self::Tmp => f.write_str("tmp"),
            Self::Out => f.write_str("out"),
            Self::Pkg => f.write_str("pkg"),
            Self::Local(dir) => write!(f, "local:{dir}"),
        }
    }
}

impl From<DirGroup> for String {
    fn from(value: DirGroup) -> Self {
        value.to_string()
    }
}

/// Tool invoked by an execution request.
///
/// `make` and `gentest` are reserved names with dedicated command templates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ToolRef {
    /// The `make` tool, which has no custom-command equivalent.
    Make,
    /// The test data generator, invoked through `${GENTEST}`.
    Gentest,
    /// A tool binary found under `${TOOLBINDIR}`.
    Named(String),
}

impl ToolRef {
    /// Identifier of the tool.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Make => "make",
            Self::Gentest => "gentest",
            Self::Named(name) => name,
        }
    }
}

impl From<String> for ToolRef {
    fn from(value: String) -> Self {
        match value.as_str() {
            "make" => Self::Make,
            "gentest" => Self::Gentest,
            _ => Self::Named(value),
        }
    }
}

impl From<&str> for ToolRef {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<ToolRef> for String {
    fn from(value: ToolRef) -> Self {
        match value {
            ToolRef::Named(name) => name,
            other => other.name().to_owned(),
        }
    }
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// It mirrors YAML syntax where a scalar or sequence is allowed. Empty values
/// deserialize to `StringOrList::Empty`.
///
/// ```yaml
/// # Scalar
/// LOCALE: en
/// # Sequence
/// LOCALES:
///   - en
///   - fr
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl From<&str> for StringOrList {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<String>> for StringOrList {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}
