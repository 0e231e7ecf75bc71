//! Shared, read-only configuration for one compilation.
//!
//! [`SharedConfig`] carries the variable bindings used to resolve directory
//! groups and names, the directory templates that must exist before any rule
//! runs, the host platform that decides command path separators, and the
//! policy for duplicate names. It is built once and passed by reference to
//! every stage.

use indexmap::IndexMap;
use miette::Diagnostic;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::template::{self, Scope, TemplateError};

/// Platform the generated rules will run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    /// Forward-slash paths are used as-is.
    Posix,
    /// Forward slashes in commands are rewritten to backslashes.
    Windows,
}

impl HostPlatform {
    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::current()
    }
}

impl FromStr for HostPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "posix" | "unix" => Ok(Self::Posix),
            "windows" | "nt" => Ok(Self::Windows),
            other => Err(format!(
                "unknown host platform '{other}'; expected posix or windows"
            )),
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => f.write_str("posix"),
            Self::Windows => f.write_str("windows"),
        }
    }
}

/// What to do when two requests produce the same target or variable name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Abort compilation.
    #[default]
    Reject,
    /// Emit the colliding rules anyway and log a warning.
    Allow,
}

/// Errors raised when a name or path cannot be resolved from the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConfigError {
    /// A placeholder names a variable that is not bound.
    #[error("variable '{name}' is not defined (needed by '{text}')")]
    #[diagnostic(
        code(kumiki::config::missing_variable),
        help("define '{name}' under `vars` or pass --var {name}=VALUE")
    )]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Text being resolved.
        text: String,
    },
    /// A local directory uses an unrecognised `$VARIABLE` prefix.
    #[error("unknown variable '${variable}' in local directory '{dirname}'")]
    #[diagnostic(
        code(kumiki::config::unknown_local_variable),
        help("local directories may start with $SRC, $FILTERS, or $CWD")
    )]
    UnknownLocalVariable {
        /// Variable name without the leading `$`.
        variable: String,
        /// Directory as written.
        dirname: String,
    },
    /// The text is not a well-formed template.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(TemplateError),
}

impl From<TemplateError> for ConfigError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::UnknownPlaceholder { name, template } => Self::MissingVariable {
                name,
                text: template,
            },
            other => Self::Template(other),
        }
    }
}

/// Immutable configuration shared by every stage of a compilation.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use kumiki::config::SharedConfig;
///
/// let mut vars = IndexMap::new();
/// vars.insert("OUT_DIR".to_owned(), "build/out".to_owned());
/// let cfg = SharedConfig::new(vars).with_build_dirs(vec!["{OUT_DIR}".into()]);
/// assert_eq!(cfg.resolve("{OUT_DIR}/a.res").expect("resolve"), "build/out/a.res");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    vars: IndexMap<String, String>,
    build_dirs: Vec<String>,
    host: HostPlatform,
    duplicates: DuplicatePolicy,
}

impl SharedConfig {
    /// Create a configuration from variable bindings.
    #[must_use]
    pub fn new(vars: IndexMap<String, String>) -> Self {
        Self {
            vars,
            ..Self::default()
        }
    }

    /// Set the directory templates created before any rule runs.
    #[must_use]
    pub fn with_build_dirs(mut self, build_dirs: Vec<String>) -> Self {
        self.build_dirs = build_dirs;
        self
    }

    /// Set the host platform.
    #[must_use]
    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    /// Set the duplicate-name policy.
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Variable bindings in declaration order.
    #[must_use]
    pub const fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    /// Directory templates created before any rule runs.
    #[must_use]
    pub fn build_dirs(&self) -> &[String] {
        &self.build_dirs
    }

    /// Host platform of the generated rules.
    #[must_use]
    pub const fn host(&self) -> HostPlatform {
        self.host
    }

    /// Policy applied to duplicate names.
    #[must_use]
    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// Resolve placeholders in `text` against the variable bindings only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when `text` names an unbound
    /// variable, or [`ConfigError::Template`] when `text` is malformed.
    pub fn resolve(&self, text: &str) -> Result<String, ConfigError> {
        let mut scope = Scope::new();
        scope.vars(&self.vars);
        Ok(template::substitute(text, &scope)?)
    }
}
