//! Intermediate rule records and the errors raised while building them.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::ast::FileRef;
use crate::config::ConfigError;
use crate::template::TemplateError;

/// Label of the directory-creation target before sanitization.
pub const DIR_TARGET_LABEL: &str = "{TMP_DIR}_dirs";

/// One backend-agnostic record produced by the rule assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum RuleRecord {
    /// A named literal string.
    StringVar(StringVar),
    /// A named list of files.
    FilesVar(FilesVar),
    /// Write a string variable to a file.
    WriteFile(WriteFile),
    /// An executable rule with dependencies and outputs.
    Rule(CustomRule),
}

impl RuleRecord {
    /// Kind and name of the variable or target this record defines, if any.
    #[must_use]
    pub fn defined_name(&self) -> Option<(NameKind, &str)> {
        match self {
            Self::StringVar(var) => Some((NameKind::Variable, &var.name)),
            Self::FilesVar(var) => Some((NameKind::Variable, &var.name)),
            Self::Rule(rule) => Some((NameKind::Target, &rule.name)),
            Self::WriteFile(_) => None,
        }
    }
}

/// A scalar variable holding generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringVar {
    /// Variable name.
    pub name: String,
    /// Literal content.
    pub content: String,
}

/// A variable listing files, used to keep long dependency lists out of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesVar {
    /// Variable name.
    pub name: String,
    /// Files in declaration order.
    pub files: Vec<FileRef>,
}

/// Write the content of a [`StringVar`] to `file` at configure time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFile {
    /// Destination file.
    pub file: FileRef,
    /// Name of the string variable holding the content.
    pub var_name: String,
}

/// A build rule: outputs, dependencies, and the commands that produce them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomRule {
    /// Sanitized target name.
    pub name: String,
    /// Literal dependency tokens such as tool targets or `${VAR}` references.
    pub dep_literals: Vec<String>,
    /// File dependencies.
    pub dep_files: Vec<FileRef>,
    /// Files produced by the commands.
    pub output_files: Vec<FileRef>,
    /// Commands run in order.
    pub commands: Vec<String>,
}

/// Ordered records for a whole request list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    /// Records in request order, then in per-request emission order.
    pub records: Vec<RuleRecord>,
}

/// Kind of name checked for uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A request name.
    Request,
    /// A backend target name.
    Target,
    /// A backend variable name.
    Variable,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Target => f.write_str("target"),
            Self::Variable => f.write_str("variable"),
        }
    }
}

/// Errors raised while compiling requests into rules.
#[derive(Debug, Error, Diagnostic)]
pub enum IrGenError {
    /// A directory group or name placeholder is missing from the configuration.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// A command or argument template references an unavailable placeholder.
    #[error("request '{request}' has an invalid command template: {source}")]
    #[diagnostic(code(kumiki::ir::template_mismatch))]
    TemplateMismatch {
        /// Request whose template failed.
        request: String,
        /// Underlying substitution error.
        #[source]
        source: TemplateError,
    },

    /// A materialized command is not a valid shell word list.
    #[error("request '{request}' produced an invalid command: {snippet}")]
    #[diagnostic(
        code(kumiki::ir::invalid_command),
        help("check for unbalanced quotes in the argument template")
    )]
    InvalidCommand {
        /// Request that produced the command.
        request: String,
        /// Full command text.
        command: String,
        /// Leading part of the command shown in the message.
        snippet: String,
    },

    /// A per-item list of a repeated request does not match its inputs.
    #[error("request '{request}' lists {found} {field} for {expected} input files")]
    #[diagnostic(code(kumiki::ir::misaligned_repeat))]
    MisalignedRepeat {
        /// Request name.
        request: String,
        /// Field whose length differs.
        field: String,
        /// Number of input files.
        expected: usize,
        /// Number of entries in `field`.
        found: usize,
    },

    /// Two requests produce the same name.
    #[error("duplicate {kind} names: {}", .names.join(", "))]
    #[diagnostic(
        code(kumiki::ir::duplicate_name),
        help("rename the requests or pass --allow-duplicate-names")
    )]
    DuplicateName {
        /// Kind of name that collided.
        kind: NameKind,
        /// Every colliding name, sorted.
        names: Vec<String>,
    },

    /// Writing generated text failed.
    #[error("failed to format generated rules")]
    #[diagnostic(code(kumiki::ir::format))]
    Format(#[from] std::fmt::Error),
}
