//! Intermediate rule representation.
//!
//! Requests are compiled into an ordered list of backend-agnostic
//! [`RuleRecord`]s: string variables, file-list variables, file writes, and
//! custom rules. The records carry unresolved [`FileRef`](crate::ast::FileRef)s
//! so a backend can decide how to render paths.
//!
//! # Examples
//!
//! ```
//! use indexmap::IndexMap;
//! use kumiki::ast::{BuildRequest, DirGroup, FileRef, VariableRequest};
//! use kumiki::config::SharedConfig;
//! use kumiki::ir::{RuleRecord, RuleSet};
//!
//! let request = BuildRequest::Variable(VariableRequest {
//!     name: "icu_data".into(),
//!     input_files: vec![FileRef::new(DirGroup::In, "a.txt")],
//! });
//! let set = RuleSet::from_requests(&[request], &SharedConfig::new(IndexMap::new()))
//!     .expect("compile");
//! assert!(matches!(set.records.as_slice(), [RuleRecord::FilesVar(var)] if var.name == "ICU_DATA"));
//! ```

mod assemble;
mod command;
mod format;
mod graph;
mod names;

pub use assemble::{MAX_INLINE_DEPS, assemble};
pub use command::{
    GENTEST_TEMPLATE, RepeatedCommand, TOOL_TEMPLATE, build_repeated_commands,
    build_single_command,
};
pub use format::{format_files, resolve_path, sanitize_identifier, sanitize_name};
pub use graph::{
    CustomRule, DIR_TARGET_LABEL, FilesVar, IrGenError, NameKind, RuleRecord, RuleSet, StringVar, WriteFile,
};
