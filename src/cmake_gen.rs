//! CMake rule file generator.
//!
//! This module serializes a [`RuleSet`] into CMake text made of `set`,
//! `file(WRITE ...)`, `add_custom_command`, and `add_custom_target` calls. A
//! synthetic directory target comes first and every custom command depends on
//! it, so output directories exist before any rule runs.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter, Write};

use itertools::Itertools;

use crate::ast::BuildRequest;
use crate::config::{HostPlatform, SharedConfig};
use crate::ir::{
    CustomRule, DIR_TARGET_LABEL, IrGenError, RuleRecord, RuleSet, format_files, resolve_path,
    sanitize_name,
};

/// Smallest number of `=` used in a bracket argument.
const MIN_BRACKET_LEVEL: usize = 2;

/// Compile `requests` and render them as CMake text.
///
/// # Errors
///
/// Returns [`IrGenError`] when any request fails to compile or a path cannot
/// be resolved. No partial output is produced.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use kumiki::ast::{BuildRequest, DirGroup, FileRef, PrintFileRequest};
/// use kumiki::cmake_gen::emit;
/// use kumiki::config::SharedConfig;
///
/// let mut vars = IndexMap::new();
/// vars.insert("TMP_DIR".to_owned(), "tmp".to_owned());
/// vars.insert("OUT_DIR".to_owned(), "out".to_owned());
/// let cfg = SharedConfig::new(vars);
/// let request = BuildRequest::PrintFile(PrintFileRequest {
///     name: "greeting".into(),
///     output_file: FileRef::new(DirGroup::Out, "hello.txt"),
///     content: "hello".into(),
/// });
/// let text = emit(&["{OUT_DIR}".to_owned()], &[request], &cfg).expect("emit");
/// assert!(text.contains("set(GREETING_CONTENT \"hello\")"));
/// assert!(text.contains("file(WRITE out/hello.txt \"${GREETING_CONTENT}\")"));
/// ```
pub fn emit(
    build_dirs: &[String],
    requests: &[BuildRequest],
    cfg: &SharedConfig,
) -> Result<String, IrGenError> {
    let set = RuleSet::from_requests(requests, cfg)?;
    generate(&set, build_dirs, cfg)
}

/// Render already assembled records as CMake text.
///
/// `build_dirs` are directory templates resolved through `cfg`.
///
/// # Errors
///
/// Returns [`IrGenError::Config`] when a directory or file reference cannot
/// be resolved.
pub fn generate(
    set: &RuleSet,
    build_dirs: &[String],
    cfg: &SharedConfig,
) -> Result<String, IrGenError> {
    let dir_target = sanitize_name(DIR_TARGET_LABEL, cfg)?;
    let dirs: Vec<String> = build_dirs
        .iter()
        .map(|dir| cfg.resolve(dir))
        .collect::<Result<_, _>>()?;

    let mut out = String::new();
    write!(
        out,
        "{}",
        DirTarget {
            name: &dir_target,
            dirs: &dirs,
        }
    )?;
    for record in &set.records {
        out.push('\n');
        write_record(&mut out, record, &dir_target, cfg)?;
    }
    Ok(out)
}

fn write_record(
    out: &mut String,
    record: &RuleRecord,
    dir_target: &str,
    cfg: &SharedConfig,
) -> Result<(), IrGenError> {
    match record {
        RuleRecord::StringVar(var) => {
            writeln!(out, "set({} {})", var.name, StringArgument(&var.content))?;
        }
        RuleRecord::FilesVar(var) => {
            let files = format_files(&var.files, cfg, true)?;
            if files.is_empty() {
                writeln!(out, "set({})", var.name)?;
            } else {
                writeln!(out, "set({} {files})", var.name)?;
            }
        }
        RuleRecord::WriteFile(write) => {
            let path = resolve_path(&write.file, cfg)?;
            writeln!(out, "file(WRITE {path} \"${{{}}}\")", write.var_name)?;
        }
        RuleRecord::Rule(rule) => {
            write!(out, "{}", DisplayRule::new(rule, dir_target, cfg)?)?;
        }
    }
    Ok(())
}

/// Rewrite path separators in a command for the host shell.
fn native_command(command: &str, host: HostPlatform) -> Cow<'_, str> {
    match host {
        HostPlatform::Windows => Cow::Owned(command.replace('/', "\\\\")),
        HostPlatform::Posix => Cow::Borrowed(command),
    }
}

/// Wrapper struct to display the directory-creation target.
struct DirTarget<'a> {
    name: &'a str,
    dirs: &'a [String],
}

impl Display for DirTarget<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.dirs.is_empty() {
            return writeln!(f, "add_custom_target({})", self.name);
        }
        writeln!(f, "add_custom_target({}", self.name)?;
        writeln!(
            f,
            "COMMAND ${{CMAKE_COMMAND}} -E make_directory {})",
            self.dirs.iter().join(" ")
        )
    }
}

/// A literal string as a CMake argument: quoted when safe, otherwise a
/// bracket argument.
struct StringArgument<'a>(&'a str);

impl StringArgument<'_> {
    fn needs_bracket(&self) -> bool {
        self.0.contains(['\n', '"', '\\', '$'])
    }

    /// Content ending in `]` plus `level` equals signs would close the
    /// bracket early once the delimiter is appended.
    fn bracket_level(&self) -> usize {
        let mut level = MIN_BRACKET_LEVEL;
        loop {
            let close = format!("]{}", "=".repeat(level));
            if !self.0.contains(&format!("{close}]")) && !self.0.ends_with(&close) {
                return level;
            }
            level += 1;
        }
    }
}

impl Display for StringArgument<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.needs_bracket() {
            return write!(f, "\"{}\"", self.0);
        }
        let eq = "=".repeat(self.bracket_level());
        // CMake drops a newline directly after the opening bracket.
        write!(f, "[{eq}[\n{}]{eq}]", self.0)
    }
}

/// Wrapper struct to display a custom command and its target.
struct DisplayRule<'a> {
    name: &'a str,
    outputs: String,
    depends: Vec<Cow<'a, str>>,
    commands: Vec<Cow<'a, str>>,
}

impl<'a> DisplayRule<'a> {
    fn new(
        rule: &'a CustomRule,
        dir_target: &'a str,
        cfg: &SharedConfig,
    ) -> Result<Self, IrGenError> {
        let mut depends: Vec<Cow<'a, str>> = vec![Cow::Borrowed(dir_target)];
        depends.extend(rule.dep_literals.iter().map(|lit| Cow::Borrowed(lit.as_str())));
        let files = format_files(&rule.dep_files, cfg, false)?;
        if !files.is_empty() {
            depends.push(Cow::Owned(files));
        }
        let commands = rule
            .commands
            .iter()
            .map(|cmd| native_command(cmd, cfg.host()))
            .collect();
        Ok(Self {
            name: &rule.name,
            outputs: format_files(&rule.output_files, cfg, false)?,
            depends,
            commands,
        })
    }
}

impl Display for DisplayRule<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "add_custom_command(OUTPUT {}", self.outputs)?;
        write!(f, "\n\tDEPENDS {}", self.depends.iter().join(" "))?;
        if !self.commands.is_empty() {
            write!(f, "\n\tCOMMAND {}", self.commands.iter().join("\n\t"))?;
        }
        writeln!(f, ")")?;
        writeln!(
            f,
            "add_custom_target({} DEPENDS {})",
            self.name, self.outputs
        )
    }
}
