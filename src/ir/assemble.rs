//! Request-to-rule assembly.
//!
//! Each request kind has a fixed policy that turns one [`BuildRequest`] into
//! an ordered list of [`RuleRecord`]s. No state is shared between requests
//! apart from the read-only [`SharedConfig`].

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::ast::{
    BuildRequest, CopyRequest, FileRef, PrintFileRequest, RepeatedExecutionRequest,
    SingleExecutionRequest, ToolRef, VariableRequest,
};
use crate::config::SharedConfig;

use super::command::{build_repeated_commands, build_single_command, check_alignment};
use super::format::{format_files, sanitize_identifier, sanitize_name};
use super::graph::{
    CustomRule, DIR_TARGET_LABEL, FilesVar, IrGenError, RuleRecord, RuleSet, StringVar, WriteFile,
};
use super::names::check_unique_names;

/// Dependency lists longer than this are moved into a file-list variable.
pub const MAX_INLINE_DEPS: usize = 5;

/// Literal dependency token referencing a variable.
fn var_ref(name: &str) -> String {
    format!("${{{name}}}")
}

fn upper_name(request_name: &str, suffix: &str) -> String {
    sanitize_identifier(&format!("{}{suffix}", request_name.to_uppercase()))
}

/// Command used for tools that have no custom-command form.
fn unsupported_command(tool: &ToolRef, request_name: &str) -> String {
    format!(
        "echo \"[unsupported] {}: {}\"",
        tool.name(),
        sanitize_identifier(request_name)
    )
}

/// Derive the per-item rule suffix: the file name without directories or
/// extension.
///
/// # Examples
/// ```rust,ignore
/// assert_eq!(item_suffix("coll/de_AT.txt"), "de_AT");
/// assert_eq!(item_suffix("README"), "README");
/// ```
fn item_suffix(filename: &str) -> &str {
    let path = Utf8Path::new(filename);
    path.file_stem()
        .or_else(|| path.file_name())
        .unwrap_or(filename)
}

/// Compile one request into its rule records.
///
/// # Errors
///
/// Returns [`IrGenError`] when a file or name cannot be resolved, a command
/// template cannot be materialized, or a repeated request's per-item lists do
/// not line up with its inputs.
pub fn assemble(
    request: &BuildRequest,
    cfg: &SharedConfig,
) -> Result<Vec<RuleRecord>, IrGenError> {
    match request {
        BuildRequest::PrintFile(req) => Ok(assemble_print_file(req)),
        BuildRequest::Copy(req) => assemble_copy(req, cfg),
        BuildRequest::Variable(req) => Ok(assemble_variable(req)),
        BuildRequest::SingleExecution(req) => assemble_single(req, cfg),
        BuildRequest::RepeatedExecution(req) => assemble_repeated(req, cfg),
    }
}

fn assemble_print_file(req: &PrintFileRequest) -> Vec<RuleRecord> {
    let var_name = upper_name(&req.name, "_CONTENT");
    vec![
        RuleRecord::StringVar(StringVar {
            name: var_name.clone(),
            content: req.content.clone(),
        }),
        RuleRecord::WriteFile(WriteFile {
            file: req.output_file.clone(),
            var_name,
        }),
    ]
}

fn assemble_copy(req: &CopyRequest, cfg: &SharedConfig) -> Result<Vec<RuleRecord>, IrGenError> {
    let command = format!(
        "${{CMAKE_COMMAND}} -E copy {} {}",
        format_files(std::slice::from_ref(&req.input_file), cfg, false)?,
        format_files(std::slice::from_ref(&req.output_file), cfg, false)?,
    );
    Ok(vec![RuleRecord::Rule(CustomRule {
        name: sanitize_name(&req.name, cfg)?,
        dep_literals: Vec::new(),
        dep_files: vec![req.input_file.clone()],
        output_files: vec![req.output_file.clone()],
        commands: vec![command],
    })])
}

fn assemble_variable(req: &VariableRequest) -> Vec<RuleRecord> {
    vec![RuleRecord::FilesVar(FilesVar {
        name: upper_name(&req.name, ""),
        files: req.input_files.clone(),
    })]
}

fn tool_literals(tool: &ToolRef) -> Vec<String> {
    tool.dependency_token()
        .map(ToOwned::to_owned)
        .into_iter()
        .collect()
}

fn assemble_single(
    req: &SingleExecutionRequest,
    cfg: &SharedConfig,
) -> Result<Vec<RuleRecord>, IrGenError> {
    let command = match req.tool.command_template() {
        Some(template) => build_single_command(req, template, cfg)?,
        None => {
            warn!(
                request = %req.name,
                tool = req.tool.name(),
                "tool is not supported; emitting placeholder command"
            );
            unsupported_command(&req.tool, &req.name)
        }
    };
    let name = sanitize_name(&req.name, cfg)?;
    let dep_files = req.all_input_files();
    let mut dep_literals = tool_literals(&req.tool);

    if dep_files.len() <= MAX_INLINE_DEPS {
        return Ok(vec![RuleRecord::Rule(CustomRule {
            name,
            dep_literals,
            dep_files,
            output_files: req.output_files.clone(),
            commands: vec![command],
        })]);
    }

    let var_name = upper_name(&req.name, "_DEPS");
    dep_literals.insert(0, var_ref(&var_name));
    Ok(vec![
        RuleRecord::FilesVar(FilesVar {
            name: var_name,
            files: dep_files,
        }),
        RuleRecord::Rule(CustomRule {
            name,
            dep_literals,
            dep_files: Vec::new(),
            output_files: req.output_files.clone(),
            commands: vec![command],
        }),
    ])
}

fn assemble_repeated(
    req: &RepeatedExecutionRequest,
    cfg: &SharedConfig,
) -> Result<Vec<RuleRecord>, IrGenError> {
    let mut records = Vec::with_capacity(req.input_files.len() + 1);
    let mut dep_literals = tool_literals(&req.tool);
    if !req.common_dep_files.is_empty() {
        let var_name = upper_name(&req.name, "_DEPS");
        dep_literals.push(var_ref(&var_name));
        records.push(RuleRecord::FilesVar(FilesVar {
            name: var_name,
            files: req.common_dep_files.clone(),
        }));
    }

    let Some(template) = req.tool.command_template() else {
        warn!(
            request = %req.name,
            tool = req.tool.name(),
            "tool is not supported; emitting placeholder commands"
        );
        check_alignment(req)?;
        return assemble_unsupported_repeated(req, cfg, dep_literals, records);
    };

    for item in build_repeated_commands(req, template, cfg)? {
        let mut dep_files: Vec<FileRef> = item.specific_dep_files.to_vec();
        dep_files.push(item.input_file.clone());
        records.push(RuleRecord::Rule(CustomRule {
            name: item_rule_name(&req.name, item.input_file, cfg)?,
            dep_literals: dep_literals.clone(),
            dep_files,
            output_files: vec![item.output_file.clone()],
            commands: vec![item.command],
        }));
    }
    Ok(records)
}

fn item_rule_name(
    request_name: &str,
    input_file: &FileRef,
    cfg: &SharedConfig,
) -> Result<String, IrGenError> {
    let label = format!("{request_name}_{}", item_suffix(&input_file.filename));
    Ok(sanitize_name(&label, cfg)?)
}

/// Per-item rules for a tool without a command template. Arguments are not
/// materialized, so a broken argument template cannot fail compilation.
fn assemble_unsupported_repeated(
    req: &RepeatedExecutionRequest,
    cfg: &SharedConfig,
    dep_literals: Vec<String>,
    mut records: Vec<RuleRecord>,
) -> Result<Vec<RuleRecord>, IrGenError> {
    for (index, (input_file, output_file)) in
        req.input_files.iter().zip(&req.output_files).enumerate()
    {
        let mut dep_files: Vec<FileRef> = req
            .specific_dep_files
            .get(index)
            .cloned()
            .unwrap_or_default();
        dep_files.push(input_file.clone());
        records.push(RuleRecord::Rule(CustomRule {
            name: item_rule_name(&req.name, input_file, cfg)?,
            dep_literals: dep_literals.clone(),
            dep_files,
            output_files: vec![output_file.clone()],
            commands: vec![unsupported_command(&req.tool, &req.name)],
        }));
    }
    Ok(records)
}

impl RuleSet {
    /// Compile every request, in order, into one record list.
    ///
    /// Name uniqueness is checked afterwards according to the configuration's
    /// [`DuplicatePolicy`](crate::config::DuplicatePolicy).
    ///
    /// # Errors
    ///
    /// Returns the first [`IrGenError`] raised by any request, or
    /// [`IrGenError::DuplicateName`] when names collide and duplicates are
    /// rejected.
    pub fn from_requests(
        requests: &[BuildRequest],
        cfg: &SharedConfig,
    ) -> Result<Self, IrGenError> {
        let mut records = Vec::new();
        for request in requests {
            let produced = assemble(request, cfg)?;
            debug!(
                request = request.name(),
                kind = request.kind(),
                records = produced.len(),
                "assembled request"
            );
            records.extend(produced);
        }
        let set = Self { records };
        // Without TMP_DIR there is no directory target to collide with, and
        // generation reports the missing variable itself.
        let dir_target = sanitize_name(DIR_TARGET_LABEL, cfg).ok();
        check_unique_names(
            requests,
            &set,
            dir_target.as_deref(),
            cfg.duplicate_policy(),
        )?;
        Ok(set)
    }
}
