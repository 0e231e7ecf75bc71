//! Command materialization for execution requests.
//!
//! A command template has exactly two placeholders, `{TOOL}` and `{ARGS}`.
//! The request's argument template is expanded first against the shared
//! variables, the request's own bindings, and the file names of the current
//! invocation; the result then replaces `{ARGS}`.

use crate::ast::{FileRef, RepeatedExecutionRequest, SingleExecutionRequest, ToolRef};
use crate::config::SharedConfig;
use crate::template::{self, Scope};

use super::IrGenError;
use super::format::resolve_path;

/// Template for tools installed under `${TOOLBINDIR}`.
pub const TOOL_TEMPLATE: &str = "${{TOOLBINDIR}}/{TOOL} {ARGS}";

/// Template for the test data generator.
pub const GENTEST_TEMPLATE: &str = "${{GENTEST}} {ARGS}";

/// Number of characters of a rejected command quoted in the error message.
const SNIPPET_LEN: usize = 160;

impl ToolRef {
    /// Command template for this tool, or `None` when the tool has no
    /// custom-command equivalent.
    #[must_use]
    pub const fn command_template(&self) -> Option<&'static str> {
        match self {
            Self::Make => None,
            Self::Gentest => Some(GENTEST_TEMPLATE),
            Self::Named(_) => Some(TOOL_TEMPLATE),
        }
    }

    /// Target the generated rule must depend on, if any.
    #[must_use]
    pub fn dependency_token(&self) -> Option<&str> {
        match self {
            Self::Make => None,
            other => Some(other.name()),
        }
    }
}

/// One materialized invocation of a repeated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedCommand<'a> {
    /// Dependencies shared by every item of the request.
    pub common_dep_files: &'a [FileRef],
    /// Dependencies of this item only.
    pub specific_dep_files: &'a [FileRef],
    /// The item being processed.
    pub input_file: &'a FileRef,
    /// The file produced for this item.
    pub output_file: &'a FileRef,
    /// Fully expanded command line.
    pub command: String,
}

fn filenames(files: &[FileRef]) -> Vec<String> {
    files.iter().map(|f| f.filename.clone()).collect()
}

fn resolve_paths(files: &[FileRef], cfg: &SharedConfig) -> Result<Vec<String>, IrGenError> {
    files
        .iter()
        .map(|f| resolve_path(f, cfg).map_err(IrGenError::from))
        .collect()
}

/// Substitute expanded arguments into a command template and validate the
/// result as a shell word list.
fn finish_command(
    request: &str,
    command_template: &str,
    tool: &ToolRef,
    args: &str,
) -> Result<String, IrGenError> {
    let mut scope = Scope::new();
    scope.scalar("TOOL", tool.name()).scalar("ARGS", args);
    let expanded = template::substitute(command_template, &scope).map_err(|source| {
        IrGenError::TemplateMismatch {
            request: request.to_owned(),
            source,
        }
    })?;
    let command = expanded.trim_end().to_owned();
    if shlex::split(&command).is_none() {
        let snippet = command.chars().take(SNIPPET_LEN).collect();
        return Err(IrGenError::InvalidCommand {
            request: request.to_owned(),
            command,
            snippet,
        });
    }
    Ok(command)
}

/// Materialize the single command line of `request`.
///
/// `INPUT_FILES` and `OUTPUT_FILES` bind the file names; `INPUT_PATHS` and
/// `OUTPUT_PATHS` bind the resolved paths.
///
/// # Errors
///
/// Returns [`IrGenError::Config`] when a file cannot be resolved,
/// [`IrGenError::TemplateMismatch`] when the argument or command template
/// uses a placeholder that is not available, and
/// [`IrGenError::InvalidCommand`] when the result has unbalanced quoting.
pub fn build_single_command(
    request: &SingleExecutionRequest,
    command_template: &str,
    cfg: &SharedConfig,
) -> Result<String, IrGenError> {
    let input_files = filenames(&request.input_files);
    let output_files = filenames(&request.output_files);
    let input_paths = resolve_paths(&request.input_files, cfg)?;
    let output_paths = resolve_paths(&request.output_files, cfg)?;

    let mut scope = Scope::new();
    scope
        .vars(cfg.vars())
        .bindings(&request.format_with)
        .list("INPUT_FILES", &input_files)
        .list("OUTPUT_FILES", &output_files)
        .list("INPUT_PATHS", &input_paths)
        .list("OUTPUT_PATHS", &output_paths);
    let args = template::substitute(&request.args, &scope).map_err(|source| {
        IrGenError::TemplateMismatch {
            request: request.name.clone(),
            source,
        }
    })?;
    finish_command(&request.name, command_template, &request.tool, &args)
}

fn check_len(
    request: &RepeatedExecutionRequest,
    field: &str,
    found: usize,
) -> Result<(), IrGenError> {
    let expected = request.input_files.len();
    if found == expected {
        Ok(())
    } else {
        Err(IrGenError::MisalignedRepeat {
            request: request.name.clone(),
            field: field.to_owned(),
            expected,
            found,
        })
    }
}

/// Verify that every per-item list has one entry per input file.
pub(super) fn check_alignment(request: &RepeatedExecutionRequest) -> Result<(), IrGenError> {
    check_len(request, "output_files", request.output_files.len())?;
    if !request.specific_dep_files.is_empty() {
        check_len(
            request,
            "specific_dep_files",
            request.specific_dep_files.len(),
        )?;
    }
    for (key, values) in &request.repeat_with {
        check_len(request, &format!("repeat_with.{key}"), values.len())?;
    }
    Ok(())
}

/// Materialize one command per input file of `request`, in input order.
///
/// Each item binds `INPUT_FILE`/`OUTPUT_FILE` (file names),
/// `INPUT_PATH`/`OUTPUT_PATH` (resolved paths), and its entry of every
/// `repeat_with` list.
///
/// # Errors
///
/// Returns [`IrGenError::MisalignedRepeat`] when the per-item lists do not
/// match the input files, and the errors of [`build_single_command`] for each
/// item.
pub fn build_repeated_commands<'a>(
    request: &'a RepeatedExecutionRequest,
    command_template: &str,
    cfg: &SharedConfig,
) -> Result<Vec<RepeatedCommand<'a>>, IrGenError> {
    check_alignment(request)?;
    request
        .input_files
        .iter()
        .zip(&request.output_files)
        .enumerate()
        .map(|(index, (input_file, output_file))| -> Result<_, IrGenError> {
            let input_path = resolve_path(input_file, cfg)?;
            let output_path = resolve_path(output_file, cfg)?;
            let mut scope = Scope::new();
            scope.vars(cfg.vars()).bindings(&request.format_with);
            for (key, values) in &request.repeat_with {
                if let Some(value) = values.get(index) {
                    scope.scalar(key, value);
                }
            }
            scope
                .scalar("INPUT_FILE", &input_file.filename)
                .scalar("OUTPUT_FILE", &output_file.filename)
                .scalar("INPUT_PATH", &input_path)
                .scalar("OUTPUT_PATH", &output_path);
            let args = template::substitute(&request.args, &scope).map_err(|source| {
                IrGenError::TemplateMismatch {
                    request: request.name.clone(),
                    source,
                }
            })?;
            let command = finish_command(&request.name, command_template, &request.tool, &args)?;
            Ok(RepeatedCommand {
                common_dep_files: &request.common_dep_files,
                specific_dep_files: request
                    .specific_dep_files
                    .get(index)
                    .map_or(&[][..], Vec::as_slice),
                input_file,
                output_file,
                command,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Bindings, DirGroup, StringOrList};
    use indexmap::IndexMap;
    use rstest::{fixture, rstest};

    #[fixture]
    fn cfg() -> SharedConfig {
        let vars: IndexMap<String, String> = [
            ("IN_DIR", "data"),
            ("OUT_DIR", "build/out"),
            ("TMP_DIR", "build/tmp"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        SharedConfig::new(vars)
    }

    fn single(args: &str) -> SingleExecutionRequest {
        SingleExecutionRequest {
            name: "cnvalias".into(),
            tool: ToolRef::from("gencnval"),
            args: args.into(),
            format_with: Bindings::new(),
            dep_files: Vec::new(),
            input_files: vec![FileRef::new(DirGroup::In, "mappings/convrtrs.txt")],
            output_files: vec![FileRef::new(DirGroup::Out, "cnvalias.icu")],
        }
    }

    fn repeated() -> RepeatedExecutionRequest {
        RepeatedExecutionRequest {
            name: "curr".into(),
            tool: ToolRef::from("genrb"),
            args: "-s {IN_DIR} -d {OUT_DIR} {INPUT_FILE}".into(),
            format_with: Bindings::new(),
            repeat_with: IndexMap::new(),
            input_files: vec![
                FileRef::new(DirGroup::In, "curr/en.txt"),
                FileRef::new(DirGroup::In, "curr/fr.txt"),
            ],
            output_files: vec![
                FileRef::new(DirGroup::Out, "curr/en.res"),
                FileRef::new(DirGroup::Out, "curr/fr.res"),
            ],
            common_dep_files: vec![FileRef::new(DirGroup::Tmp, "pool.res")],
            specific_dep_files: Vec::new(),
        }
    }

    #[rstest]
    fn single_command_uses_tool_template(cfg: SharedConfig) {
        let req = single("-s {IN_DIR} -d {OUT_DIR} {INPUT_FILES[0]}");
        let cmd = build_single_command(&req, TOOL_TEMPLATE, &cfg).expect("command");
        assert_eq!(
            cmd,
            "${TOOLBINDIR}/gencnval -s data -d build/out mappings/convrtrs.txt"
        );
    }

    #[rstest]
    fn single_command_binds_resolved_paths(cfg: SharedConfig) {
        let req = single("{INPUT_PATHS} -o {OUTPUT_PATHS}");
        let cmd = build_single_command(&req, GENTEST_TEMPLATE, &cfg).expect("command");
        assert_eq!(
            cmd,
            "${GENTEST} data/mappings/convrtrs.txt -o build/out/cnvalias.icu"
        );
    }

    #[rstest]
    fn single_command_uses_format_with(cfg: SharedConfig) {
        let mut req = single("--locales {LOCALES} --mode {MODE}");
        req.format_with
            .insert("LOCALES".into(), StringOrList::List(vec!["en".into(), "fr".into()]));
        req.format_with.insert("MODE".into(), "fast".into());
        let cmd = build_single_command(&req, TOOL_TEMPLATE, &cfg).expect("command");
        assert_eq!(cmd, "${TOOLBINDIR}/gencnval --locales en fr --mode fast");
    }

    #[rstest]
    fn empty_args_leave_no_trailing_space(cfg: SharedConfig) {
        let cmd = build_single_command(&single(""), TOOL_TEMPLATE, &cfg).expect("command");
        assert_eq!(cmd, "${TOOLBINDIR}/gencnval");
    }

    #[rstest]
    fn unknown_argument_placeholder_is_a_template_mismatch(cfg: SharedConfig) {
        let err = build_single_command(&single("{INPUT_FILE}"), TOOL_TEMPLATE, &cfg)
            .expect_err("INPUT_FILE is only bound for repeated requests");
        assert!(matches!(
            err,
            IrGenError::TemplateMismatch { ref request, .. } if request == "cnvalias"
        ));
    }

    #[rstest]
    fn unbalanced_quotes_are_rejected(cfg: SharedConfig) {
        let err = build_single_command(&single("\"unterminated"), TOOL_TEMPLATE, &cfg)
            .expect_err("invalid command");
        assert!(matches!(err, IrGenError::InvalidCommand { .. }));
    }

    #[rstest]
    fn repeated_commands_follow_input_order(cfg: SharedConfig) {
        let req = repeated();
        let cmds = build_repeated_commands(&req, TOOL_TEMPLATE, &cfg).expect("commands");
        let lines: Vec<_> = cmds.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(
            lines,
            [
                "${TOOLBINDIR}/genrb -s data -d build/out curr/en.txt",
                "${TOOLBINDIR}/genrb -s data -d build/out curr/fr.txt",
            ]
        );
        assert!(cmds.iter().all(|c| c.common_dep_files == req.common_dep_files.as_slice()));
        assert!(cmds.iter().all(|c| c.specific_dep_files.is_empty()));
        assert_eq!(cmds.first().map(|c| c.output_file), req.output_files.first());
    }

    #[rstest]
    fn repeated_commands_bind_per_item_values(cfg: SharedConfig) {
        let mut req = repeated();
        req.args = "--name {NAME} -o {OUTPUT_PATH}".into();
        req.repeat_with
            .insert("NAME".into(), vec!["english".into(), "french".into()]);
        req.specific_dep_files = vec![vec![FileRef::new(DirGroup::Tmp, "en.dep")], Vec::new()];
        let cmds = build_repeated_commands(&req, TOOL_TEMPLATE, &cfg).expect("commands");
        let lines: Vec<_> = cmds.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(
            lines,
            [
                "${TOOLBINDIR}/genrb --name english -o build/out/curr/en.res",
                "${TOOLBINDIR}/genrb --name french -o build/out/curr/fr.res",
            ]
        );
        assert_eq!(cmds.first().map(|c| c.specific_dep_files.len()), Some(1));
    }

    #[rstest]
    #[case::outputs("output_files")]
    #[case::specific("specific_dep_files")]
    #[case::repeat("repeat_with.NAME")]
    fn misaligned_lists_are_rejected(cfg: SharedConfig, #[case] field: &str) {
        let mut req = repeated();
        match field {
            "output_files" => {
                req.output_files.pop();
            }
            "specific_dep_files" => req.specific_dep_files = vec![Vec::new()],
            _ => {
                req.repeat_with.insert("NAME".into(), vec!["only".into()]);
            }
        }
        let err = build_repeated_commands(&req, TOOL_TEMPLATE, &cfg).expect_err("misaligned");
        assert!(
            matches!(
                err,
                IrGenError::MisalignedRepeat { field: ref f, expected: 2, found: 1, .. } if f == field
            ),
            "{err:?}"
        );
    }

    #[rstest]
    #[case(ToolRef::Make, None, None)]
    #[case(ToolRef::Gentest, Some(GENTEST_TEMPLATE), Some("gentest"))]
    #[case(ToolRef::from("genrb"), Some(TOOL_TEMPLATE), Some("genrb"))]
    fn tools_map_to_templates(
        #[case] tool: ToolRef,
        #[case] template: Option<&str>,
        #[case] token: Option<&str>,
    ) {
        assert_eq!(tool.command_template(), template);
        assert_eq!(tool.dependency_token(), token);
    }
}
