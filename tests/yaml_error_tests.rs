//! Regression tests for manifest parse diagnostics.
//!
//! These tests ensure diagnostics include line numbers, the manifest name,
//! and hints for common mistakes.

use anyhow::{Result, anyhow, ensure};
use kumiki::manifest::{self, ManifestError, ManifestName};
use miette::Diagnostic;
use rstest::rstest;

fn diagnostic_text(err: &ManifestError) -> Result<String> {
    let ManifestError::Parse { source } = err else {
        return Err(anyhow!("expected a parse error, got {err:?}"));
    };
    let mut text = source.to_string();
    if let Some(help) = source.help() {
        text.push('\n');
        text.push_str(&help.to_string());
    }
    Ok(text)
}

#[rstest]
#[case(
    concat!(
        "kumiki_version: \"1.0.0\"\n",
        "requests:\n",
        "  - kind: transmogrify\n",
        "    name: x\n",
    ),
    &["YAML parse error at line", "Request kinds are"],
)]
#[case(
    concat!(
        "kumiki_version: \"1.0.0\"\n",
        "requests:\n",
        "  - kind: copy\n",
        "    name: x\n",
        "    input_file: { dir: in, filename: a }\n",
        "    output_file: { dir: out, filename: a }\n",
        "    colour: blue\n",
    ),
    &["YAML parse error", "unknown field"],
)]
#[case(
    concat!(
        "kumiki_version: \"1.0.0\"\n",
        "requests:\n",
        "  - kind: copy\n",
        "    name: x\n",
        "    input_file: { dir: nowhere, filename: a }\n",
        "    output_file: { dir: out, filename: a }\n",
    ),
    &["YAML parse error", "unknown directory group 'nowhere'"],
)]
#[case(
    "kumiki_version: \"1.0.0\"\nvars: { OUT_DIR: out\n",
    &["YAML parse error", "line"],
)]
fn parse_errors_are_located(#[case] yaml: &str, #[case] needles: &[&str]) -> Result<()> {
    let err = manifest::from_str_named(yaml, &ManifestName::from("kumiki.yml"))
        .err()
        .ok_or_else(|| anyhow!("expected parse failure"))?;
    let text = diagnostic_text(&err)?;
    for needle in needles {
        ensure!(text.contains(needle), "missing '{needle}' in:\n{text}");
    }
    Ok(())
}

#[rstest]
fn diagnostics_carry_stable_codes() -> Result<()> {
    let err = manifest::from_str("kumiki_version: \"3.1.0\"\n")
        .err()
        .ok_or_else(|| anyhow!("expected version failure"))?;
    let code = err.code().map(|c| c.to_string());
    ensure!(
        code.as_deref() == Some("kumiki::manifest::unsupported_version"),
        "code: {code:?}"
    );
    ensure!(err.to_string().contains("unsupported kumiki_version 3.1.0"));
    Ok(())
}

#[rstest]
fn parse_error_names_the_source() -> Result<()> {
    let err = manifest::from_str_named("requests: [", &ManifestName::from("rules/icu.yml"))
        .err()
        .ok_or_else(|| anyhow!("expected parse failure"))?;
    let ManifestError::Parse { source } = &err else {
        return Err(anyhow!("expected a parse error, got {err:?}"));
    };
    let src = source
        .source_code()
        .ok_or_else(|| anyhow!("diagnostic should carry its source"))?;
    let span = miette::SourceSpan::from((0, 1));
    let contents = src
        .read_span(&span, 0, 0)
        .map_err(|e| anyhow!("read span: {e}"))?;
    ensure!(contents.name() == Some("rules/icu.yml"));
    Ok(())
}
