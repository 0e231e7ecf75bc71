//! CLI parsing helpers for clap value parsers.

/// Split a `KEY=VALUE` override into its parts.
///
/// The key must be a non-empty identifier; the value may be empty and may
/// itself contain `=`.
pub(super) fn parse_var(s: &str) -> Result<(String, String), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("'{s}' is not of the form KEY=VALUE"));
    };
    let name = key.trim();
    if name.is_empty() {
        return Err(format!("'{s}' has an empty variable name"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "variable name '{name}' may only contain ASCII letters, digits, and '_'"
        ));
    }
    Ok((name.to_owned(), value.to_owned()))
}
