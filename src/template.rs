//! Placeholder substitution for path, name, and command templates.
//!
//! Templates use `{NAME}` for a whole binding and `{NAME[i]}` for one item
//! of a list binding. `{{` and `}}` produce literal braces, which is how a
//! template spells CMake's `${VAR}` references (`${{VAR}}`). Every template is
//! evaluated against a closed [`Scope`]; a placeholder the scope does not
//! declare is an error rather than being copied through.
//!
//! ```rust
//! use kumiki::template::{Scope, substitute};
//!
//! let files = vec!["a.txt".to_owned(), "b.txt".to_owned()];
//! let mut scope = Scope::new();
//! scope.scalar("OUT_DIR", "build").list("INPUT_FILES", &files);
//! let text = substitute("${{TOOLBINDIR}} -d {OUT_DIR} {INPUT_FILES[1]}", &scope)
//!     .expect("substitute");
//! assert_eq!(text, "${TOOLBINDIR} -d build b.txt");
//! ```

use indexmap::IndexMap;
use miette::Diagnostic;
use std::collections::HashMap;
use thiserror::Error;

use crate::ast::StringOrList;

/// A value bound to a placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    /// Substituted verbatim.
    Scalar(&'a str),
    /// Substituted as space-separated items, or indexed with `{NAME[i]}`.
    List(&'a [String]),
}

/// The closed set of placeholders available to a template.
///
/// Later insertions shadow earlier ones with the same name.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    entries: HashMap<&'a str, Value<'a>>,
}

impl<'a> Scope<'a> {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a single string.
    pub fn scalar(&mut self, name: &'a str, value: &'a str) -> &mut Self {
        self.entries.insert(name, Value::Scalar(value));
        self
    }

    /// Bind `name` to a list of strings.
    pub fn list(&mut self, name: &'a str, values: &'a [String]) -> &mut Self {
        self.entries.insert(name, Value::List(values));
        self
    }

    /// Bind every entry of a string map.
    pub fn vars(&mut self, vars: &'a IndexMap<String, String>) -> &mut Self {
        for (name, value) in vars {
            self.scalar(name, value);
        }
        self
    }

    /// Bind every entry of a scalar-or-list map. Empty values bind an empty
    /// string.
    pub fn bindings(&mut self, bindings: &'a IndexMap<String, StringOrList>) -> &mut Self {
        for (name, value) in bindings {
            match value {
                StringOrList::Empty => self.scalar(name, ""),
                StringOrList::String(s) => self.scalar(name, s),
                StringOrList::List(items) => self.list(name, items),
            };
        }
        self
    }

    fn get(&self, name: &str) -> Option<Value<'a>> {
        self.entries.get(name).copied()
    }
}

/// Errors raised while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TemplateError {
    /// The template names a placeholder the scope does not define.
    #[error("unknown placeholder '{{{name}}}' in template '{template}'")]
    #[diagnostic(code(kumiki::template::unknown_placeholder))]
    UnknownPlaceholder {
        /// Placeholder name.
        name: String,
        /// Template being expanded.
        template: String,
    },
    /// `{NAME[i]}` was used on a scalar binding.
    #[error("placeholder '{name}' holds a single value and cannot be indexed in '{template}'")]
    #[diagnostic(code(kumiki::template::not_a_list))]
    NotAList {
        /// Placeholder name.
        name: String,
        /// Template being expanded.
        template: String,
    },
    /// `{NAME[i]}` used an index past the end of the list.
    #[error("index {index} is out of range for '{name}' ({len} items) in '{template}'")]
    #[diagnostic(code(kumiki::template::index_out_of_range))]
    IndexOutOfRange {
        /// Placeholder name.
        name: String,
        /// Requested index.
        index: usize,
        /// Number of items bound.
        len: usize,
        /// Template being expanded.
        template: String,
    },
    /// A `{...}` group that is not a valid placeholder.
    #[error("malformed placeholder '{{{body}}}' in template '{template}'")]
    #[diagnostic(
        code(kumiki::template::malformed),
        help("write literal braces as '{{{{' and '}}}}'")
    )]
    Malformed {
        /// Text between the braces.
        body: String,
        /// Template being expanded.
        template: String,
    },
    /// A lone `{` or `}`.
    #[error("unbalanced '{brace}' at offset {offset} in template '{template}'")]
    #[diagnostic(
        code(kumiki::template::unbalanced),
        help("write literal braces as '{{{{' and '}}}}'")
    )]
    Unbalanced {
        /// The offending brace.
        brace: char,
        /// Byte offset of the brace.
        offset: usize,
        /// Template being expanded.
        template: String,
    },
}

/// A parsed `{NAME}` or `{NAME[i]}` reference.
#[derive(Debug, PartialEq, Eq)]
struct Placeholder<'t> {
    name: &'t str,
    index: Option<usize>,
}

/// Returns whether `ch` may appear in a placeholder name.
fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_identifier_char)
}

/// Parse the text between braces.
///
/// # Examples
/// ```rust,ignore
/// assert_eq!(parse_placeholder("A[2]").map(|p| p.index), Some(Some(2)));
/// assert!(parse_placeholder("A B").is_none());
/// ```
fn parse_placeholder(body: &str) -> Option<Placeholder<'_>> {
    match body.split_once('[') {
        None => is_identifier(body).then_some(Placeholder {
            name: body,
            index: None,
        }),
        Some((name, rest)) => {
            let digits = rest.strip_suffix(']')?;
            if !is_identifier(name) || digits.is_empty() {
                return None;
            }
            let index = digits.parse().ok()?;
            Some(Placeholder {
                name,
                index: Some(index),
            })
        }
    }
}

fn expand(
    placeholder: &Placeholder<'_>,
    scope: &Scope<'_>,
    template: &str,
    out: &mut String,
) -> Result<(), TemplateError> {
    let value = scope
        .get(placeholder.name)
        .ok_or_else(|| TemplateError::UnknownPlaceholder {
            name: placeholder.name.to_owned(),
            template: template.to_owned(),
        })?;
    match (value, placeholder.index) {
        (Value::Scalar(text), None) => out.push_str(text),
        (Value::List(items), None) => out.push_str(&items.join(" ")),
        (Value::Scalar(_), Some(_)) => {
            return Err(TemplateError::NotAList {
                name: placeholder.name.to_owned(),
                template: template.to_owned(),
            });
        }
        (Value::List(items), Some(index)) => {
            let item = items.get(index).ok_or_else(|| TemplateError::IndexOutOfRange {
                name: placeholder.name.to_owned(),
                index,
                len: items.len(),
                template: template.to_owned(),
            })?;
            out.push_str(item);
        }
    }
    Ok(())
}

/// Expand every placeholder in `template` using `scope`.
///
/// Substituted values are inserted verbatim and never rescanned.
///
/// # Errors
///
/// Returns [`TemplateError`] when a placeholder is unknown, malformed, or
/// indexes past the end of its list, or when a brace is unbalanced.
pub fn substitute(template: &str, scope: &Scope<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '{' if chars.next_if(|&(_, c)| c == '{').is_some() => out.push('{'),
            '}' if chars.next_if(|&(_, c)| c == '}').is_some() => out.push('}'),
            '{' => {
                let start = offset + 1;
                let end = loop {
                    match chars.next() {
                        Some((pos, '}')) => break pos,
                        Some((_, '{')) | None => {
                            return Err(TemplateError::Unbalanced {
                                brace: '{',
                                offset,
                                template: template.to_owned(),
                            });
                        }
                        Some(_) => {}
                    }
                };
                let body = template.get(start..end).unwrap_or_default();
                let placeholder =
                    parse_placeholder(body).ok_or_else(|| TemplateError::Malformed {
                        body: body.to_owned(),
                        template: template.to_owned(),
                    })?;
                expand(&placeholder, scope, template, &mut out)?;
            }
            '}' => {
                return Err(TemplateError::Unbalanced {
                    brace: '}',
                    offset,
                    template: template.to_owned(),
                });
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn files() -> Vec<String> {
        vec!["a.txt".to_owned(), "b.txt".to_owned()]
    }

    #[rstest]
    #[case("plain text", "plain text")]
    #[case("{DIR}/x", "build/x")]
    #[case("{FILES}", "a.txt b.txt")]
    #[case("{FILES[0]}", "a.txt")]
    #[case("${{CMAKE_COMMAND}} -E echo", "${CMAKE_COMMAND} -E echo")]
    #[case("{{DIR}}", "{DIR}")]
    #[case("", "")]
    fn substitutes_placeholders(#[case] template: &str, #[case] expected: &str) {
        let list = files();
        let mut scope = Scope::new();
        scope.scalar("DIR", "build").list("FILES", &list);
        assert_eq!(substitute(template, &scope).as_deref(), Ok(expected));
    }

    #[rstest]
    fn later_bindings_shadow_earlier_ones() {
        let mut scope = Scope::new();
        scope.scalar("DIR", "one").scalar("DIR", "two");
        assert_eq!(substitute("{DIR}", &scope).as_deref(), Ok("two"));
    }

    #[rstest]
    fn values_are_not_rescanned() {
        let mut scope = Scope::new();
        scope.scalar("DIR", "${CMAKE_BINARY_DIR}/{x}");
        assert_eq!(
            substitute("{DIR}", &scope).as_deref(),
            Ok("${CMAKE_BINARY_DIR}/{x}")
        );
    }

    #[rstest]
    fn unknown_placeholder_is_an_error() {
        let err = substitute("-o {MISSING}", &Scope::new()).expect_err("unknown placeholder");
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                name: "MISSING".into(),
                template: "-o {MISSING}".into(),
            }
        );
    }

    #[rstest]
    fn indexing_a_scalar_is_an_error() {
        let mut scope = Scope::new();
        scope.scalar("DIR", "build");
        let err = substitute("{DIR[0]}", &scope).expect_err("scalar index");
        assert!(matches!(err, TemplateError::NotAList { .. }));
    }

    #[rstest]
    fn out_of_range_index_is_an_error() {
        let list = files();
        let mut scope = Scope::new();
        scope.list("FILES", &list);
        let err = substitute("{FILES[2]}", &scope).expect_err("out of range");
        assert!(matches!(
            err,
            TemplateError::IndexOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[rstest]
    #[case("{}")]
    #[case("{A B}")]
    #[case("{A[}")]
    #[case("{A[x]}")]
    #[case("{A[]}")]
    fn malformed_placeholders_are_rejected(#[case] template: &str) {
        let err = substitute(template, &Scope::new()).expect_err("malformed");
        assert!(matches!(err, TemplateError::Malformed { .. }), "{err:?}");
    }

    #[rstest]
    #[case("open {A", '{', 5)]
    #[case("close A}", '}', 7)]
    #[case("{A{B}", '{', 0)]
    fn unbalanced_braces_are_rejected(
        #[case] template: &str,
        #[case] brace: char,
        #[case] offset: usize,
    ) {
        let err = substitute(template, &Scope::new()).expect_err("unbalanced");
        assert_eq!(
            err,
            TemplateError::Unbalanced {
                brace,
                offset,
                template: template.to_owned(),
            }
        );
    }
}
