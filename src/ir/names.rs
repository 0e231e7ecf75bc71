//! Name uniqueness checks across a compilation.
//!
//! Request names, target names, and variable names must each be unique in the
//! generated file. Collisions either abort compilation or are logged,
//! depending on the [`DuplicatePolicy`].

use std::collections::HashSet;

use tracing::warn;

use crate::ast::BuildRequest;
use crate::config::DuplicatePolicy;

use super::graph::{IrGenError, NameKind, RuleRecord, RuleSet};

/// Collect names that occur more than once, sorted and without repeats.
fn find_duplicates<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let mut dups: Vec<String> = names
        .into_iter()
        .filter(|name| !seen.insert(*name))
        .map(str::to_owned)
        .collect();
    if dups.is_empty() {
        return None;
    }
    dups.sort();
    dups.dedup();
    Some(dups)
}

fn defined_names(set: &RuleSet, wanted: NameKind) -> impl Iterator<Item = &str> {
    set.records
        .iter()
        .filter_map(RuleRecord::defined_name)
        .filter_map(move |(kind, name)| (kind == wanted).then_some(name))
}

/// Check request, target, and variable names for collisions.
///
/// `dir_target` is the sanitized directory-creation target, which shares the
/// target namespace with every rule.
///
/// # Errors
///
/// Returns [`IrGenError::DuplicateName`] for the first kind of name that
/// collides when `policy` is [`DuplicatePolicy::Reject`].
pub(crate) fn check_unique_names(
    requests: &[BuildRequest],
    set: &RuleSet,
    dir_target: Option<&str>,
    policy: DuplicatePolicy,
) -> Result<(), IrGenError> {
    let checks = [
        (
            NameKind::Request,
            find_duplicates(requests.iter().map(BuildRequest::name)),
        ),
        (
            NameKind::Target,
            find_duplicates(dir_target.into_iter().chain(defined_names(set, NameKind::Target))),
        ),
        (
            NameKind::Variable,
            find_duplicates(defined_names(set, NameKind::Variable)),
        ),
    ];
    for (kind, dups) in checks {
        let Some(names) = dups else { continue };
        match policy {
            DuplicatePolicy::Reject => return Err(IrGenError::DuplicateName { kind, names }),
            DuplicatePolicy::Allow => {
                for name in &names {
                    warn!(%kind, name = name.as_str(), "duplicate name; later definitions win");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DirGroup, FileRef, VariableRequest};
    use crate::ir::{CustomRule, FilesVar};
    use rstest::rstest;

    fn variable(name: &str) -> BuildRequest {
        BuildRequest::Variable(VariableRequest {
            name: name.into(),
            input_files: Vec::new(),
        })
    }

    fn rule(name: &str) -> RuleRecord {
        RuleRecord::Rule(CustomRule {
            name: name.into(),
            dep_literals: Vec::new(),
            dep_files: Vec::new(),
            output_files: vec![FileRef::new(DirGroup::Out, name)],
            commands: Vec::new(),
        })
    }

    fn files_var(name: &str) -> RuleRecord {
        RuleRecord::FilesVar(FilesVar {
            name: name.into(),
            files: Vec::new(),
        })
    }

    #[rstest]
    fn find_duplicates_sorts_and_dedups() {
        assert_eq!(
            find_duplicates(["b", "a", "b", "a", "b", "c"]),
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(find_duplicates(["a", "b"]), None);
    }

    #[rstest]
    fn unique_names_pass() {
        let set = RuleSet {
            records: vec![rule("a"), files_var("A")],
        };
        assert!(check_unique_names(&[variable("a")], &set, None, DuplicatePolicy::Reject).is_ok());
    }

    #[rstest]
    fn duplicate_requests_are_rejected() {
        let requests = [variable("x"), variable("x")];
        let err = check_unique_names(&requests, &RuleSet::default(), None, DuplicatePolicy::Reject)
            .expect_err("duplicate");
        assert!(matches!(
            err,
            IrGenError::DuplicateName { kind: NameKind::Request, ref names } if names == &["x"]
        ));
    }

    #[rstest]
    #[case(vec![rule("t"), rule("t")], NameKind::Target)]
    #[case(vec![files_var("V"), files_var("V")], NameKind::Variable)]
    fn duplicate_records_are_rejected(#[case] records: Vec<RuleRecord>, #[case] expected: NameKind) {
        let set = RuleSet { records };
        let err = check_unique_names(&[], &set, None, DuplicatePolicy::Reject).expect_err("duplicate");
        assert!(matches!(err, IrGenError::DuplicateName { kind, .. } if kind == expected));
    }

    #[rstest]
    fn rule_named_like_directory_target_is_rejected() {
        let set = RuleSet {
            records: vec![rule("build_tmp_dirs")],
        };
        let err = check_unique_names(&[], &set, Some("build_tmp_dirs"), DuplicatePolicy::Reject)
            .expect_err("directory target collision");
        assert!(matches!(
            err,
            IrGenError::DuplicateName { kind: NameKind::Target, ref names } if names == &["build_tmp_dirs"]
        ));
        assert!(check_unique_names(&[], &set, Some("other_dirs"), DuplicatePolicy::Reject).is_ok());
    }

    #[rstest]
    fn records_report_their_defined_names() {
        assert_eq!(rule("t").defined_name(), Some((NameKind::Target, "t")));
        assert_eq!(files_var("V").defined_name(), Some((NameKind::Variable, "V")));
    }

    #[rstest]
    fn allow_policy_tolerates_duplicates() {
        let set = RuleSet {
            records: vec![rule("t"), rule("t")],
        };
        let requests = [variable("x"), variable("x")];
        assert!(check_unique_names(&requests, &set, None, DuplicatePolicy::Allow).is_ok());
    }
}
