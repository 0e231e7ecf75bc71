//! Hints for common YAML and manifest mistakes, keyed by a lowercase
//! fragment of the parser message.

pub(crate) const YAML_HINTS: [(&str, &str); 7] = [
    (
        "did not find expected '-'",
        "Start list items with '-' and ensure proper indentation.",
    ),
    (
        "mapping values are not allowed",
        "Check for a stray ':' or add quotes around values where needed.",
    ),
    (
        "found character that cannot start any token",
        "Remove stray characters and ensure indentation uses spaces (no tabs).",
    ),
    (
        "unknown variant",
        "Request kinds are print_file, copy, variable, single_execution, and repeated_execution.",
    ),
    (
        "unknown field",
        "Remove the field or check its spelling against the request kind.",
    ),
    (
        "missing field",
        "Every request needs a 'kind' and a 'name' plus the fields of its kind.",
    ),
    (
        "directory group",
        "Use src, in, tmp, out, pkg, or local:<dir> for 'dir'.",
    ),
];
