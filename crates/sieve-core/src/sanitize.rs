//! Textual escaping for values embedded in generated predicates.
//!
//! This is a last line of defence for consumers that splice the predicate into
//! SQL text. Consumers that support bind parameters should prefer them.

use crate::policy::AttributeName;

pub const DEFAULT_MAX_VALUE_LEN: usize = 100;

const STRIPPED_CHARS: &[char] = &['\'', '"', '`', ';', '\\', '\n', '\r', '\0'];
const STRIPPED_MARKERS: &[&str] = &["--", "/*", "*/"];

/// Removes quotes, statement separators and comment markers, then truncates to
/// `max_len` characters.
pub fn sanitize_value(value: &str, max_len: usize) -> String {
    let mut out: String = value.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();

    // Removing one marker can splice a new one together ("-/**/-").
    loop {
        let before = out.len();
        for marker in STRIPPED_MARKERS {
            out = out.replace(marker, "");
        }
        if out.len() == before {
            break;
        }
    }

    out.chars().take(max_len).collect()
}

pub fn in_clause(column: &AttributeName, values: &[String], max_len: usize) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("'{}'", sanitize_value(v, max_len)))
        .collect();
    format!("{column} IN ({})", quoted.join(", "))
}
