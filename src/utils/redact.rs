//! Redaction of secrets before they reach the logs.

use regex::Regex;
use std::sync::LazyLock;

/// Query parameters and JSON fields that carry signatures or keys.
static SENSITIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(__signature=)[^&#\s]*", "${1}[REDACTED]"),
        (r#"(?i)("private_key":\s*")[^"]*(")"#, "${1}[REDACTED]${2}"),
        (r"(?i)(X-Auth-Signature:\s*)\S+", "${1}[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Replace signature values and private keys in `input` with `[REDACTED]`.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut result = input.to_string();
    for (re, replacement) in SENSITIVE_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    result
}
