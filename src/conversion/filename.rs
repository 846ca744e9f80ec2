//! Client filename sanitizing and extension checks.

use crate::config::AllowedExtensions;

/// Reduces a client-supplied name to a filesystem-safe token.
///
/// Directory components are dropped, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9._-]` is removed, runs of `.` collapse to one and
/// leading/trailing `.`/`_` are trimmed. Never fails: a name with nothing
/// usable left comes back empty.
pub fn normalize(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let mut safe = String::with_capacity(base.len());
    for (i, word) in base.split_whitespace().enumerate() {
        if i > 0 {
            safe.push('_');
        }
        for c in word.chars() {
            if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
                continue;
            }
            if c == '.' && safe.ends_with('.') {
                continue;
            }
            safe.push(c);
        }
    }

    safe.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Everything after the first `.`.
///
/// `a.tar.gz` yields `tar.gz`, so only single-suffix names can match the
/// allow-list.
pub fn extension(name: &str) -> Option<&str> {
    name.split_once('.').map(|(_, rest)| rest)
}

pub fn has_allowed_extension(name: &str, allowed: &AllowedExtensions) -> bool {
    extension(name).is_some_and(|ext| allowed.contains(ext))
}
