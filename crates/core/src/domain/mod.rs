pub mod expense;
pub mod record;
pub mod rule;
pub mod user;

/// Identity comparison key: identities are matched case-insensitively and
/// ignoring surrounding whitespace throughout the engine.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

pub fn same_identity(left: &str, right: &str) -> bool {
    normalize_key(left) == normalize_key(right)
}
