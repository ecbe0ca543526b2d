/// Upper bound applied to every caller-supplied list limit.
pub const MAX_LIST_LIMIT: u64 = 500;

pub const DEFAULT_PREDICTION_LIMIT: u64 = 50;
pub const DEFAULT_BLOG_LIMIT: u64 = 20;
pub const DEFAULT_USER_LIMIT: u64 = 100;

/// Resolves a requested list size: missing or non-positive values fall back to
/// `default`, anything else is capped at `MAX_LIST_LIMIT`.
pub fn resolve_limit(requested: Option<i64>, default: u64) -> u64 {
    match requested {
        Some(n) if n > 0 => (n as u64).min(MAX_LIST_LIMIT),
        _ => default,
    }
}
