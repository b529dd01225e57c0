//! Request path normalization
//!
//! Removes the mount prefix, trims separators and splits the remainder into
//! segments. Matching is literal: no percent-decoding, empty segments kept.

/// Strip the query string, `base_path` and surrounding `/` from `path`
///
/// The base path only matches on a segment boundary, so `/api` strips
/// `/api/health` but leaves `/apiary` untouched.
pub fn normalize<'a>(path: &'a str, base_path: &str) -> &'a str {
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    let base = base_path.trim_end_matches('/');
    let rest = if base.is_empty() {
        path
    } else {
        match path.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        }
    };
    rest.trim_matches('/')
}

/// Split a normalized path into its segments
pub fn segments(normalized: &str) -> Vec<&str> {
    normalized.split('/').collect()
}
