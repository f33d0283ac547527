//! Path syncability filter
//!
//! Keeps the client's own bookkeeping (debris) directory out of the sync
//! scope. Pure string predicate; no tree state involved.

/// Whether `path` may be synced given the excluded subtree `excluded_root`.
///
/// A path is excluded when it equals `excluded_root` or lies inside it, i.e.
/// starts with `excluded_root` immediately followed by `separator`. Sharing
/// the name as a plain prefix (`.debrisx` vs `.debris`) does not exclude.
pub fn is_path_syncable(path: &str, excluded_root: &str, separator: &str) -> bool {
    match path.strip_prefix(excluded_root) {
        Some("") => false,
        Some(rest) => !rest.starts_with(separator),
        None => true,
    }
}
