//! Type tag filtering.
//!
//! Dgraph tags every node with the bookkeeping types `Base` and `Entity` in
//! addition to its real type. Those tags carry no meaning for an
//! investigation view and are stripped before anything else looks at a node.

/// Type tags added by the storage layer for every node.
pub const HOUSEKEEPING_TYPES: &[&str] = &["Base", "Entity"];

/// Returns true for `Base` / `Entity`.
pub fn is_housekeeping(tag: &str) -> bool {
    HOUSEKEEPING_TYPES.contains(&tag)
}

/// Remove housekeeping tags, preserving the order of the remaining ones.
///
/// An empty result means the node is not a real entity; callers drop it.
pub fn filter_types(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().filter(|t| !is_housekeeping(t)).collect()
}

/// The first (primary) type tag, if any.
pub fn primary_type(tags: &[String]) -> Option<&str> {
    tags.first().map(String::as_str)
}
