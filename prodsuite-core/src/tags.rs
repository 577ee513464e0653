use std::collections::BTreeSet;

/// Tag given to lists created without any.
pub const DEFAULT_TAG: &str = "default";

/// Distinct tags in sorted order.
pub fn distinct_sorted<'a>(tags: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    tags.into_iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Empty tag sets collapse to `["default"]`.
pub fn or_default_tag(tags: Vec<String>) -> Vec<String> {
    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}
