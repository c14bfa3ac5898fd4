/// Case-insensitive fuzzy match: every character of `query` appears in
/// `label` in order, not necessarily contiguously. An empty query matches
/// everything.
pub fn fuzzy_match(label: &str, query: &str) -> bool {
    let mut haystack = label.chars().flat_map(char::to_lowercase);
    query
        .chars()
        .flat_map(char::to_lowercase)
        .all(|needle| haystack.any(|c| c == needle))
}
