//! Comma-delimited tag encoding used by the `entity_snapshots.tags` column.

const DELIMITER: char = ',';

/// Trims, drops empties and removes repeats, keeping first-seen order.
pub(crate) fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

/// Serializes tags as delimited text, e.g. `["Fighter", "Tank"]` → `"Fighter,Tank"`.
#[must_use]
pub fn encode_tags(tags: &[String]) -> String {
    tags.join(&DELIMITER.to_string())
}

/// Parses delimited tag text back into an ordered, de-duplicated list.
///
/// An empty string yields an empty list.
#[must_use]
pub fn decode_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(DELIMITER).map(str::to_string))
}
