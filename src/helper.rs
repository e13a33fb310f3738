use log::debug;

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Takes the first `max_chars` characters of `text`, or the whole text if
/// shorter. Counted in chars so multibyte input never splits a code point.
pub fn abstract_of(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// One-line preview for list rendering: truncated to `max_chars` with an
/// ellipsis marker when anything was cut.
pub fn preview_of(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        debug!("Truncating preview to {} chars", max_chars);
        format!("{}...", abstract_of(&flat, max_chars))
    }
}
