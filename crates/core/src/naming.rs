//! Name slugging for generated question and option names.

/// Slugify free text into a lowercase `snake_case` identifier fragment.
///
/// Alphanumerics are kept (lowercased), every other run of characters
/// collapses to a single underscore, and leading/trailing underscores are
/// trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }

    slug
}
