/// Lowercase, trim, turn spaces into `-` and drop everything that is not a
/// word character or `-`. Word characters are ASCII letters, digits and `_`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if is_word_char(c) || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Filename stem for a subject: [`slugify`] with any leading or trailing run
/// of `_` and non-word characters removed. May be empty.
pub fn derive_slug(subject: &str) -> String {
    slugify(subject)
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
