// Keyword matching for listing titles.

/// True if any keyword occurs in the title, ignoring case.
pub fn matches(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|k| title.contains(&k.to_lowercase()))
}
