/// String utility functions.
pub struct StringUtil;

impl StringUtil {
    /// Convert a string to a boolean.
    ///
    /// Valid true values: `"1"`, `"true"`, `"yes"` (case-insensitive).
    /// Valid false values: `"0"`, `"false"`, `"no"` (case-insensitive).
    /// Returns `None` for unrecognized values.
    pub fn convert_to_bool(value: &str) -> Option<bool> {
        if value.is_empty() {
            return None;
        }
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }

    /// Escape the three characters that are significant in Telegram's HTML
    /// parse mode (`&`, `<`, `>`).
    pub fn escape_html(input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        for ch in input.chars() {
            match ch {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                _ => result.push(ch),
            }
        }
        result
    }

    /// Return a prefix substring of at most `count` characters.
    pub fn substring_prefix(value: &str, count: usize) -> &str {
        if count >= value.len() {
            value
        } else {
            // Char count, not byte count
            let end = value
                .char_indices()
                .nth(count)
                .map(|(idx, _)| idx)
                .unwrap_or(value.len());
            &value[..end]
        }
    }

    /// Collapse runs of whitespace (including newlines) into single spaces
    /// and trim the ends. Card texts scraped from the page carry layout
    /// whitespace that is noise in the database.
    pub fn normalize_whitespace(value: &str) -> String {
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_to_bool_true_values() {
        assert_eq!(StringUtil::convert_to_bool("1"), Some(true));
        assert_eq!(StringUtil::convert_to_bool("true"), Some(true));
        assert_eq!(StringUtil::convert_to_bool("True"), Some(true));
        assert_eq!(StringUtil::convert_to_bool("yes"), Some(true));
    }

    #[test]
    fn convert_to_bool_false_values() {
        assert_eq!(StringUtil::convert_to_bool("0"), Some(false));
        assert_eq!(StringUtil::convert_to_bool("FALSE"), Some(false));
        assert_eq!(StringUtil::convert_to_bool("no"), Some(false));
    }

    #[test]
    fn convert_to_bool_unknown() {
        assert_eq!(StringUtil::convert_to_bool(""), None);
        assert_eq!(StringUtil::convert_to_bool("maybe"), None);
    }

    #[test]
    fn escape_html_special_chars() {
        assert_eq!(
            StringUtil::escape_html("<b>Tom & Jerry</b>"),
            "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"
        );
        assert_eq!(StringUtil::escape_html("сантехник"), "сантехник");
    }

    #[test]
    fn substring_prefix_counts_chars() {
        assert_eq!(StringUtil::substring_prefix("привет", 3), "при");
        assert_eq!(StringUtil::substring_prefix("abc", 10), "abc");
    }

    #[test]
    fn normalize_whitespace_collapses_runs() {
        assert_eq!(
            StringUtil::normalize_whitespace("  Нужен\n  сантехник\t срочно "),
            "Нужен сантехник срочно"
        );
    }
}
