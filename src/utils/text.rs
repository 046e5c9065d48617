use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Strip HTML tags, decode entities, and collapse whitespace.
pub fn strip_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(text);
    let joined = fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    whitespace_re().replace_all(&joined, " ").trim().to_string()
}

/// Truncate text to `max_length`, preferring a word boundary, appending an
/// ellipsis when truncated. Input is HTML-stripped first.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    const ELLIPSIS: &str = "...";

    if text.is_empty() {
        return String::new();
    }

    let cleaned = strip_html(text);
    if cleaned.chars().count() <= max_length {
        return cleaned;
    }

    let budget = max_length.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = cleaned.chars().take(budget).collect();

    // Break at a word boundary unless that would lose more than half the text
    if let Some(last_space) = truncated.rfind(' ') {
        if last_space > max_length / 2 {
            truncated.truncate(last_space);
        }
    }

    format!("{}{}", truncated.trim_end(), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags_and_entities() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_html("Fish &amp; Chips"), "Fish & Chips");
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        assert_eq!(strip_html("a\n\n  b\t c"), "a b c");
    }

    #[test]
    fn test_strip_html_empty() {
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_text("short text", 200), "short text");
    }

    #[test]
    fn test_truncate_breaks_at_word_boundary() {
        let long = "word ".repeat(100);
        let result = truncate_text(&long, 50);
        assert!(result.chars().count() <= 50);
        assert!(result.ends_with("..."));
        // No mid-word cut: the part before the ellipsis is whole words
        let body = result.trim_end_matches("...");
        assert!(long.starts_with(body.trim_end()));
    }

    #[test]
    fn test_truncate_strips_html_first() {
        let result = truncate_text("<p>only a few words</p>", 200);
        assert_eq!(result, "only a few words");
    }
}
