//! Small text helpers used by the transformer

/// Preview length for abstracts, in characters
pub const PREVIEW_MAX_CHARS: usize = 150;

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Extract the year from a date string
///
/// Returns the first run of 4 ASCII digits, or the input unchanged when
/// there is none ("2024-03-15" → "2024", "circa 1990s" → "1990",
/// "n.d." → "n.d.").
pub fn extract_year(date: &str) -> String {
    let bytes = date.as_bytes();
    let mut run = 0;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 4 {
                return date[i + 1 - 4..=i].to_string();
            }
        } else {
            run = 0;
        }
    }
    date.to_string()
}

/// Truncate text to at most `max_chars` characters plus [`ELLIPSIS`]
///
/// Cuts back to the last space inside the limit when one exists past the
/// first character; otherwise keeps the hard cut. Text that already fits is
/// returned unchanged.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let head = &text[..cut];
    match head.rfind(' ') {
        Some(space) if space > 0 => format!("{}{}", &head[..space], ELLIPSIS),
        _ => format!("{}{}", head, ELLIPSIS),
    }
}

/// Treat empty and whitespace-only strings as missing
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_year_formats() {
        assert_eq!(extract_year("2024-03-15"), "2024");
        assert_eq!(extract_year("2024"), "2024");
        assert_eq!(extract_year("March 2024"), "2024");
        assert_eq!(extract_year("03/15/1999"), "1999");
        assert_eq!(extract_year("n.d."), "n.d.");
        assert_eq!(extract_year("12 345"), "12 345");
        assert_eq!(extract_year(""), "");
    }

    #[test]
    fn test_extract_year_takes_first_run_of_four() {
        assert_eq!(extract_year("20245"), "2024");
        assert_eq!(extract_year("1999/2000"), "1999");
    }

    #[test]
    fn test_short_text_unchanged() {
        let text = "Short abstract.";
        assert_eq!(truncate_text(text, PREVIEW_MAX_CHARS), text);

        let exact = "a".repeat(PREVIEW_MAX_CHARS);
        assert_eq!(truncate_text(&exact, PREVIEW_MAX_CHARS), exact);
    }

    #[test]
    fn test_long_text_cut_at_word_boundary() {
        let text = "word ".repeat(60);
        let preview = truncate_text(&text, PREVIEW_MAX_CHARS);

        assert!(preview.ends_with(ELLIPSIS));
        let body = preview.trim_end_matches(ELLIPSIS);
        assert!(body.chars().count() <= PREVIEW_MAX_CHARS);
        assert!(body.ends_with("word"));
        assert!(text.starts_with(body));
    }

    #[test]
    fn test_long_text_without_spaces_hard_cut() {
        let text = "x".repeat(400);
        let preview = truncate_text(&text, PREVIEW_MAX_CHARS);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let text = "é".repeat(200);
        let preview = truncate_text(&text, PREVIEW_MAX_CHARS);
        assert_eq!(preview, format!("{}{}", "é".repeat(150), ELLIPSIS));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }
}
