//! Short, single-line renderings of message text for warnings and reports.

/// Longest prefix of `s` within `max_bytes` that ends on a char boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// One-line excerpt of `s`: newlines shown as `\n`, cut at `max_bytes`
/// with a trailing `...` when longer.
pub fn excerpt(s: &str, max_bytes: usize) -> String {
    let flat = s.replace('\n', "\\n");
    if flat.len() <= max_bytes {
        return flat;
    }
    let body = truncate_str(&flat, max_bytes.saturating_sub(3));
    format!("{body}...")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_snaps_to_boundary() {
        assert_eq!(truncate_str("hello", 3), "hel");
        assert_eq!(truncate_str("ab\u{17e}cd", 3), "ab");
        assert_eq!(truncate_str("ab\u{17e}cd", 4), "ab\u{17e}");
        assert_eq!(truncate_str("short", 10), "short");
    }

    #[test]
    fn excerpt_flattens_newlines() {
        assert_eq!(excerpt("a\nb", 20), "a\\nb");
    }

    #[test]
    fn excerpt_marks_cut() {
        assert_eq!(excerpt("Otvori datoteku", 9), "Otvori...");
        assert!(excerpt(&"\u{161}".repeat(20), 10).ends_with("..."));
    }
}
