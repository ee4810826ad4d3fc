// src/util.rs — Small text helpers shared by tasks, evaluators and logging

/// Cut a string to at most `max_len` bytes for a log line, on a char boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Trimmed, non-empty lines of an oracle response.
pub fn nonempty_lines(s: &str) -> impl Iterator<Item = &str> {
    s.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Last alphabetic word of the last non-empty line, lowercased.
/// "I cannot obtain 24 now\nlikely." gives "likely".
pub fn last_word(s: &str) -> Option<String> {
    let line = nonempty_lines(s).last()?;
    line.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .last()
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("propose", 20), "propose");
        assert_eq!(truncate_str("propose", 3), "pro");
        assert_eq!(truncate_str("", 3), "");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "÷" is two bytes; never split it
        assert_eq!(truncate_str("8÷2", 2), "8");
    }

    #[test]
    fn test_nonempty_lines() {
        let lines: Vec<&str> = nonempty_lines("\n a \n\n b\n").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_last_word() {
        assert_eq!(last_word("10 14\n10 + 14 = 24\nsure\n").as_deref(), Some("sure"));
        assert_eq!(last_word("numbers are too big: Impossible.").as_deref(), Some("impossible"));
        assert_eq!(last_word("24\n").as_deref(), None);
        assert_eq!(last_word("").as_deref(), None);
    }
}
