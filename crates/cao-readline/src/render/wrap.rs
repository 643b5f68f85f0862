//! Display-width text wrapping.
//!
//! Any code point above U+007F counts as two columns, everything else as one.

/// Columns a single character occupies.
pub fn char_width(c: char) -> usize {
    if (c as u32) > 127 { 2 } else { 1 }
}

/// Columns a string occupies.
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Splits `text` into lines no wider than `content_width` columns.
///
/// Each newline-separated segment is wrapped on its own. A segment that fits
/// is kept as is. Otherwise segments containing non-ASCII text break between
/// characters, and pure ASCII segments break between words. A single word or
/// character wider than `content_width` gets a line of its own.
pub fn wrap(text: &str, content_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let before = lines.len();

        if display_width(segment) <= content_width {
            lines.push(segment.to_string());
        } else if segment.chars().any(|c| !c.is_ascii()) {
            wrap_chars(segment, content_width, &mut lines);
        } else {
            wrap_words(segment, content_width, &mut lines);
        }

        // an over-wide run of spaces still occupies a row
        if lines.len() == before {
            lines.push(String::new());
        }
    }
    lines
}

fn wrap_chars(segment: &str, content_width: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut width = 0;

    for c in segment.chars() {
        let w = char_width(c);
        if width + w > content_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            width = 0;
        }
        current.push(c);
        width += w;
    }

    if !current.is_empty() {
        lines.push(current);
    }
}

fn wrap_words(segment: &str, content_width: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut width = 0;

    for word in segment.split_whitespace() {
        let w = display_width(word);
        let separator = usize::from(!current.is_empty());

        if width + separator + w > content_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            width = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            width += 1;
        }
        current.push_str(word);
        width += w;
    }

    if !current.is_empty() {
        lines.push(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("小草"), 4);
        assert_eq!(display_width("ok 🌱"), 5);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn test_fitting_lines_are_unchanged() {
        assert_eq!(wrap("  indented   spacing", 40), vec!["  indented   spacing"]);
        assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn test_ascii_wraps_on_words() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(
            lines,
            vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]
        );
    }

    #[test]
    fn test_non_ascii_wraps_on_characters() {
        let lines = wrap("你好世界你好世界", 6);
        assert_eq!(lines, vec!["你好世", "界你好", "世界"]);
        assert!(lines.iter().all(|l| display_width(l) <= 6));
    }

    #[test]
    fn test_oversized_word_gets_its_own_line() {
        let lines = wrap("see https://example.com/a/very/long/path now", 12);
        assert_eq!(lines, vec!["see", "https://example.com/a/very/long/path", "now"]);
    }

    #[test]
    fn test_width_bound_holds_and_text_is_preserved() {
        let text = "error[E0382]: borrow of moved value: `config`\n  --> src/main.rs:14:20\n\
                    value borrowed here after move, consider cloning the value if the performance cost is acceptable";
        for width in [8, 20, 37, 76] {
            let lines = wrap(text, width);
            for line in &lines {
                let longest_word = line.split(' ').map(display_width).max().unwrap_or(0);
                assert!(display_width(line) <= width || longest_word > width);
            }
            let rejoined: String = lines.concat().split_whitespace().collect();
            let original: String = text.split_whitespace().collect();
            assert_eq!(rejoined, original);
        }
    }

    #[test]
    fn test_wrapping_is_idempotent() {
        let text = "alpha beta gamma delta epsilon zeta eta theta\n混合 text 内容需要被折行处理";
        for width in [6, 11, 24] {
            let once = wrap(text, width);
            let twice = wrap(&once.join("\n"), width);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_non_empty_input_never_yields_nothing() {
        assert_eq!(wrap("          ", 4), vec![""]);
        assert!(!wrap("x", 0).is_empty());
    }
}
