use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([.!?]+)\s+").unwrap());
static ENUMERATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());

/// Splits text after `.`, `!` or `?` when whitespace follows, keeping the
/// punctuation. Dots inside `3.12` or `example.com` do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for cap in SENTENCE_END.captures_iter(text) {
        let (Some(whole), Some(punct)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        sentences.push(&text[start..punct.end()]);
        start = whole.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes a leading list marker such as `1.` or `3)`.
pub fn strip_enumeration(line: &str) -> &str {
    match ENUMERATION.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}

/// Greedy word wrap without hyphenation. A word longer than `width` is
/// broken: it first fills what is left of the current line, then continues
/// in `width`-sized pieces.
pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        let len = current.chars().count();
        let word_len = word.chars().count();

        if word_len <= width {
            if !current.is_empty() && len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }

        let chars: Vec<char> = word.chars().collect();
        let mut rest = chars.as_slice();
        if !current.is_empty() {
            let room = width.saturating_sub(len + 1);
            if room > 0 {
                current.push(' ');
                current.extend(&rest[..room]);
                rest = &rest[room..];
            }
            lines.push(std::mem::take(&mut current));
        }
        let mut pieces = rest.chunks(width).peekable();
        while let Some(piece) = pieces.next() {
            let piece: String = piece.iter().collect();
            if pieces.peek().is_some() {
                lines.push(piece);
            } else {
                current = piece;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_keep_terminal_punctuation() {
        let s = split_sentences("Restart it. Did that work?  Great!\nTrailing bit");
        assert_eq!(s, vec!["Restart it.", "Did that work?", "Great!", "Trailing bit"]);
    }

    #[test]
    fn dots_inside_words_do_not_split() {
        let s = split_sentences("Python 3.12 is faster. Visit example.com today... Then rest!");
        assert_eq!(
            s,
            vec!["Python 3.12 is faster.", "Visit example.com today...", "Then rest!"]
        );
    }

    #[test]
    fn strips_numeric_markers_only() {
        assert_eq!(strip_enumeration("1. Use keyboard shortcuts."), "Use keyboard shortcuts.");
        assert_eq!(strip_enumeration("2) Back up often."), "Back up often.");
        assert_eq!(strip_enumeration("12. Two digits."), "Two digits.");
        assert_eq!(strip_enumeration("- Dash stays"), "- Dash stays");
        assert_eq!(strip_enumeration("3D printing rocks."), "3D printing rocks.");
    }

    #[test]
    fn wraps_on_spaces_within_width() {
        let lines = wrap_text("Press Ctrl+Shift+T to reopen the tab you just closed.", 24);
        assert_eq!(lines, vec!["Press Ctrl+Shift+T to", "reopen the tab you just", "closed."]);
        assert!(lines.iter().all(|l| l.chars().count() <= 24));
    }

    #[test]
    fn long_words_are_broken_without_hyphens() {
        let lines = wrap_text("see supercalifragilisticexpialidocious now", 10);
        assert_eq!(
            lines,
            vec!["see superc", "alifragili", "sticexpial", "idocious", "now"]
        );
        assert!(lines.iter().all(|l| !l.contains('-')));
    }

    #[test]
    fn long_url_never_exceeds_width() {
        let url = "https://example.com/docs/getting-started";
        let lines = wrap_text(&format!("Read {} first.", url), 24);
        assert!(lines.iter().all(|l| l.chars().count() <= 24), "{:?}", lines);
        assert_eq!(lines.concat().replace(' ', ""), format!("Read{}first.", url));
    }
}
