//! Telegram MarkdownV2 escaping.

/// Every character MarkdownV2 treats as markup outside code spans.
pub const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escape `text` so it renders literally inside a MarkdownV2 message.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Strip MarkdownV2 escapes and emphasis markers, for the plain-text retry.
pub fn to_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '_' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_reserved_character() {
        let all: String = RESERVED.iter().collect();
        let escaped = escape(&all);
        assert_eq!(escaped.chars().count(), all.chars().count() * 2);
        for pair in escaped.chars().collect::<Vec<_>>().chunks(2) {
            assert_eq!(pair[0], '\\', "unescaped character in {escaped}");
            assert!(RESERVED.contains(&pair[1]));
        }
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        assert_eq!(escape("Hello 👋 budi"), "Hello 👋 budi");
    }

    #[test]
    fn escapes_username() {
        assert_eq!(escape("@john_doe.92!"), "@john\\_doe\\.92\\!");
    }

    #[test]
    fn no_reserved_character_left_unescaped() {
        let text = "a_b*c[d]e(f)g~h`i>j#k+l-m=n|o{p}q.r!s\\t";
        let escaped = escape(text);
        let mut prev_backslash = false;
        for c in escaped.chars() {
            if prev_backslash {
                prev_backslash = false;
                continue;
            }
            if c == '\\' {
                prev_backslash = true;
                continue;
            }
            assert!(!RESERVED.contains(&c), "{c} left unescaped in {escaped}");
        }
    }

    #[test]
    fn to_plain_reverses_escape() {
        let original = "Hello @john_doe. (test) 1+1=2!";
        assert_eq!(to_plain(&escape(original)), original);
        assert_eq!(to_plain("*Welcome\\!*"), "Welcome!");
    }
}
