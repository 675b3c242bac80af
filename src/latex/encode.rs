//! Unicode to LaTeX encoding

use super::tables::{
    CharacterCommand, CHARACTER_COMMANDS, DOTLESS_CHARACTERS, ESCAPED_CHARACTERS, MATH_COMMANDS,
    PROTECTED_SYMBOLS, PROTECTED_TEXT_ONLY_SYMBOLS, SYMBOL_SEQUENCES, THIN_SPACE,
};
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

/// Encode non-ASCII characters of `text` as LaTeX escapes
///
/// Characters without any known escape are passed through unchanged.
#[must_use]
pub fn encode(text: &str) -> String {
    let input: Vec<char> = text.nfc().collect();
    let mut output = String::with_capacity(input.len() + input.len() / 4);
    let mut in_math = false;
    let mut i = 0;

    while i < input.len() {
        let c = input[i];

        if input[i..].starts_with(&['\\', 'u', 'r', 'l', '{']) {
            i = copy_verbatim_argument(&input, i, &mut output);
            continue;
        }

        if c.is_ascii() {
            let escaped = i > 0 && input[i - 1] == '\\';
            if c == '$' && !escaped {
                in_math = !in_math;
                output.push(c);
            } else if !escaped
                && (PROTECTED_SYMBOLS.contains(&c)
                    || (!in_math && PROTECTED_TEXT_ONLY_SYMBOLS.contains(&c)))
            {
                output.push('\\');
                output.push(c);
            } else {
                output.push(c);
            }
            i += 1;
            continue;
        }

        encode_char(c, in_math, &mut output);
        i += 1;
    }

    output
}

fn copy_verbatim_argument(input: &[char], start: usize, output: &mut String) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < input.len() {
        let c = input[i];
        let escaped = i > 0 && input[i - 1] == '\\';
        output.push(c);
        i += 1;
        if c == '{' && !escaped {
            depth += 1;
        } else if c == '}' && !escaped {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                break;
            }
        }
    }
    i
}

fn find_encodable(table: &'static [CharacterCommand], c: char) -> Option<&'static str> {
    table
        .iter()
        .find(|cmd| cmd.direction.encodes() && cmd.unicode == c)
        .map(|cmd| cmd.command)
}

fn encode_char(c: char, in_math: bool, output: &mut String) {
    if let Some(dotless) = DOTLESS_CHARACTERS
        .iter()
        .find(|d| d.direction.encodes() && d.unicode == c)
    {
        output.push_str(&format!("\\{}{{\\{}}}", dotless.modifier, dotless.letter));
        return;
    }

    if let Some(sequence) = find_encodable(SYMBOL_SEQUENCES, c) {
        output.push_str(sequence);
        return;
    }

    if let Some(command) = find_encodable(CHARACTER_COMMANDS, c) {
        output.push_str(&format!("{{\\{command}}}"));
        return;
    }

    if let Some(escaped) = ESCAPED_CHARACTERS
        .iter()
        .find(|e| e.direction.encodes() && e.unicode == c)
    {
        output.push_str(&format!("\\{}{{{}}}", escaped.modifier, escaped.letter));
        return;
    }

    if let Some(command) = find_encodable(MATH_COMMANDS, c) {
        if in_math {
            output.push_str(&format!("\\{command}{{}}"));
        } else {
            output.push_str(&format!("\\ensuremath{{\\{command}}}"));
        }
        return;
    }

    if c == THIN_SPACE {
        output.push_str("\\,");
        return;
    }

    warn!(character = %c, codepoint = %format!("U+{:04X}", u32::from(c)), "No LaTeX escape known, keeping character");
    output.push(c);
}

/// Encode to LaTeX, then transliterate whatever is still non-ASCII
#[must_use]
pub fn encode_to_ascii(text: &str) -> String {
    let encoded = encode(text);
    if encoded.is_ascii() {
        encoded
    } else {
        to_plain_ascii(&encoded)
    }
}

/// Transliterate to plain ASCII: strip diacritics, `?` for the rest
#[must_use]
pub fn to_plain_ascii(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.nfkd() {
        if c.is_ascii() {
            result.push(c);
            continue;
        }
        if unicode_normalization::char::is_combining_mark(c) {
            continue;
        }
        match c {
            'ß' => result.push_str("ss"),
            'æ' => result.push_str("ae"),
            'Æ' => result.push_str("AE"),
            'œ' => result.push_str("oe"),
            'Œ' => result.push_str("OE"),
            'ø' => result.push('o'),
            'Ø' => result.push('O'),
            'ł' => result.push('l'),
            'Ł' => result.push('L'),
            'đ' | 'ð' => result.push('d'),
            'Đ' | 'Ð' => result.push('D'),
            'þ' => result.push_str("th"),
            'Þ' => result.push_str("TH"),
            'ı' => result.push('i'),
            _ => result.push('?'),
        }
    }
    result
}

/// Whether `text` is pure ASCII after canonical composition
#[must_use]
pub fn contains_only_ascii(text: &str) -> bool {
    text.nfc().all(|c| c.is_ascii())
}
