//! LaTeX to Unicode decoding automaton

use super::tables::{
    character_command, dotless_character, math_command, DECODE_SYMBOL_SEQUENCES, LOOKUP_TABLE,
    THIN_SPACE,
};
use tracing::debug;

/// Spaces tolerated between an accent modifier and its letter, as in `{\H o}`
const MAX_SPACES_AFTER_MODIFIER: usize = 16;

const ENSUREMATH_OPEN: &str = "\\ensuremath{";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathKind {
    Dollar,
    EnsureMath,
}

#[derive(Debug, Clone, Copy)]
struct MathSpan {
    kind: MathKind,
    /// Brace depth right after the span's opening brace
    depth: usize,
    /// Output length before the span was opened
    output_start: usize,
}

/// Decode LaTeX escapes in `text` into Unicode
///
/// Never fails: unknown commands and malformed escapes are copied as they are.
#[must_use]
pub fn decode(text: &str) -> String {
    if !text.chars().any(needs_decoding) {
        return text.to_string();
    }
    let mut decoder = Decoder::new(text);
    decoder.run();
    decoder.output
}

fn needs_decoding(c: char) -> bool {
    matches!(
        c,
        '\\' | '{' | '}' | '$' | '-' | '`' | '\'' | '!' | '?' | '"'
    )
}

const fn is_base(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

const fn is_delimiter_after_letter(c: Option<char>) -> bool {
    matches!(
        c,
        None | Some('}' | '{' | ' ' | '\t' | '\\' | '\r' | '\n')
    )
}

struct Decoder {
    input: Vec<char>,
    output: String,
    math: Vec<MathSpan>,
    depth: usize,
}

impl Decoder {
    fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            output: String::with_capacity(text.len()),
            math: Vec::new(),
            depth: 0,
        }
    }

    fn at(&self, i: usize) -> Option<char> {
        self.input.get(i).copied()
    }

    fn in_math(&self) -> bool {
        !self.math.is_empty()
    }

    fn starts_with_at(&self, i: usize, pattern: &str) -> bool {
        let mut k = i;
        for p in pattern.chars() {
            if self.at(k) != Some(p) {
                return false;
            }
            k += 1;
        }
        true
    }

    fn alpha_run(&self, from: usize) -> String {
        self.input[from.min(self.input.len())..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect()
    }

    fn run(&mut self) {
        let mut i = 0;
        while i < self.input.len() {
            if self.starts_with_at(i, "\\url{") {
                i = self.copy_verbatim_argument(i);
                continue;
            }
            let c = self.input[i];
            i = match c {
                '{' => self.open_brace(i),
                '}' => self.close_brace(i),
                '\\' if i + 1 < self.input.len() => self.backslash(i),
                '$' => {
                    if matches!(self.math.last(), Some(span) if span.kind == MathKind::Dollar) {
                        self.math.pop();
                    } else {
                        self.math.push(MathSpan {
                            kind: MathKind::Dollar,
                            depth: self.depth,
                            output_start: self.output.len(),
                        });
                    }
                    self.output.push('$');
                    i + 1
                }
                _ => self.plain(i),
            };
        }
    }

    /// Copy `\url{...}` unchanged, counting unescaped braces
    fn copy_verbatim_argument(&mut self, start: usize) -> usize {
        let mut i = start + "\\url{".len();
        self.output.push_str("\\url{");
        let mut depth = 1usize;
        while let Some(c) = self.at(i) {
            let escaped = i > 0 && self.input[i - 1] == '\\';
            if c == '{' && !escaped {
                depth += 1;
            } else if c == '}' && !escaped {
                depth -= 1;
            }
            self.output.push(c);
            i += 1;
            if depth == 0 {
                break;
            }
        }
        i
    }

    fn plain(&mut self, i: usize) -> usize {
        if !self.in_math() {
            for (sequence, unicode) in DECODE_SYMBOL_SEQUENCES.iter() {
                if self.input[i..].starts_with(sequence) {
                    self.output.push(*unicode);
                    return i + sequence.len();
                }
            }
        }
        self.output.push(self.input[i]);
        i + 1
    }

    fn open_brace(&mut self, i: usize) -> usize {
        if self.at(i + 1) == Some('\\') {
            if let Some(next) = self.braced_accent(i) {
                return next;
            }
            let command = self.alpha_run(i + 2);
            let after = i + 2 + command.len();
            if !command.is_empty() && self.at(after) == Some('}') {
                if let Some(unicode) = character_command(&command) {
                    self.output.push(unicode);
                    return after + 1;
                }
                if let Some(unicode) = math_command(&command) {
                    self.output.push(unicode);
                    return after + 1;
                }
            }
        }
        self.depth += 1;
        self.output.push('{');
        i + 1
    }

    /// `{\Xc}`, `{\X c}`, `{\X\i}`, `{\X{c}}` and `{\X{\i}}`
    fn braced_accent(&mut self, i: usize) -> Option<usize> {
        let modifier = self.at(i + 2)?;
        if !LOOKUP_TABLE.is_modifier(modifier) {
            return None;
        }

        let mut spaces = 0;
        while spaces < MAX_SPACES_AFTER_MODIFIER && self.at(i + 3 + spaces) == Some(' ') {
            spaces += 1;
        }
        if let (Some(letter), Some('}')) = (self.at(i + 3 + spaces), self.at(i + 4 + spaces)) {
            if let Some(unicode) = accented(modifier, letter) {
                self.output.push(unicode);
                return Some(i + 5 + spaces);
            }
        }

        if self.at(i + 3) == Some('\\') && self.at(i + 5) == Some('}') {
            if let Some(unicode) = self.at(i + 4).and_then(|l| dotless(modifier, l)) {
                self.output.push(unicode);
                return Some(i + 6);
            }
        }

        if self.at(i + 3) == Some('{') && self.at(i + 5) == Some('}') && self.at(i + 6) == Some('}') {
            if let Some(unicode) = self.at(i + 4).and_then(|l| accented(modifier, l)) {
                self.output.push(unicode);
                return Some(i + 7);
            }
        }

        if self.at(i + 3) == Some('{')
            && self.at(i + 4) == Some('\\')
            && self.at(i + 6) == Some('}')
            && self.at(i + 7) == Some('}')
        {
            if let Some(unicode) = self.at(i + 5).and_then(|l| dotless(modifier, l)) {
                self.output.push(unicode);
                return Some(i + 8);
            }
        }

        None
    }

    fn close_brace(&mut self, i: usize) -> usize {
        let closing = self
            .math
            .iter()
            .rposition(|span| span.kind == MathKind::EnsureMath && span.depth == self.depth);
        match closing.map(|index| (index, self.math[index])) {
            Some((index, span)) => {
                // a `$` left open inside the wrapper ends with it
                self.math.truncate(index);
                let content_start = span.output_start + ENSUREMATH_OPEN.len();
                if self.output[content_start..].contains('\\') {
                    self.output.push('}');
                } else {
                    let content = self.output.split_off(content_start);
                    self.output.truncate(span.output_start);
                    self.output.push_str(&content);
                }
            }
            None => self.output.push('}'),
        }
        self.depth = self.depth.saturating_sub(1);
        i + 1
    }

    fn backslash(&mut self, i: usize) -> usize {
        let next = self.input[i + 1];
        if matches!(next, '\\' | '{' | '}' | '$' | ' ') {
            self.output.push('\\');
            self.output.push(next);
            return i + 2;
        }

        if let Some(after) = self.bare_accent(i) {
            return after;
        }

        let command = self.alpha_run(i + 1);
        if !command.is_empty() {
            let after = i + 1 + command.len();
            if let Some(unicode) = character_command(&command) {
                self.output.push(unicode);
                return self.skip_command_terminator(after);
            }
            if self.in_math() {
                if let Some(unicode) = math_command(&command) {
                    self.output.push(unicode);
                    return self.skip_command_terminator(after);
                }
            }
            if command == "ensuremath" && self.at(after) == Some('{') {
                self.depth += 1;
                self.math.push(MathSpan {
                    kind: MathKind::EnsureMath,
                    depth: self.depth,
                    output_start: self.output.len(),
                });
                self.output.push_str(ENSUREMATH_OPEN);
                return after + 1;
            }
            debug!(command = %command, "Keeping unknown LaTeX command");
            self.output.push('\\');
            self.output.push_str(&command);
            return after;
        }

        match next {
            '&' | '#' | '%' => self.output.push(next),
            '_' if !self.in_math() => self.output.push('_'),
            ',' => self.output.push(THIN_SPACE),
            _ => {
                debug!(escape = %next, "Keeping unknown LaTeX escape");
                self.output.push('\\');
                self.output.push(next);
            }
        }
        i + 2
    }

    /// Accent escapes outside braces: `\"o`, `\v s`, `\"{o}`, `\'\i`, `\'{\i}`
    fn bare_accent(&mut self, i: usize) -> Option<usize> {
        let modifier = self.at(i + 1)?;
        if !LOOKUP_TABLE.is_modifier(modifier) {
            return None;
        }

        // Letter glued to a symbolic modifier, as in Kr\"uger, or at the very end
        if let Some(letter) = self.at(i + 2) {
            if is_base(letter) && (!modifier.is_ascii_alphabetic() || i + 3 == self.input.len()) {
                if let Some(unicode) = accented(modifier, letter) {
                    self.output.push(unicode);
                    return Some(self.skip_empty_group(i + 3));
                }
            }
        }

        let mut spaces = 0;
        while spaces < MAX_SPACES_AFTER_MODIFIER && self.at(i + 2 + spaces) == Some(' ') {
            spaces += 1;
        }
        if let Some(letter) = self.at(i + 2 + spaces) {
            if is_base(letter) && is_delimiter_after_letter(self.at(i + 3 + spaces)) {
                if let Some(unicode) = accented(modifier, letter) {
                    self.output.push(unicode);
                    let after = i + 3 + spaces;
                    return Some(match self.at(after) {
                        Some(' ' | '\t' | '\r' | '\n') => after + 1,
                        _ => self.skip_empty_group(after),
                    });
                }
            }
        }

        if self.at(i + 2) == Some('{') && self.at(i + 4) == Some('}') {
            if let Some(unicode) = self.at(i + 3).and_then(|l| accented(modifier, l)) {
                self.output.push(unicode);
                return Some(i + 5);
            }
        }

        if self.at(i + 2) == Some('\\')
            && !self.at(i + 4).is_some_and(|c| c.is_ascii_alphabetic())
        {
            if let Some(unicode) = self.at(i + 3).and_then(|l| dotless(modifier, l)) {
                self.output.push(unicode);
                return Some(self.skip_command_terminator(i + 4));
            }
        }

        if self.at(i + 2) == Some('{') && self.at(i + 3) == Some('\\') && self.at(i + 5) == Some('}') {
            if let Some(unicode) = self.at(i + 4).and_then(|l| dotless(modifier, l)) {
                self.output.push(unicode);
                return Some(i + 6);
            }
        }

        None
    }

    fn skip_empty_group(&self, i: usize) -> usize {
        if self.at(i) == Some('{') && self.at(i + 1) == Some('}') {
            i + 2
        } else {
            i
        }
    }

    /// A control word swallows one following space or an empty `{}`
    fn skip_command_terminator(&self, i: usize) -> usize {
        match self.at(i) {
            Some(' ' | '\r' | '\n') => i + 1,
            _ => self.skip_empty_group(i),
        }
    }
}

/// Accent lookup that only counts as a match for non-ASCII results
fn accented(modifier: char, letter: char) -> Option<char> {
    if !is_base(letter) {
        return None;
    }
    LOOKUP_TABLE
        .lookup(modifier, letter)
        .filter(|c| u32::from(*c) >= 128)
}

fn dotless(modifier: char, letter: char) -> Option<char> {
    dotless_character(modifier, letter).filter(|c| u32::from(*c) >= 128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(decode("Hello World 123"), "Hello World 123");
        assert_eq!(decode(""), "");
    }

    #[test]
    fn test_accents() {
        assert_eq!(decode("Kr\\\"uger"), "Krüger");
        assert_eq!(decode("{\\\"a}"), "ä");
        assert_eq!(decode("\\\"{o}"), "ö");
        assert_eq!(decode("{\\\"{o}}"), "ö");
        assert_eq!(decode("Fran{\\c{c}}ois"), "François");
        assert_eq!(decode("\\v{S}koda"), "Škoda");
        assert_eq!(decode("Erd{\\H o}s"), "Erdős");
        assert_eq!(decode("Erd\\H{o}s"), "Erdős");
    }

    #[test]
    fn test_dotless() {
        assert_eq!(decode("\\'{\\i}"), "í");
        assert_eq!(decode("{\\'\\i}"), "í");
        assert_eq!(decode("{\\'{\\i}}"), "í");
        assert_eq!(decode("Mart\\'\\i nez"), "Martínez");
    }

    #[test]
    fn test_character_commands() {
        assert_eq!(decode("{\\AA}ngstr{\\\"o}m"), "Ångström");
        assert_eq!(decode("Stra{\\ss}e"), "Straße");
        assert_eq!(decode("\\ss"), "ß");
        assert_eq!(decode("{\\rq}"), "\u{2019}");
        assert_eq!(decode("{\\dh}"), "ð");
        assert_eq!(decode("\\th"), "þ");
        assert_eq!(decode("\\o{}rsted"), "ørsted");
    }

    #[test]
    fn test_math() {
        assert_eq!(decode("{\\mu}"), "μ");
        assert_eq!(decode("$\\alpha$"), "$α$");
        assert_eq!(decode("\\ensuremath{\\alpha}"), "α");
        assert_eq!(decode("\\alpha"), "\\alpha");
    }

    #[test]
    fn test_unclosed_dollar_inside_ensuremath() {
        assert_eq!(decode("\\ensuremath{$x} \\alpha"), "$x \\alpha");
        assert_eq!(decode("\\ensuremath{\\alpha$} \\beta"), "α$ \\beta");
    }

    #[test]
    fn test_protected_symbols() {
        assert_eq!(decode("A \\& B"), "A & B");
        assert_eq!(decode("50\\%"), "50%");
        assert_eq!(decode("snake\\_case"), "snake_case");
        assert_eq!(decode("$a\\_b$"), "$a\\_b$");
        assert_eq!(decode("1\\,000"), "1\u{2009}000");
    }

    #[test]
    fn test_symbol_sequences() {
        assert_eq!(decode("pages 1--2"), "pages 1\u{2013}2");
        assert_eq!(decode("a---b"), "a\u{2014}b");
        assert_eq!(decode("``quoted''"), "\u{201C}quoted\u{201D}");
        assert_eq!(decode("first"), "first");
        assert_eq!(decode("$1--2$"), "$1--2$");
    }

    #[test]
    fn test_unknown_preserved() {
        assert_eq!(decode("\\textbf{Bold}"), "\\textbf{Bold}");
        assert_eq!(decode("\\\"x"), "\\\"x");
        assert_eq!(decode("{\\em text}"), "{\\em text}");
    }

    #[test]
    fn test_url_verbatim() {
        assert_eq!(
            decode("\\url{http://x.org/a--b_{c}}"),
            "\\url{http://x.org/a--b_{c}}"
        );
    }

    #[test]
    fn test_braces_kept() {
        assert_eq!(decode("{Protected} Title"), "{Protected} Title");
    }
}
