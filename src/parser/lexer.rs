//! Lexical analysis for BibTeX

use super::cursor::CharacterCursor;
use super::utils::{backtrack, PResult};
use memchr::memchr3;
use winnow::prelude::*;
use winnow::token::take_while;

/// Characters besides letters and digits allowed in keys and macro names
const EXTRA_ALPHANUMERIC: &str = "?'`-_:.+/$\\\"&";

/// Structural tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `@`, not consumed
    At,
    /// `{` or `(`
    BracketOpen,
    /// `}` or `)`
    BracketClose,
    /// `,`
    Comma,
    /// `=`
    Assign,
    /// `#`
    Doublecross,
    /// Start of a word, not consumed
    AlphaNumText,
    /// End of input
    EndOfFile,
    /// Anything else, not consumed
    Unknown,
}

/// How a value component was delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// `{...}` or `(...)`
    Braced,
    /// `"..."`
    Quoted,
    /// Bare word referring to a macro
    MacroKey,
}

/// One undecoded value component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawString {
    /// Text between the delimiters
    pub text: String,
    /// Delimiter kind
    pub kind: StringKind,
}

/// Skip whitespace and return the next token
///
/// Structural characters are consumed; `@`, words and unknown characters are not.
pub fn next_token(cursor: &mut CharacterCursor<'_>) -> Token {
    cursor.skip_whitespace();
    let token = match cursor.peek() {
        None => return Token::EndOfFile,
        Some('@') => return Token::At,
        Some('{' | '(') => Token::BracketOpen,
        Some('}' | ')') => Token::BracketClose,
        Some(',') => Token::Comma,
        Some('=') => Token::Assign,
        Some('#') => Token::Doublecross,
        Some(c) if c.is_alphanumeric() => return Token::AlphaNumText,
        Some(_) => return Token::Unknown,
    };
    cursor.bump();
    token
}

fn simple_string<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(0.., |c: char| {
        c.is_alphanumeric() || EXTRA_ALPHANUMERIC.contains(c)
    })
    .parse_next(input)
}

/// Read a key, type keyword or macro name after skipping whitespace
pub fn read_simple_string(cursor: &mut CharacterCursor<'_>) -> String {
    cursor.skip_whitespace();
    let mut rest = cursor.rest();
    let text = simple_string.parse_next(&mut rest).unwrap_or_default();
    cursor.advance_to(rest);
    text.to_string()
}

/// Read an entry identifier
///
/// Stops before a top-level `,`, the closing bracket or a line break. Braces
/// inside the identifier are balanced.
pub fn read_identifier(cursor: &mut CharacterCursor<'_>, close: char) -> String {
    cursor.skip_whitespace();
    let rest = cursor.rest();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '\n' | '\r' => {
                end = i;
                break;
            }
            ',' if depth == 0 => {
                end = i;
                break;
            }
            c if c == close && depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    cursor.advance_to(&rest[end..]);
    rest[..end].trim().to_string()
}

/// Content up to the bracket closing an already consumed `open`
fn balanced<'a>(open: u8, close: u8) -> impl Parser<&'a str, &'a str, winnow::error::ContextError> {
    move |input: &mut &'a str| {
        let bytes = input.as_bytes();
        let mut depth = 0usize;
        let mut pos = 0;
        while let Some(offset) = memchr3(open, close, b'\\', &bytes[pos..]) {
            pos += offset;
            match bytes[pos] {
                b'\\' => {
                    if pos + 2 > bytes.len() {
                        break;
                    }
                    pos += 2;
                    continue;
                }
                b if b == open => depth += 1,
                _ if depth == 0 => {
                    let content = &input[..pos];
                    *input = &input[pos + 1..];
                    return Ok(content);
                }
                _ => depth -= 1,
            }
            pos += 1;
        }
        backtrack()
    }
}

/// Read a `{...}` or `(...)` string with the cursor on the opening bracket
///
/// Only brackets of the opening kind are counted. Returns `None` and consumes
/// the remaining input when the bracket is never closed.
pub fn read_bracket_string(cursor: &mut CharacterCursor<'_>) -> Option<String> {
    let (open, close) = match cursor.bump()? {
        '(' => (b'(', b')'),
        _ => (b'{', b'}'),
    };
    let mut rest = cursor.rest();
    if let Ok(content) = balanced(open, close).parse_next(&mut rest) {
        cursor.advance_to(rest);
        Some(content.to_string())
    } else {
        cursor.advance_to("");
        None
    }
}

fn quoted<'a>(input: &mut &'a str) -> PResult<&'a str> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut brace_depth = 0usize;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' if pos + 1 < bytes.len() => {
                pos += 2;
                continue;
            }
            b'"' if brace_depth == 0 => {
                let content = &input[..pos];
                *input = &input[pos + 1..];
                return Ok(content);
            }
            b'{' => brace_depth += 1,
            b'}' if brace_depth > 0 => brace_depth -= 1,
            _ => {}
        }
        pos += 1;
    }
    backtrack()
}

/// Read a `"..."` string with the cursor on the opening quote
///
/// A quote inside braces does not terminate the string, and `{"}` is
/// unwrapped to a plain quote.
pub fn read_quoted_string(cursor: &mut CharacterCursor<'_>) -> Option<String> {
    cursor.bump()?;
    let mut rest = cursor.rest();
    if let Ok(content) = quoted(&mut rest) {
        cursor.advance_to(rest);
        Some(content.replace("{\"}", "\""))
    } else {
        cursor.advance_to("");
        None
    }
}

/// Read one value component
///
/// Returns `None` for an unterminated string.
pub fn read_string(cursor: &mut CharacterCursor<'_>) -> Option<RawString> {
    cursor.skip_whitespace();
    match cursor.peek() {
        Some('{' | '(') => read_bracket_string(cursor).map(|text| RawString {
            text,
            kind: StringKind::Braced,
        }),
        Some('"') => read_quoted_string(cursor).map(|text| RawString {
            text,
            kind: StringKind::Quoted,
        }),
        _ => Some(RawString {
            text: read_simple_string(cursor),
            kind: StringKind::MacroKey,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        let mut cursor = CharacterCursor::new(" @ { , = # } word %");
        assert_eq!(next_token(&mut cursor), Token::At);
        assert_eq!(cursor.peek(), Some('@'));
        cursor.bump();
        assert_eq!(next_token(&mut cursor), Token::BracketOpen);
        assert_eq!(next_token(&mut cursor), Token::Comma);
        assert_eq!(next_token(&mut cursor), Token::Assign);
        assert_eq!(next_token(&mut cursor), Token::Doublecross);
        assert_eq!(next_token(&mut cursor), Token::BracketClose);
        assert_eq!(next_token(&mut cursor), Token::AlphaNumText);
        assert_eq!(read_simple_string(&mut cursor), "word");
        assert_eq!(next_token(&mut cursor), Token::Unknown);
        assert_eq!(cursor.peek(), Some('%'));
        cursor.bump();
        assert_eq!(next_token(&mut cursor), Token::EndOfFile);
    }

    #[test]
    fn test_simple_string() {
        let mut cursor = CharacterCursor::new("  doi:10.1000/x-y = ");
        assert_eq!(read_simple_string(&mut cursor), "doi:10.1000/x-y");
        assert_eq!(cursor.rest(), " = ");
    }

    #[test]
    fn test_identifier() {
        let mut cursor = CharacterCursor::new("M{\\\"u}ller2000, title");
        assert_eq!(read_identifier(&mut cursor, '}'), "M{\\\"u}ller2000");
        assert_eq!(cursor.peek(), Some(','));

        let mut cursor = CharacterCursor::new("lonely}");
        assert_eq!(read_identifier(&mut cursor, '}'), "lonely");
        assert_eq!(cursor.peek(), Some('}'));

        let mut cursor = CharacterCursor::new(" key )");
        assert_eq!(read_identifier(&mut cursor, ')'), "key");
    }

    #[test]
    fn test_bracket_string() {
        let mut cursor = CharacterCursor::new("{hello {nested {braces}} \\} world} xxx");
        assert_eq!(
            read_bracket_string(&mut cursor).as_deref(),
            Some("hello {nested {braces}} \\} world")
        );
        assert_eq!(cursor.rest(), " xxx");

        let mut cursor = CharacterCursor::new("(a (b) {c} d) rest");
        assert_eq!(read_bracket_string(&mut cursor).as_deref(), Some("a (b) {c} d"));

        let mut cursor = CharacterCursor::new("{never closed");
        assert_eq!(read_bracket_string(&mut cursor), None);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_quoted_string() {
        let mut cursor = CharacterCursor::new(r#""hello \"world\"" xxx"#);
        assert_eq!(
            read_quoted_string(&mut cursor).as_deref(),
            Some(r#"hello \"world\""#)
        );
        assert_eq!(cursor.rest(), " xxx");

        let mut cursor = CharacterCursor::new(r#""say {"}hi{"} and {x"y}" ,"#);
        assert_eq!(
            read_quoted_string(&mut cursor).as_deref(),
            Some(r#"say "hi" and {x"y}"#)
        );

        let mut cursor = CharacterCursor::new("\"open");
        assert_eq!(read_quoted_string(&mut cursor), None);
    }

    #[test]
    fn test_read_string_kinds() {
        let mut cursor = CharacterCursor::new(" {a} # \"b\" # jan");
        assert_eq!(read_string(&mut cursor).map(|s| s.kind), Some(StringKind::Braced));
        assert_eq!(next_token(&mut cursor), Token::Doublecross);
        assert_eq!(read_string(&mut cursor).map(|s| s.kind), Some(StringKind::Quoted));
        assert_eq!(next_token(&mut cursor), Token::Doublecross);
        let macro_key = read_string(&mut cursor).unwrap();
        assert_eq!(macro_key.kind, StringKind::MacroKey);
        assert_eq!(macro_key.text, "jan");
    }
}
