//! Character cursor over decoded input

use crate::error::Location;
use memchr::memchr;

/// Stateful reader over a text buffer
///
/// Tracks the previously consumed character, the current line number and
/// the start of the current and previous physical lines for diagnostics.
#[derive(Debug, Clone)]
pub struct CharacterCursor<'a> {
    text: &'a str,
    pos: usize,
    prev: Option<char>,
    line: usize,
    line_start: usize,
    prev_line_start: usize,
}

impl<'a> CharacterCursor<'a> {
    /// Create a cursor at the start of `text`
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            prev: None,
            line: 1,
            line_start: 0,
            prev_line_start: 0,
        }
    }

    /// Next character without consuming it
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Most recently consumed character
    #[must_use]
    pub const fn prev(&self) -> Option<char> {
        self.prev
    }

    /// Consume one character
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.prev = Some(c);
        if c == '\n' {
            self.line += 1;
            self.prev_line_start = self.line_start;
            self.line_start = self.pos;
        }
        Some(c)
    }

    /// Unconsumed remainder of the text
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Consume everything before `rest`, which must be a suffix of the remainder
    pub fn advance_to(&mut self, rest: &'a str) {
        let target = self.text.len() - rest.len().min(self.text.len());
        while self.pos < target {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Consume whitespace
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Whether all input is consumed
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Bytes consumed so far
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the text in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the text is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Current line number (1-indexed)
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line
    }

    /// The line the cursor is on
    #[must_use]
    pub fn current_line(&self) -> &'a str {
        let tail = &self.text[self.line_start..];
        let end = memchr(b'\n', tail.as_bytes()).unwrap_or(tail.len());
        tail[..end].trim_end_matches('\r')
    }

    /// The line before the current one, empty on the first line
    #[must_use]
    pub fn previous_line(&self) -> &'a str {
        if self.line == 1 {
            return "";
        }
        self.text[self.prev_line_start..self.line_start]
            .trim_end_matches('\n')
            .trim_end_matches('\r')
    }

    /// Line and column of the next character
    #[must_use]
    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.text[self.line_start..self.pos].chars().count() + 1,
        }
    }
}
