//! Element readers: entries, macros, preambles and comments

use super::cursor::CharacterCursor;
use super::lexer::{self, Token};
use super::utils::{looks_like_element_start, tag_no_case};
use super::{BibTeXParser, Step};
use crate::error::{Location, Severity};
use crate::latex;
use crate::model::{Comment, CommentContext, Element, Entry, Macro, Preamble, Value};
use memchr::{memchr, memchr2};
use tracing::debug;
use winnow::prelude::*;

/// Comments starting with this marker are internal bookkeeping and are dropped
const INTERNAL_COMMENT_MARKER: &str = "x-kbibtex";

/// Identifier given to entries and macros without one
const EMPTY_ID: &str = "EmptyId";

/// Leading run of `%`, spaces and tabs of a comment line
fn comment_marker(line: &str) -> &str {
    let end = line
        .find(|c: char| !matches!(c, '%' | ' ' | '\t'))
        .unwrap_or(line.len());
    &line[..end]
}

/// Longest prefix shared by the markers of all lines
fn common_prefix<'a>(lines: &[&'a str]) -> &'a str {
    let Some(&first) = lines.first() else {
        return "";
    };
    let mut prefix = comment_marker(first);
    for &line in &lines[1..] {
        let marker = comment_marker(line);
        let len = prefix
            .bytes()
            .zip(marker.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        prefix = &prefix[..len];
    }
    prefix
}

/// Byte length of free text before a blank line or the start of an element
fn verbatim_comment_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut pos = 0;
    while let Some(offset) = memchr2(b'@', b'\n', &bytes[pos..]) {
        let p = pos + offset;
        if bytes[p] == b'@' {
            if looks_like_element_start(&rest[p..]) {
                return p;
            }
        } else {
            let line_end = memchr(b'\n', &bytes[p + 1..]).map_or(bytes.len(), |o| p + 1 + o);
            if rest[p + 1..line_end].trim().is_empty() {
                return p;
            }
        }
        pos = p + 1;
    }
    bytes.len()
}

impl BibTeXParser<'_, '_> {
    /// Read the next top-level element
    pub(super) fn next_element(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => Step::End,
            Some('@') => {
                cursor.bump();
                self.read_element(cursor)
            }
            Some('%') => self.read_prefix_comment(cursor),
            Some(_) => self.read_verbatim_comment(cursor),
        }
    }

    fn read_element(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        let location = cursor.location();
        let keyword = lexer::read_simple_string(cursor);
        match keyword.to_lowercase().as_str() {
            "" => {
                self.report(location, Severity::Warning, "Element type is empty");
                Step::Dropped
            }
            "comment" => self.read_command_comment(cursor),
            "string" => self.read_macro(cursor),
            "preamble" => self.read_preamble(cursor),
            "import" => {
                debug!("Skipping @import");
                Step::Dropped
            }
            _ => self.read_entry(cursor, &keyword),
        }
    }

    /// Consume the opening bracket after an element keyword
    fn open_element(&mut self, cursor: &mut CharacterCursor<'_>, keyword: &str) -> Option<char> {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('{') => {
                cursor.bump();
                Some('}')
            }
            Some('(') => {
                cursor.bump();
                Some(')')
            }
            _ => {
                self.structural_error(
                    cursor,
                    format!("Opening bracket expected after \"@{keyword}\""),
                );
                None
            }
        }
    }

    /// Replace non-ASCII characters in a key or identifier
    fn ascii_key(&mut self, location: Location, what: &str, key: String) -> String {
        if key.is_ascii() {
            return key;
        }
        let ascii = latex::to_plain_ascii(&key);
        self.report(
            location,
            Severity::Warning,
            format!("{what} \"{key}\" contains non-ASCII characters, using \"{ascii}\""),
        );
        ascii
    }

    /// Make an entry id or macro key unique among those read so far
    fn unique_id(&mut self, location: Location, id: String) -> String {
        if self.known_ids.insert(id.to_lowercase()) {
            return id;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{id}-{n}");
            if self.known_ids.insert(candidate.to_lowercase()) {
                self.report(
                    location,
                    Severity::Warning,
                    format!("Duplicate id \"{id}\" renamed to \"{candidate}\""),
                );
                return candidate;
            }
            n += 1;
        }
    }

    fn read_entry(&mut self, cursor: &mut CharacterCursor<'_>, keyword: &str) -> Step {
        let Some(close) = self.open_element(cursor, keyword) else {
            return Step::Dropped;
        };

        let location = cursor.location();
        let mut id = lexer::read_identifier(cursor, close);
        if id.contains(['\\', '{', '}']) {
            let decoded: String = latex::decode(&id)
                .chars()
                .filter(|c| !matches!(c, '{' | '}'))
                .collect();
            self.report(
                location,
                Severity::Warning,
                format!("Entry id \"{id}\" contains LaTeX markup, using \"{decoded}\""),
            );
            id = decoded;
        }
        let mut id = self.ascii_key(location, "Entry id", id);
        if id.is_empty() {
            self.report(location, Severity::Warning, "Entry has no id");
            id = EMPTY_ID.to_string();
        }
        let id = self.unique_id(location, id);
        let casing = self.options.keyword_casing;
        let mut entry = Entry::new(casing.entry_type(keyword), id);

        let mut token = lexer::next_token(cursor);
        loop {
            match token {
                Token::BracketClose => break,
                Token::Comma => {}
                Token::EndOfFile => {
                    self.structural_error(cursor, format!("Entry \"{}\" is not closed", entry.id));
                    return Step::Dropped;
                }
                _ => {
                    self.structural_error(
                        cursor,
                        format!("Comma or closing bracket expected in entry \"{}\"", entry.id),
                    );
                    return Step::Dropped;
                }
            }

            let location = cursor.location();
            let key = lexer::read_simple_string(cursor);
            if key.is_empty() {
                if lexer::next_token(cursor) == Token::BracketClose {
                    debug!(id = %entry.id, "Trailing comma in entry");
                    break;
                }
                self.structural_error(
                    cursor,
                    format!("Field name expected in entry \"{}\"", entry.id),
                );
                return Step::Dropped;
            }
            let key = self.ascii_key(location, "Field name", casing.field_name(&key));
            if lexer::next_token(cursor) != Token::Assign {
                self.structural_error(
                    cursor,
                    format!("Assignment expected after field \"{key}\" in entry \"{}\"", entry.id),
                );
                return Step::Dropped;
            }

            let lower = key.to_lowercase();
            let appendable = lower == "keywords" || lower == "url" || self.is_person_field(&lower);
            let name = if entry.contains(&key) && !appendable {
                let mut n = 2;
                let mut renamed = format!("{key}{n}");
                while entry.contains(&renamed) {
                    n += 1;
                    renamed = format!("{key}{n}");
                }
                self.report(
                    location,
                    Severity::Warning,
                    format!("Duplicate field \"{key}\" in entry \"{}\" renamed to \"{renamed}\"", entry.id),
                );
                renamed
            } else {
                key
            };
            let mut value = entry.get_mut(&name).map(std::mem::take).unwrap_or_default();

            let Some(next) = self.read_field_value(cursor, &name, &mut value) else {
                return Step::Dropped;
            };
            entry.insert(name, value);
            token = next;
        }

        Step::Element(Element::Entry(entry))
    }

    fn read_macro(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        if self.open_element(cursor, "string").is_none() {
            return Step::Dropped;
        }
        let location = cursor.location();
        let mut key = self.ascii_key(location, "Macro key", lexer::read_simple_string(cursor));
        if key.is_empty() {
            self.report(location, Severity::Warning, "Macro has no key");
            key = EMPTY_ID.to_string();
        }
        let key = self.unique_id(location, key);
        if lexer::next_token(cursor) != Token::Assign {
            self.structural_error(cursor, format!("Assignment expected after macro \"{key}\""));
            return Step::Dropped;
        }

        let mut value = Value::new();
        let Some(token) = self.read_plain_value(cursor, true, &mut value) else {
            return Step::Dropped;
        };
        if token != Token::BracketClose {
            self.report(
                cursor.location(),
                Severity::Warning,
                format!("Closing bracket expected after macro \"{key}\""),
            );
        }
        Step::Element(Element::Macro(Macro { key, value }))
    }

    fn read_preamble(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        if self.open_element(cursor, "preamble").is_none() {
            return Step::Dropped;
        }
        let mut value = Value::new();
        let Some(token) = self.read_plain_value(cursor, false, &mut value) else {
            return Step::Dropped;
        };
        if token != Token::BracketClose {
            self.report(
                cursor.location(),
                Severity::Warning,
                "Closing bracket expected after preamble",
            );
        }
        Step::Element(Element::Preamble(Preamble { value }))
    }

    fn read_command_comment(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        cursor.skip_whitespace();
        let location = cursor.location();
        if !matches!(cursor.peek(), Some('{' | '(')) {
            self.structural_error(cursor, "Opening bracket expected after \"@comment\"");
            return Step::Dropped;
        }
        let Some(text) = lexer::read_bracket_string(cursor) else {
            self.structural_error(cursor, "Comment is not terminated");
            return Step::Dropped;
        };
        self.comment(location, latex::decode(text.trim()), CommentContext::Command, "")
    }

    /// Consecutive lines starting with `%` become one comment
    fn read_prefix_comment(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        let location = cursor.location();
        let rest = cursor.rest();
        let mut consumed = 0;
        let mut lines = Vec::new();
        for line in rest.split_inclusive('\n') {
            let content = line.trim();
            if !content.starts_with('%') {
                break;
            }
            lines.push(content);
            consumed += line.len();
        }
        cursor.advance_to(&rest[consumed..]);

        let prefix = common_prefix(&lines);
        let text = lines
            .iter()
            .map(|line| &line[prefix.len()..])
            .collect::<Vec<_>>()
            .join("\n");
        self.comment(location, latex::decode(&text), CommentContext::Prefix, prefix)
    }

    /// Free text up to a blank line or the next element
    fn read_verbatim_comment(&mut self, cursor: &mut CharacterCursor<'_>) -> Step {
        let location = cursor.location();
        let rest = cursor.rest();
        let len = verbatim_comment_len(rest);
        cursor.advance_to(&rest[len..]);
        self.comment(
            location,
            latex::decode(rest[..len].trim()),
            CommentContext::Verbatim,
            "",
        )
    }

    fn comment(
        &mut self,
        location: Location,
        text: String,
        context: CommentContext,
        prefix: &str,
    ) -> Step {
        let mut head = text.trim_start();
        if tag_no_case(INTERNAL_COMMENT_MARKER)
            .parse_next(&mut head)
            .is_ok()
        {
            self.report(
                location,
                Severity::Warning,
                "Dropping comment with internal x-kbibtex marker",
            );
            return Step::Skipped;
        }
        self.stats.record_comment(context, prefix);
        let comment = match context {
            CommentContext::Prefix => Comment::with_prefix(text, prefix),
            _ => Comment::new(text, context),
        };
        Step::Element(Element::Comment(comment))
    }
}
