//! Field value reading and field-specific interpretation

use super::cursor::CharacterCursor;
use super::lexer::{self, RawString, StringKind, Token};
use super::BibTeXParser;
use crate::error::{Location, Severity};
use crate::latex;
use crate::model::{Value, ValueItem};
use crate::names;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PAGE_RANGE: Regex = Regex::new(r"\s*(?:--?|\x{2013})\s*").unwrap();
    static ref LIST_SEPARATOR: Regex = Regex::new(r"[;]\s*").unwrap();
    static ref ATTACHMENT: Regex = Regex::new(r"^([^:]*):(.*):([A-Za-z0-9]+)$").unwrap();
    static ref MONTH_ABBREVIATION: Regex = Regex::new(r"(?i)^[a-z]{3}").unwrap();
    static ref DOI: Regex = Regex::new(r"(?i)10([.][0-9]+)+/[/-a-z0-9.()<>_:;\\]+").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"[ \n\r\t]+").unwrap();
    static ref KEYWORD_SEPARATORS: Vec<(char, Regex)> = ['\n', ';', ',']
        .into_iter()
        .map(|sep| {
            let pattern = format!(r"\s*{}\s*", regex::escape(&sep.to_string()));
            (sep, Regex::new(&pattern).unwrap())
        })
        .collect();
}

/// Collapse whitespace runs to one space and drop leading whitespace
///
/// A trailing whitespace run is kept as a single space so that `#`-joined
/// components keep their separation.
#[must_use]
pub fn bibtex_aware_simplify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.trim_start().chars() {
        if c.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space {
                result.push(' ');
                pending_space = false;
            }
            result.push(c);
        }
    }
    if pending_space {
        result.push(' ');
    }
    result
}

/// Split a keyword list at the first separator found among newline, `;`, `,`
///
/// Returns the keywords and the separator that was used.
#[must_use]
pub fn split_keywords(text: &str) -> (Vec<String>, Option<char>) {
    for (sep, pattern) in KEYWORD_SEPARATORS.iter() {
        if text.contains(*sep) {
            let keywords = pattern
                .split(text)
                .map(|k| WHITESPACE_RUN.replace_all(k.trim(), " ").into_owned())
                .filter(|k| !k.is_empty())
                .collect();
            return (keywords, Some(*sep));
        }
    }
    let keyword = text.trim();
    if keyword.is_empty() {
        (Vec::new(), None)
    } else {
        (vec![keyword.to_string()], None)
    }
}

/// Fields whose whitespace is preserved
fn keeps_formatting(key: &str) -> bool {
    key == "abstract"
        || (key.starts_with("url") && !key.starts_with("urldate"))
        || key.starts_with("localfile")
        || key.starts_with("file")
}

fn is_link_field(key: &str) -> bool {
    (key.starts_with("url") && !key.starts_with("urldate"))
        || key.starts_with("localfile")
        || key == "ee"
        || key == "biburl"
}

/// Path of a `description:path:type` attachment, as written by JabRef or Mendeley
fn attachment_path(raw: &str) -> String {
    let raw = raw.trim();
    let Some(captures) = ATTACHMENT.captures(raw) else {
        return raw.to_string();
    };
    let path = captures[2].replace("$\\backslash$", "");
    if path.starts_with("home/") || path.starts_with("Users/") {
        format!("/{path}")
    } else {
        path
    }
}

fn push_text(value: &mut Value, item: fn(String) -> ValueItem, text: impl Into<String>) {
    let text = text.into();
    if !text.is_empty() {
        value.push(item(text));
    }
}

impl BibTeXParser<'_, '_> {
    /// Read one value component and count its delimiter
    fn read_component(&mut self, cursor: &mut CharacterCursor<'_>) -> Option<RawString> {
        let raw = lexer::read_string(cursor)?;
        match raw.kind {
            StringKind::Braced => self.stats.curly_brackets += 1,
            StringKind::Quoted => self.stats.quotation_marks += 1,
            StringKind::MacroKey => {}
        }
        Some(raw)
    }

    /// Read the `#`-joined components of a field value
    ///
    /// Returns the token following the value, or `None` if a component was
    /// never terminated.
    pub(super) fn read_field_value(
        &mut self,
        cursor: &mut CharacterCursor<'_>,
        key: &str,
        value: &mut Value,
    ) -> Option<Token> {
        let key = key.to_lowercase();
        loop {
            let location = cursor.location();
            let Some(raw) = self.read_component(cursor) else {
                self.report(
                    location,
                    Severity::Error,
                    format!("Value of field \"{key}\" is not terminated"),
                );
                return None;
            };
            self.interpret(location, &key, &raw, value);
            let token = lexer::next_token(cursor);
            if token != Token::Doublecross {
                return Some(token);
            }
        }
    }

    /// Read the components of a macro or preamble value
    ///
    /// Macro values are decoded, preamble values are kept as LaTeX.
    pub(super) fn read_plain_value(
        &mut self,
        cursor: &mut CharacterCursor<'_>,
        decode: bool,
        value: &mut Value,
    ) -> Option<Token> {
        loop {
            let location = cursor.location();
            let Some(raw) = self.read_component(cursor) else {
                self.report(location, Severity::Error, "Value is not terminated");
                return None;
            };
            let text = bibtex_aware_simplify(&raw.text);
            match raw.kind {
                StringKind::MacroKey => push_text(value, ValueItem::MacroKey, text),
                _ if decode => push_text(value, ValueItem::PlainText, latex::decode(&text)),
                _ => push_text(value, ValueItem::VerbatimText, text),
            }
            let token = lexer::next_token(cursor);
            if token != Token::Doublecross {
                return Some(token);
            }
        }
    }

    pub(super) fn is_person_field(&self, key: &str) -> bool {
        self.options.person_fields.iter().any(|f| f == key)
    }

    /// Turn one component into value items according to the field name
    fn interpret(&mut self, location: Location, key: &str, raw: &RawString, value: &mut Value) {
        let decoded = latex::decode(&raw.text);
        let text = if keeps_formatting(key) {
            decoded
        } else {
            bibtex_aware_simplify(&decoded)
        };

        if raw.kind == StringKind::MacroKey {
            if key == "month" && MONTH_ABBREVIATION.is_match(&text) {
                let month: String = text.chars().take(3).collect();
                push_text(value, ValueItem::MacroKey, month.to_lowercase());
            } else {
                push_text(value, ValueItem::MacroKey, text);
            }
            return;
        }

        if key == "title" || key == "booktitle" {
            self.stats.record_title(&text);
        }

        if self.is_person_field(key) {
            let list = names::parse_person_list(&text, &mut *self.sink);
            if !list.items.is_empty() {
                if list.contains_comma {
                    self.stats.last_first_names += 1;
                } else {
                    self.stats.first_last_names += 1;
                }
            }
            value.0.extend(list.items);
        } else if key == "pages" {
            push_text(value, ValueItem::PlainText, PAGE_RANGE.replace_all(&text, "\u{2013}"));
        } else if is_link_field(key) {
            for link in LIST_SEPARATOR.split(&raw.text) {
                push_text(value, ValueItem::VerbatimText, link.trim());
            }
        } else if key.starts_with("file") {
            for attachment in LIST_SEPARATOR.split(&raw.text) {
                push_text(value, ValueItem::VerbatimText, attachment_path(attachment));
            }
        } else if key.starts_with("doi") {
            let cleaned = raw.text.replace("; ", " ");
            let before = value.len();
            for doi in DOI.find_iter(&cleaned) {
                value.push(ValueItem::VerbatimText(doi.as_str().to_string()));
            }
            if value.len() == before && !cleaned.trim().is_empty() {
                self.report(
                    location,
                    Severity::Warning,
                    format!("No DOI found in \"{}\"", cleaned.trim()),
                );
            }
        } else if key == "color" || key == "crossref" {
            push_text(value, ValueItem::VerbatimText, raw.text.trim());
        } else if key == "keywords" {
            let (keywords, separator) = split_keywords(&text);
            match separator {
                Some(';') => self.stats.list_separator = Some("; ".to_string()),
                Some(',') => self.stats.list_separator = Some(", ".to_string()),
                _ => {}
            }
            value.0.extend(keywords.into_iter().map(ValueItem::Keyword));
        } else {
            push_text(value, ValueItem::PlainText, text);
        }
    }
}
