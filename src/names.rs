//! Splitting person names into first, last and suffix
//!
//! BibTeX gives no reliable structure for names, so the rules below are
//! heuristics. They are tried in a fixed order:
//!
//! 1. Commas (outside braces) split a name into `Last, First`,
//!    `Last, Suffix, First` or `Last, First, Suffix`.
//! 2. Trailing single capital letters are PubMed initials: `Tuckwell P H`.
//! 3. Otherwise the last token is the family name; lowercase particles and a
//!    few capitalized ones (`van der`, `Di`) directly before it join it, and a
//!    trailing `Jr.`/`III` becomes the suffix.

use crate::error::{emit, Diagnostic, DiagnosticSink, Severity};
use crate::model::{Person, ValueItem};
use lazy_static::lazy_static;
use regex::Regex;

/// Capitalized words that still belong to the family name
const CAPITAL_CASE_PARTICLES: &[&str] = &["Di", "De", "Del", "Della", "Da", "Dos", "Du"];

const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

const TOKEN_AND: &str = "and";
const TOKEN_OTHERS: &str = "others";

lazy_static! {
    static ref FOOTNOTE_NUMBER: Regex = Regex::new(r"(\w)\d+\b").unwrap();
    static ref ACADEMIC_DEGREE: Regex = Regex::new(r"(,\s*)?(MA|PhD)\b").unwrap();
    static ref EMAIL_ADDRESS: Regex = Regex::new(
        r"\b[a-zA-Z0-9][a-zA-Z0-9._-]+[a-zA-Z0-9]@[a-z0-9][a-z0-9-]*([.][a-z0-9-]+)*([.][a-z]+)+\b"
    )
    .unwrap();
    static ref NAME_SEPARATOR: Regex =
        Regex::new(r"\s*([,]+|[,]*\b[au]nd\b|[;]|&|\n|\s{4,})\s*").unwrap();
}

/// Footnote markers that separate names in pasted author lists
const FOOTNOTE_MARKERS: &[char] = &['\u{00B7}', '\u{2020}', '\u{2217}', '\u{2021}', '*', '\u{21D1}'];

/// Split at whitespace that is not inside braces
#[must_use]
pub fn context_sensitive_split(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut depth: i32 = 0;

    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if !buffer.is_empty() {
                segments.push(std::mem::take(&mut buffer));
            }
        } else {
            buffer.push(c);
        }
    }
    if !buffer.is_empty() {
        segments.push(buffer);
    }
    segments
}

/// Distribute tokens over up to three groups separated by top-level commas
fn comma_groups<S: AsRef<str>>(tokens: &[S]) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = vec![Vec::new()];
    for token in tokens {
        let mut depth: i32 = 0;
        let mut buffer = String::new();
        for c in token.as_ref().chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                ',' if depth == 0 && groups.len() < 3 => {
                    if !buffer.is_empty() {
                        if let Some(group) = groups.last_mut() {
                            group.push(std::mem::take(&mut buffer));
                        }
                    }
                    groups.push(Vec::new());
                    continue;
                }
                _ => {}
            }
            buffer.push(c);
        }
        if !buffer.is_empty() {
            if let Some(group) = groups.last_mut() {
                group.push(buffer);
            }
        }
    }
    groups
}

fn is_suffix(token: &str) -> bool {
    let stripped = token.trim_matches(|c| c == '.' || c == ',').to_lowercase();
    SUFFIXES.contains(&stripped.as_str())
}

fn is_single_capital(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

fn starts_lowercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_lowercase)
}

/// Apply the splitting rules to comma groups; `None` if no family name results
fn decompose(groups: &[Vec<String>]) -> Option<Person> {
    if groups.len() > 1 {
        let last = groups[0].join(" ");
        if last.is_empty() {
            return None;
        }
        let (first, suffix) = match groups {
            [_, second] => (second.join(" "), String::new()),
            [_, second, third, ..] if second.len() == 1 && is_suffix(&second[0]) => {
                (third.join(" "), second.join(" "))
            }
            [_, second, third, ..] => (second.join(" "), third.join(" ")),
            _ => (String::new(), String::new()),
        };
        return Some(Person::new(first, last, suffix));
    }

    let tokens = groups.first()?;
    if tokens.is_empty() {
        return None;
    }

    let initials = tokens
        .iter()
        .rev()
        .take_while(|t| is_single_capital(t))
        .count();
    if initials > 0 && initials < tokens.len() {
        let split = tokens.len() - initials;
        return Some(Person::new(
            tokens[split..].join(" "),
            tokens[..split].join(" "),
            "",
        ));
    }

    let mut first: Vec<&str> = Vec::new();
    let mut last: Vec<&str> = Vec::new();
    let mut suffix: Vec<&str> = Vec::new();
    for token in tokens.iter().rev() {
        if last.is_empty() && is_suffix(token) {
            suffix.insert(0, token);
        } else if last.is_empty()
            || (first.is_empty()
                && (starts_lowercase(token) || CAPITAL_CASE_PARTICLES.contains(&token.as_str())))
        {
            last.insert(0, token);
        } else {
            first.insert(0, token);
        }
    }

    if last.is_empty() {
        return None;
    }
    Some(Person::new(first.join(" "), last.join(" "), suffix.join(" ")))
}

/// Whether a token sequence uses the comma form `Last, First`
#[must_use]
pub fn contains_comma<S: AsRef<str>>(tokens: &[S]) -> bool {
    comma_groups(tokens).len() > 1
}

/// Build a person from the whitespace-separated tokens of one name
///
/// An empty token list yields `None` silently; a name without a family name
/// yields `None` and a warning.
pub fn person_from_tokens<S: AsRef<str>>(
    tokens: &[S],
    sink: &mut dyn DiagnosticSink,
) -> Option<Person> {
    if tokens.is_empty() {
        return None;
    }
    let person = decompose(&comma_groups(tokens));
    if person.is_none() {
        let name = tokens
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        emit(
            sink,
            Diagnostic::new(Severity::Warning, format!("Don't know how to handle name '{name}'")),
        );
    }
    person
}

/// Build a person from one name given as text
pub fn person_from_string(name: &str, sink: &mut dyn DiagnosticSink) -> Option<Person> {
    person_from_tokens(&context_sensitive_split(name), sink)
}

/// Result of splitting an `and`-separated name list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonList {
    /// Persons, plus a trailing `PlainText("others")` if present
    pub items: Vec<ValueItem>,
    /// At least one name used the comma form
    pub contains_comma: bool,
}

fn push_person(tokens: &[String], list: &mut PersonList, sink: &mut dyn DiagnosticSink) {
    if contains_comma(tokens) {
        list.contains_comma = true;
    }
    if let Some(person) = person_from_tokens(tokens, sink) {
        list.items.push(ValueItem::Person(person));
    }
}

/// Split a BibTeX name list at `and` and decompose each name
pub fn parse_person_list(text: &str, sink: &mut dyn DiagnosticSink) -> PersonList {
    let tokens = context_sensitive_split(text);
    let mut list = PersonList::default();
    let mut name_start = 0;
    let mut encountered_name = false;
    let mut previous: Option<&str> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token == TOKEN_AND {
            if previous == Some(TOKEN_AND) {
                emit(
                    sink,
                    Diagnostic::new(Severity::Warning, "Two subsequent \"and\" in person list"),
                );
            } else if !encountered_name {
                emit(
                    sink,
                    Diagnostic::new(Severity::Warning, "Found \"and\" but no name before it"),
                );
            } else {
                push_person(&tokens[name_start..i], &mut list, sink);
            }
            name_start = i + 1;
            encountered_name = false;
        } else if token == TOKEN_OTHERS {
            if i + 1 < tokens.len() {
                emit(
                    sink,
                    Diagnostic::new(
                        Severity::Warning,
                        "Special word \"others\" found before last position in person list",
                    ),
                );
            } else {
                list.items.push(ValueItem::PlainText(TOKEN_OTHERS.to_string()));
            }
            name_start = i + 1;
            encountered_name = false;
        } else {
            encountered_name = true;
        }
        previous = Some(token.as_str());
    }

    if name_start < tokens.len() {
        push_person(&tokens[name_start..], &mut list, sink);
    } else if previous == Some(TOKEN_AND) {
        emit(
            sink,
            Diagnostic::new(Severity::Warning, "Person list ends with \"and\""),
        );
    }

    list
}

/// Split a single name given as plain text, without brace awareness
///
/// Commas give `Last, First` forms; otherwise PubMed initials and
/// particle rules apply.
#[must_use]
pub fn split_name(name: &str) -> Option<Person> {
    let groups: Vec<Vec<String>> = name
        .splitn(3, ',')
        .map(|part| part.split_whitespace().map(str::to_string).collect())
        .collect();
    decompose(&groups)
}

/// Split free text such as a pasted author line into persons
///
/// Handles separators `,`, `and`, `und`, `;`, `&`, newlines and wide gaps.
/// Footnote markers, footnote numbers, academic degrees and e-mail addresses
/// are removed first. When no token contains a space, consecutive tokens are
/// paired as `Last, First`.
#[must_use]
pub fn split_names(text: &str) -> Vec<Person> {
    let mut cleaned: String = text
        .chars()
        .map(|c| if FOOTNOTE_MARKERS.contains(&c) { ',' } else { c })
        .collect();
    cleaned = FOOTNOTE_NUMBER.replace_all(&cleaned, "$1").into_owned();
    cleaned = ACADEMIC_DEGREE.replace_all(&cleaned, "").into_owned();
    cleaned = EMAIL_ADDRESS.replace_all(&cleaned, "").into_owned();

    let tokens: Vec<&str> = NAME_SEPARATOR
        .split(&cleaned)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let mut sink = crate::error::NullSink;
    if tokens.iter().all(|t| t.contains(' ')) {
        tokens
            .iter()
            .filter_map(|t| person_from_string(t, &mut sink))
            .collect()
    } else {
        tokens
            .chunks_exact(2)
            .filter_map(|pair| person_from_string(&format!("{}, {}", pair[0], pair[1]), &mut sink))
            .collect()
    }
}
