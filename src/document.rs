//! Parsed bibliography document, its properties and the parse options

use crate::encoding;
use crate::error::{DiagnosticSink, Error, Result};
use crate::model::{Comment, CommentContext, Element, Entry, Macro, Preamble};
use crate::parser::BibTeXParser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Delimiter style used for field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StringDelimiter {
    /// `"..."`
    Quotes,
    /// `{...}`
    #[default]
    Braces,
}

impl fmt::Display for StringDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quotes => write!(f, "\"\""),
            Self::Braces => write!(f, "{{}}"),
        }
    }
}

/// Preferred order of person name components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NameFormatting {
    /// "John Smith"
    FirstLast,
    /// "Smith, John"
    #[default]
    LastFirst,
}

/// Whether titles protect their casing with extra braces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtectCasing {
    /// Titles are (nearly) always protected
    Checked,
    /// Titles are (nearly) never protected
    Unchecked,
    /// No clear majority
    #[default]
    Partial,
}

impl fmt::Display for ProtectCasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checked => write!(f, "checked"),
            Self::Unchecked => write!(f, "unchecked"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// Formatting preferences inferred from the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    /// Name of the detected encoding
    pub encoding: String,
    /// Majority value delimiter
    pub string_delimiter: StringDelimiter,
    /// Majority person name order
    pub name_formatting: NameFormatting,
    /// Title protection tri-state
    pub protect_casing: ProtectCasing,
    /// Majority comment style
    pub comment_context: CommentContext,
    /// Most frequent prefix of `%` comments
    pub comment_prefix: String,
    /// Separator of the most recently split keyword list
    pub list_separator: Option<String>,
    /// Entries appear sorted by identifier
    pub sorted_by_id: bool,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            string_delimiter: StringDelimiter::default(),
            name_formatting: NameFormatting::default(),
            protect_casing: ProtectCasing::default(),
            comment_context: CommentContext::Prefix,
            comment_prefix: "% ".to_string(),
            list_separator: None,
            sorted_by_id: false,
        }
    }
}

/// A parsed bibliography: elements in file order plus properties
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    elements: Vec<Element>,
    properties: Properties,
}

impl Document {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn from_parts(elements: Vec<Element>, properties: Properties) -> Self {
        Self {
            elements,
            properties,
        }
    }

    /// Create parse options to configure an import
    #[must_use]
    pub fn parser() -> ParseOptions {
        ParseOptions::new()
    }

    /// All elements in file order
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Consume the document, returning its elements
    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// Inferred formatting properties
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over entries
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.elements.iter().filter_map(|e| match e {
            Element::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    /// Iterate over macros
    pub fn macros(&self) -> impl Iterator<Item = &Macro> {
        self.elements.iter().filter_map(|e| match e {
            Element::Macro(macro_) => Some(macro_),
            _ => None,
        })
    }

    /// Iterate over preambles
    pub fn preambles(&self) -> impl Iterator<Item = &Preamble> {
        self.elements.iter().filter_map(|e| match e {
            Element::Preamble(preamble) => Some(preamble),
            _ => None,
        })
    }

    /// Iterate over comments
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.elements.iter().filter_map(|e| match e {
            Element::Comment(comment) => Some(comment),
            _ => None,
        })
    }

    /// Find an entry by identifier
    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries().find(|e| e.id == id)
    }

    /// Find a macro by key
    #[must_use]
    pub fn find_macro(&self, key: &str) -> Option<&Macro> {
        self.macros().find(|m| m.key.eq_ignore_ascii_case(key))
    }

    /// Get statistics about the document
    #[must_use]
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats::default();
        for element in &self.elements {
            match element {
                Element::Entry(entry) => {
                    stats.entries += 1;
                    *stats
                        .entries_by_type
                        .entry(entry.entry_type().to_string())
                        .or_insert(0) += 1;
                    stats.fields += entry.fields.len();
                }
                Element::Macro(_) => stats.macros += 1,
                Element::Preamble(_) => stats.preambles += 1,
                Element::Comment(_) => stats.comments += 1,
            }
        }
        stats
    }
}

/// Element counts of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Total number of entries
    pub entries: usize,
    /// Number of macros
    pub macros: usize,
    /// Number of preambles
    pub preambles: usize,
    /// Number of comments
    pub comments: usize,
    /// Total number of fields over all entries
    pub fields: usize,
    /// Entries grouped by lowercase type
    pub entries_by_type: BTreeMap<String, usize>,
}

impl fmt::Display for DocumentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entries:   {}", self.entries)?;
        writeln!(f, "Macros:    {}", self.macros)?;
        writeln!(f, "Preambles: {}", self.preambles)?;
        writeln!(f, "Comments:  {}", self.comments)?;
        writeln!(f, "Fields:    {}", self.fields)?;
        for (ty, count) in &self.entries_by_type {
            writeln!(f, "  {ty}: {count}")?;
        }
        Ok(())
    }
}

/// What happens to comments found in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommentHandling {
    /// Comments become elements of the document
    #[default]
    Keep,
    /// Comments are read and discarded
    Ignore,
}

/// Casing applied to entry type and field name strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeywordCasing {
    /// `inproceedings`
    #[default]
    LowerCase,
    /// `Inproceedings`
    InitialCapital,
    /// `InProceedings`
    UpperCamelCase,
    /// `inProceedings`
    LowerCamelCase,
    /// `INPROCEEDINGS`
    UpperCase,
}

/// Field names with internal capitals for the camel-case styles
const CAMEL_CASE_FIELDS: &[&str] = &[
    "BibUrl",
    "BookAuthor",
    "BookTitle",
    "CrossRef",
    "HowPublished",
    "LocalFile",
    "UrlDate",
];

impl KeywordCasing {
    /// Apply this casing; `camel` is the known camel-case spelling, if any
    #[must_use]
    pub fn apply(self, keyword: &str, camel: Option<&str>) -> String {
        match self {
            Self::LowerCase => keyword.to_lowercase(),
            Self::UpperCase => keyword.to_uppercase(),
            Self::InitialCapital => initial_capital(keyword),
            Self::UpperCamelCase => camel.map_or_else(|| initial_capital(keyword), str::to_string),
            Self::LowerCamelCase => camel.map_or_else(
                || keyword.to_lowercase(),
                |c| {
                    let mut chars = c.chars();
                    chars.next().map_or_else(String::new, |first| {
                        first.to_lowercase().chain(chars).collect()
                    })
                },
            ),
        }
    }

    /// Apply this casing to an entry type string
    ///
    /// Only the spelling changes; aliases such as `conference` are kept.
    #[must_use]
    pub fn entry_type(self, ty: &str) -> String {
        let camel = crate::model::EntryType::parse(ty)
            .camel_case()
            .filter(|c| c.eq_ignore_ascii_case(ty));
        self.apply(ty, camel)
    }

    /// Apply this casing to a field name
    #[must_use]
    pub fn field_name(self, name: &str) -> String {
        let camel = CAMEL_CASE_FIELDS
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .copied();
        self.apply(name, camel)
    }
}

fn initial_capital(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

type ProgressCallback = Box<dyn FnMut(usize, usize)>;

/// Options for one import
pub struct ParseOptions {
    pub(crate) comment_handling: CommentHandling,
    pub(crate) keyword_casing: KeywordCasing,
    pub(crate) person_fields: Vec<String>,
    pub(crate) cancel_flag: Option<Arc<AtomicBool>>,
    pub(crate) progress: Option<ProgressCallback>,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("comment_handling", &self.comment_handling)
            .field("keyword_casing", &self.keyword_casing)
            .field("person_fields", &self.person_fields)
            .field("cancel_flag", &self.cancel_flag)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comment_handling: CommentHandling::default(),
            keyword_casing: KeywordCasing::default(),
            person_fields: vec![
                "author".to_string(),
                "editor".to_string(),
                "bookauthor".to_string(),
            ],
            cancel_flag: None,
            progress: None,
        }
    }
}

impl ParseOptions {
    /// Create new parse options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or drop comments
    #[must_use]
    pub const fn comment_handling(mut self, handling: CommentHandling) -> Self {
        self.comment_handling = handling;
        self
    }

    /// Casing of entry types and field names
    #[must_use]
    pub const fn keyword_casing(mut self, casing: KeywordCasing) -> Self {
        self.keyword_casing = casing;
        self
    }

    /// Fields whose values are lists of person names
    #[must_use]
    pub fn person_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.person_fields = fields
            .into_iter()
            .map(|f| f.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Flag that aborts the import once set
    #[must_use]
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Callback receiving (consumed, total) byte offsets after each element
    #[must_use]
    pub fn progress(mut self, callback: impl FnMut(usize, usize) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Import raw bytes, detecting their encoding first
    #[tracing::instrument(skip(self, bytes, sink), fields(input_len = bytes.len()))]
    pub fn parse_bytes(&mut self, bytes: &[u8], sink: &mut dyn DiagnosticSink) -> Result<Document> {
        if bytes.is_empty() {
            return Err(Error::EmptyInput);
        }
        let decoded = encoding::sniff(bytes, sink);
        let text = encoding::prepare_text(&decoded.text, sink);
        BibTeXParser::new(self, sink).parse(&text, decoded.encoding)
    }

    /// Import text that is already decoded
    #[tracing::instrument(skip(self, text, sink), fields(input_len = text.len()))]
    pub fn parse_str(&mut self, text: &str, sink: &mut dyn DiagnosticSink) -> Result<Document> {
        if text.is_empty() {
            return Err(Error::EmptyInput);
        }
        let text = encoding::prepare_text(text, sink);
        BibTeXParser::new(self, sink).parse(&text, "UTF-8".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_casing() {
        assert_eq!(KeywordCasing::LowerCase.entry_type("InProceedings"), "inproceedings");
        assert_eq!(KeywordCasing::UpperCase.entry_type("article"), "ARTICLE");
        assert_eq!(KeywordCasing::InitialCapital.entry_type("inproceedings"), "Inproceedings");
        assert_eq!(KeywordCasing::UpperCamelCase.entry_type("inproceedings"), "InProceedings");
        assert_eq!(KeywordCasing::LowerCamelCase.entry_type("INPROCEEDINGS"), "inProceedings");
        assert_eq!(KeywordCasing::UpperCamelCase.field_name("booktitle"), "BookTitle");
        assert_eq!(KeywordCasing::UpperCamelCase.field_name("title"), "Title");
    }

    #[test]
    fn test_casing_keeps_type_aliases() {
        assert_eq!(KeywordCasing::UpperCamelCase.entry_type("conference"), "Conference");
        assert_eq!(KeywordCasing::LowerCamelCase.entry_type("CONFERENCE"), "conference");
        assert_eq!(KeywordCasing::LowerCase.entry_type("Conference"), "conference");
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::new();
        assert_eq!(options.comment_handling, CommentHandling::Keep);
        assert_eq!(options.person_fields, ["author", "editor", "bookauthor"]);
        let options = options.person_fields(["Author", "Translator"]);
        assert_eq!(options.person_fields, ["author", "translator"]);
    }

    #[test]
    fn test_stats() {
        let mut entry = Entry::new("article", "a");
        entry.insert("title", crate::model::Value::from(vec![
            crate::model::ValueItem::PlainText("T".into()),
        ]));
        let doc = Document::from_parts(
            vec![
                Element::Entry(entry),
                Element::Entry(Entry::new("book", "b")),
                Element::Comment(Comment::new("x", CommentContext::Command)),
            ],
            Properties::default(),
        );
        let stats = doc.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.fields, 1);
        assert_eq!(stats.entries_by_type.get("article"), Some(&1));
    }
}
