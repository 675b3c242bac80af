//! Data models for imported BibTeX elements

use serde::{Deserialize, Serialize};
use std::fmt;

/// One top-level element of a bibliography, in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    /// A bibliography entry (`@article{...}`)
    Entry(Entry),
    /// A field macro (`@string{...}`)
    Macro(Macro),
    /// Raw LaTeX for the document preamble (`@preamble{...}`)
    Preamble(Preamble),
    /// Free text between or outside other elements
    Comment(Comment),
}

impl Element {
    /// Whether this element is a comment
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Identifier of an entry or key of a macro
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Entry(entry) => Some(&entry.id),
            Self::Macro(macro_) => Some(&macro_.key),
            Self::Preamble(_) | Self::Comment(_) => None,
        }
    }
}

/// A BibTeX entry (article, book, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry type as written, after keyword casing was applied
    pub ty: String,
    /// Unique identifier (citation key)
    pub id: String,
    /// Fields in file order
    pub fields: Vec<Field>,
}

impl Entry {
    /// Create a new entry
    pub fn new(ty: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Get the semantic entry type
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::parse(&self.ty)
    }

    /// Get the identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get a field value by name (case-insensitive)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|f| &f.value)
    }

    /// Get a mutable field value by name (case-insensitive)
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| &mut f.value)
    }

    /// Get a field by name (case-insensitive)
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Get a field's value flattened to text
    #[must_use]
    pub fn get_as_string(&self, name: &str) -> Option<String> {
        self.get(name).map(Value::text)
    }

    /// Check whether a field exists (case-insensitive)
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Get all fields
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Insert or replace a field; empty values are not stored
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if value.is_empty() {
            self.remove(&name);
            return;
        }
        match self.get_mut(&name) {
            Some(existing) => *existing = value,
            None => self.fields.push(Field { name, value }),
        }
    }

    /// Remove a field by name (case-insensitive)
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        let pos = self
            .fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))?;
        Some(self.fields.remove(pos))
    }
}

/// BibTeX entry type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Article from a journal
    Article,
    /// Book with publisher
    Book,
    /// Part of a book
    InBook,
    /// Part of a book with its own title
    InCollection,
    /// Article in conference proceedings
    InProceedings,
    /// Conference proceedings
    Proceedings,
    /// Master's thesis
    MastersThesis,
    /// `PhD` thesis
    PhdThesis,
    /// Technical report
    TechReport,
    /// Unpublished work
    Unpublished,
    /// Miscellaneous
    Misc,
    /// Custom entry type
    Custom(String),
}

impl EntryType {
    /// Parse from string (case-insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "inbook" => Self::InBook,
            "incollection" => Self::InCollection,
            "inproceedings" | "conference" => Self::InProceedings,
            "proceedings" => Self::Proceedings,
            "mastersthesis" => Self::MastersThesis,
            "phdthesis" => Self::PhdThesis,
            "techreport" => Self::TechReport,
            "unpublished" => Self::Unpublished,
            "misc" => Self::Misc,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Camel-case spelling used when formatting with upper camel case
    #[must_use]
    pub fn camel_case(&self) -> Option<&'static str> {
        match self {
            Self::Article => Some("Article"),
            Self::Book => Some("Book"),
            Self::InBook => Some("InBook"),
            Self::InCollection => Some("InCollection"),
            Self::InProceedings => Some("InProceedings"),
            Self::Proceedings => Some("Proceedings"),
            Self::MastersThesis => Some("MastersThesis"),
            Self::PhdThesis => Some("PhdThesis"),
            Self::TechReport => Some("TechReport"),
            Self::Unpublished => Some("Unpublished"),
            Self::Misc => Some("Misc"),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(s) => write!(f, "{s}"),
            known => write!(f, "{}", known.camel_case().unwrap_or_default().to_lowercase()),
        }
    }
}

/// A field in a BibTeX entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, casing as read (modulo keyword casing)
    pub name: String,
    /// Field value
    pub value: Value,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A person's name split into its components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Person {
    /// Given names
    pub first: String,
    /// Family name including particles like "van der"
    pub last: String,
    /// Suffix like "Jr." or "III"
    pub suffix: String,
}

impl Person {
    /// Create a new person
    pub fn new(first: impl Into<String>, last: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            suffix: suffix.into(),
        }
    }
}

impl fmt::Display for Person {
    /// Formats as "Last, First" or "Last, Suffix, First"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.last)?;
        if !self.suffix.is_empty() {
            write!(f, ", {}", self.suffix)?;
        }
        if !self.first.is_empty() {
            write!(f, ", {}", self.first)?;
        }
        Ok(())
    }
}

/// One item of a field value; items are joined by BibTeX's `#` operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueItem {
    /// LaTeX-decoded text
    PlainText(String),
    /// Text kept exactly as read (URLs, files, DOIs)
    VerbatimText(String),
    /// Reference to a `@string` macro
    MacroKey(String),
    /// A person's name
    Person(Person),
    /// One keyword of a keyword list
    Keyword(String),
}

impl ValueItem {
    /// Text representation of this item
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::PlainText(s) | Self::VerbatimText(s) | Self::MacroKey(s) | Self::Keyword(s) => {
                s.clone()
            }
            Self::Person(person) => person.to_string(),
        }
    }
}

/// A field value: an ordered sequence of items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub Vec<ValueItem>);

impl Value {
    /// Create an empty value
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an item
    pub fn push(&mut self, item: ValueItem) {
        self.0.push(item);
    }

    /// Whether the value has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over items
    pub fn iter(&self) -> std::slice::Iter<'_, ValueItem> {
        self.0.iter()
    }

    /// Get the text if the value is one plain or verbatim text item
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.0.as_slice() {
            [ValueItem::PlainText(s) | ValueItem::VerbatimText(s)] => Some(s),
            _ => None,
        }
    }

    /// All persons in this value
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.0.iter().filter_map(|item| match item {
            ValueItem::Person(p) => Some(p),
            _ => None,
        })
    }

    /// Flatten to text
    ///
    /// Persons are joined with " and ", keywords with "; ", everything else
    /// is concatenated.
    #[must_use]
    pub fn text(&self) -> String {
        let mut result = String::new();
        let mut previous: Option<&ValueItem> = None;
        for item in &self.0 {
            match (previous, item) {
                (Some(ValueItem::Person(_)), ValueItem::Person(_) | ValueItem::PlainText(_)) => {
                    result.push_str(" and ");
                }
                (Some(ValueItem::Keyword(_)), ValueItem::Keyword(_)) => result.push_str("; "),
                (Some(ValueItem::VerbatimText(_)), ValueItem::VerbatimText(_)) => {
                    result.push_str("; ");
                }
                _ => {}
            }
            result.push_str(&item.text());
            previous = Some(item);
        }
        result
    }
}

impl From<Vec<ValueItem>> for Value {
    fn from(items: Vec<ValueItem>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a Value {
    type Item = &'a ValueItem;
    type IntoIter = std::slice::Iter<'a, ValueItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// A `@string` macro definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    /// Macro key, unique within the document
    pub key: String,
    /// Macro value
    pub value: Value,
}

/// A `@preamble` block; its text is never LaTeX-decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preamble {
    /// Raw value
    pub value: Value,
}

/// Where a comment came from in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentContext {
    /// `@comment{...}`
    Command,
    /// A run of lines sharing a `%` prefix
    Prefix,
    /// Unrecognized free text
    Verbatim,
}

impl fmt::Display for CommentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::Prefix => write!(f, "prefix"),
            Self::Verbatim => write!(f, "verbatim"),
        }
    }
}

/// A comment element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Decoded comment text
    pub text: String,
    /// Origin of the comment
    pub context: CommentContext,
    /// Common line prefix, only for [`CommentContext::Prefix`]
    pub prefix: String,
}

impl Comment {
    /// Create a comment
    pub fn new(text: impl Into<String>, context: CommentContext) -> Self {
        Self {
            text: text.into(),
            context,
            prefix: String::new(),
        }
    }

    /// Create a comment for `%`-prefixed lines
    pub fn with_prefix(text: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: CommentContext::Prefix,
            prefix: prefix.into(),
        }
    }
}
