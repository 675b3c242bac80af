//! # bibtex-import
//!
//! A tolerant BibTeX importer that turns arbitrary `.bib` bytes into a
//! structured bibliography.
//!
//! ## Features
//!
//! - Encoding detection (BOM, UTF-16/32 zero patterns, in-band directives)
//! - LaTeX escapes decoded to Unicode, with an encoder for the way back
//! - Person names split into first, last and suffix
//! - Field-aware values: keywords, URLs, DOIs, page ranges, file attachments
//! - Malformed elements are skipped and reported, never fatal
//! - Formatting statistics of the source (delimiters, name order, casing)
//!
//! ## Example
//!
//! ```
//! use bibtex_import::{parse_str, Diagnostic};
//!
//! let input = r#"
//!     @article{einstein1905,
//!         author = "Albert Einstein",
//!         title = "Zur Elektrodynamik bewegter K{\"o}rper",
//!         journal = "Annalen der Physik",
//!         year = 1905
//!     }
//! "#;
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let doc = parse_str(input, &mut diagnostics)?;
//! assert_eq!(doc.entries().count(), 1);
//!
//! let entry = doc.entry("einstein1905").unwrap();
//! assert_eq!(entry.get_as_string("title").unwrap(), "Zur Elektrodynamik bewegter Körper");
//! assert_eq!(entry.get("author").unwrap().persons().next().unwrap().last, "Einstein");
//! assert!(diagnostics.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    missing_debug_implementations
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod document;
pub mod encoding;
pub mod error;
pub mod latex;
pub mod model;
pub mod names;
pub mod parser;

use lazy_static::lazy_static;
use regex::Regex;

pub use document::{
    CommentHandling, Document, DocumentStats, KeywordCasing, NameFormatting, ParseOptions,
    Properties, ProtectCasing, StringDelimiter,
};
pub use error::{Diagnostic, DiagnosticSink, Error, Location, NullSink, Result, Severity};
pub use model::{
    Comment, CommentContext, Element, Entry, EntryType, Field, Macro, Person, Preamble, Value,
    ValueItem,
};
pub use names::{split_name, split_names};
pub use parser::{split_keywords, BibTeXParser};

/// Re-export of common types
pub mod prelude {
    pub use crate::{
        Diagnostic, DiagnosticSink, Document, Element, Entry, Error, ParseOptions, Result,
        Severity, Value, ValueItem,
    };
}

lazy_static! {
    static ref BIBTEX_LIKE: Regex = Regex::new(r"@\w+\{.+\}").unwrap();
}

/// Import raw bytes with default options
pub fn parse_bytes(bytes: &[u8], sink: &mut dyn DiagnosticSink) -> Result<Document> {
    ParseOptions::new().parse_bytes(bytes, sink)
}

/// Import already decoded text with default options
pub fn parse_str(text: &str, sink: &mut dyn DiagnosticSink) -> Result<Document> {
    ParseOptions::new().parse_str(text, sink)
}

/// Import a file with default options
pub fn parse_file(path: impl AsRef<std::path::Path>, sink: &mut dyn DiagnosticSink) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, sink)
}

/// Whether `text` looks like BibTeX after decoding LaTeX escapes
#[must_use]
pub fn guess_can_decode(text: &str) -> bool {
    BIBTEX_LIKE.is_match(&latex::decode(text))
}
