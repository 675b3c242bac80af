//! BibTeX import parser
//!
//! A hand-driven recursive reader over a [`CharacterCursor`]. Malformed
//! elements are reported to the diagnostic sink and skipped; the reader then
//! resynchronizes at the next element.

pub mod cursor;
mod entry;
pub mod lexer;
mod stats;
pub mod utils;
pub mod value;

use crate::document::{CommentHandling, Document, ParseOptions};
use crate::error::{emit, Diagnostic, DiagnosticSink, Error, Location, Result, Severity};
use crate::model::Element;
use ahash::AHashSet;
use stats::Statistics;
use std::fmt;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

pub use cursor::CharacterCursor;
pub use value::{bibtex_aware_simplify, split_keywords};

/// Outcome of reading one top-level construct
enum Step {
    Element(Element),
    /// Read completely but not kept
    Skipped,
    /// Malformed; the reader resumes at the next element start
    Dropped,
    End,
}

/// Parser state for one import
pub struct BibTeXParser<'o, 's> {
    options: &'o mut ParseOptions,
    sink: &'s mut dyn DiagnosticSink,
    stats: Statistics,
    known_ids: AHashSet<String>,
}

impl fmt::Debug for BibTeXParser<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BibTeXParser")
            .field("options", &self.options)
            .field("stats", &self.stats)
            .field("known_ids", &self.known_ids.len())
            .finish_non_exhaustive()
    }
}

/// Skip the remains of a dropped element up to the next element start
fn resynchronize(cursor: &mut CharacterCursor<'_>) {
    let rest = cursor.rest();
    let skipped = utils::find_element_start(rest).unwrap_or(rest.len());
    if skipped > 0 {
        debug!(skipped, "Skipping remains of a dropped element");
    }
    cursor.advance_to(&rest[skipped..]);
}

impl<'o, 's> BibTeXParser<'o, 's> {
    /// Create a parser reporting to `sink`
    pub fn new(options: &'o mut ParseOptions, sink: &'s mut dyn DiagnosticSink) -> Self {
        Self {
            options,
            sink,
            stats: Statistics::default(),
            known_ids: AHashSet::new(),
        }
    }

    /// Parse decoded text into a document
    ///
    /// # Errors
    ///
    /// [`Error::NoElements`] if nothing could be read, [`Error::Cancelled`]
    /// if the cancellation flag was raised.
    pub fn parse(mut self, text: &str, encoding: String) -> Result<Document> {
        let mut cursor = CharacterCursor::new(text);
        let mut elements = Vec::new();
        let mut found = 0usize;

        loop {
            if self.is_cancelled() {
                info!(position = cursor.position(), "Import cancelled");
                return Err(Error::Cancelled);
            }
            let step = self.next_element(&mut cursor);
            if let Some(progress) = self.options.progress.as_mut() {
                progress(cursor.position(), cursor.len());
            }
            match step {
                Step::End => break,
                Step::Skipped => {}
                Step::Dropped => resynchronize(&mut cursor),
                Step::Element(element) => {
                    found += 1;
                    let ignored = element.is_comment()
                        && self.options.comment_handling == CommentHandling::Ignore;
                    if !ignored {
                        elements.push(element);
                    }
                }
            }
        }

        if found == 0 {
            return Err(Error::NoElements(text.chars().count()));
        }
        debug!(found, kept = elements.len(), "Import finished");
        let properties = self.stats.into_properties(encoding, &elements);
        Ok(Document::from_parts(elements, properties))
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn report(&mut self, location: Location, severity: Severity, message: impl Into<String>) {
        emit(&mut *self.sink, Diagnostic::new(severity, message).at(location));
    }

    /// Report an element that has to be dropped
    fn structural_error(&mut self, cursor: &CharacterCursor<'_>, message: impl Into<String>) {
        debug!(
            previous_line = cursor.previous_line(),
            current_line = cursor.current_line(),
            "Structural error"
        );
        self.report(cursor.location(), Severity::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::KeywordCasing;
    use crate::model::{CommentContext, ValueItem};
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> (Result<Document>, Vec<Diagnostic>) {
        let mut options = ParseOptions::new();
        let mut sink = Vec::new();
        let result = BibTeXParser::new(&mut options, &mut sink).parse(input, "UTF-8".into());
        (result, sink)
    }

    fn document(input: &str) -> Document {
        parse(input).0.unwrap()
    }

    #[test]
    fn test_simple_entry() {
        let doc = document(
            r#"@Article{smith2020,
                author = {Smith, John and Doe, Jane},
                title = "A {Study} of Things",
                year = 2020,
            }"#,
        );
        let entry = doc.entry("smith2020").unwrap();
        assert_eq!(entry.ty, "article");
        assert_eq!(entry.get("author").unwrap().persons().count(), 2);
        assert_eq!(entry.get_as_string("title").unwrap(), "A {Study} of Things");
        assert_eq!(
            entry.get("year").unwrap().iter().next(),
            Some(&ValueItem::MacroKey("2020".into()))
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let (result, sink) = parse("@misc{foo, note={a}}\n@misc{foo, note={b}}");
        let doc = result.unwrap();
        let ids: Vec<&str> = doc.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["foo", "foo-2"]);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, Severity::Warning);
    }

    #[test]
    fn test_macro_and_entry_share_namespace() {
        let doc = document("@string{acm = {ACM}}\n@book{acm, publisher = acm}");
        assert_eq!(doc.find_macro("acm").unwrap().value.text(), "ACM");
        assert!(doc.entry("acm-2").is_some());
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let (result, sink) = parse(
            "@article{bad, title = {x} year = {2000}}\n\n@article{good, title = {ok}}",
        );
        let doc = result.unwrap();
        assert!(doc.entry("good").is_some());
        assert!(doc.entry("bad").is_none());
        assert!(sink.iter().any(|d| d.severity == Severity::Error));
    }

    #[test]
    fn test_single_malformed_entry_yields_nothing() {
        let (result, sink) = parse("@misc{a, title = {x} year = {1}}");
        assert!(matches!(result, Err(Error::NoElements(_))));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, Severity::Error);
    }

    #[test]
    fn test_resumes_at_next_element() {
        let (result, _) = parse("@misc{a, title = {x} year = {1}}\n@misc{b, title = {y}}");
        let doc = result.unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.entry("b").is_some());
    }

    #[test]
    fn test_unclosed_entry_before_next_element() {
        let (result, sink) = parse("@misc{a, title = {x}\n@misc{b, title = {y}}");
        let doc = result.unwrap();
        let ids: Vec<&str> = doc.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(doc.len(), 1);
        assert_eq!(sink[0].severity, Severity::Error);
    }

    #[test]
    fn test_import_is_skipped_whole() {
        let doc = document("@import{other.bib}\n@misc{a}");
        assert_eq!(doc.len(), 1);
        assert!(doc.comments().next().is_none());
    }

    #[test]
    fn test_missing_bracket() {
        let (result, sink) = parse("@article key, title={x}}\n@misc{ok}");
        let doc = result.unwrap();
        assert!(doc.entry("ok").is_some());
        assert_eq!(sink[0].severity, Severity::Error);
        assert_eq!(sink[0].location.map(|l| l.line), Some(1));
    }

    #[test]
    fn test_unterminated_value_at_end() {
        let (result, _) = parse("@misc{a}\n@misc{b, title = {never closed}");
        let doc = result.unwrap();
        assert_eq!(doc.entries().count(), 1);
    }

    #[test]
    fn test_trailing_comma_and_empty_id() {
        let (result, sink) = parse("@misc{, note = {x},}");
        let doc = result.unwrap();
        assert!(doc.entry("EmptyId").is_some());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_duplicate_fields() {
        let doc = document(
            "@misc{x, title={One}, title={Two}, keywords={a}, keywords={b}, author={A B}, author={C D}}",
        );
        let entry = doc.entry("x").unwrap();
        assert_eq!(entry.get_as_string("title2").unwrap(), "Two");
        assert_eq!(entry.get("keywords").unwrap().len(), 2);
        assert_eq!(entry.get("author").unwrap().persons().count(), 2);
    }

    #[test]
    fn test_field_interpretation() {
        let doc = document(
            r#"@article{k,
                pages = {10 -- 20},
                keywords = {a; b;c},
                month = feb # "~1st",
                url = {http://a.org/x_y; http://b.org},
                doi = {https://doi.org/10.1000/abc},
                crossref = {parent},
                abstract = {Line one
                    line two}
            }"#,
        );
        let entry = doc.entry("k").unwrap();
        assert_eq!(entry.get_as_string("pages").unwrap(), "10\u{2013}20");
        assert_eq!(entry.get("keywords").unwrap().len(), 3);
        assert_eq!(
            entry.get("month").unwrap().iter().next(),
            Some(&ValueItem::MacroKey("feb".into()))
        );
        assert_eq!(
            entry.get("url").unwrap().0,
            vec![
                ValueItem::VerbatimText("http://a.org/x_y".into()),
                ValueItem::VerbatimText("http://b.org".into()),
            ]
        );
        assert_eq!(
            entry.get("doi").unwrap().0,
            vec![ValueItem::VerbatimText("10.1000/abc".into())]
        );
        assert_eq!(
            entry.get("crossref").unwrap().0,
            vec![ValueItem::VerbatimText("parent".into())]
        );
        assert!(entry.get_as_string("abstract").unwrap().contains('\n'));
        assert_eq!(doc.properties().list_separator.as_deref(), Some("; "));
    }

    #[test]
    fn test_comments() {
        let doc = document(
            "% first line\n% second line\n\nsome free text\n\n@comment{hello}\n@misc{a}",
        );
        let comments: Vec<_> = doc.comments().collect();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].context, CommentContext::Prefix);
        assert_eq!(comments[0].prefix, "% ");
        assert_eq!(comments[0].text, "first line\nsecond line");
        assert_eq!(comments[1].context, CommentContext::Verbatim);
        assert_eq!(comments[1].text, "some free text");
        assert_eq!(comments[2].context, CommentContext::Command);
        assert_eq!(comments[2].text, "hello");
    }

    #[test]
    fn test_internal_comment_dropped() {
        let (result, sink) = parse("@comment{x-kbibtex-something}\n@misc{a}");
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!(sink[0].severity, Severity::Warning);
    }

    #[test]
    fn test_no_elements() {
        assert!(matches!(parse("   \n\t").0, Err(Error::NoElements(_))));
        assert!(matches!(parse("@").0, Err(Error::NoElements(_))));
    }

    #[test]
    fn test_ignored_comments_still_count() {
        let mut options =
            ParseOptions::new().comment_handling(CommentHandling::Ignore);
        let mut sink = Vec::new();
        let doc = BibTeXParser::new(&mut options, &mut sink)
            .parse("@comment{x}", "UTF-8".into())
            .unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_keyword_casing() {
        let mut options = ParseOptions::new().keyword_casing(KeywordCasing::UpperCamelCase);
        let mut sink = Vec::new();
        let doc = BibTeXParser::new(&mut options, &mut sink)
            .parse("@inproceedings{a, booktitle = {B}}", "UTF-8".into())
            .unwrap();
        let entry = doc.entry("a").unwrap();
        assert_eq!(entry.ty, "InProceedings");
        assert_eq!(entry.fields()[0].name, "BookTitle");
    }

    #[test]
    fn test_non_ascii_id() {
        let (result, sink) = parse("@misc{M{\\\"u}ller2000, note = {x}}");
        let doc = result.unwrap();
        assert!(doc.entry("Muller2000").is_some());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_person_name_statistics() {
        let doc = document(
            "@misc{a, author = {John Smith}}\n@misc{b, author = {Jane Doe and Max Mustermann}}\n@misc{c, editor = {Doe, Jane}}",
        );
        assert_eq!(
            doc.properties().name_formatting,
            crate::document::NameFormatting::FirstLast
        );
        assert!(doc.properties().sorted_by_id);
    }
}
