use bibtex_import::{
    parse_bytes, parse_str, CommentContext, CommentHandling, Diagnostic, Document, Element, Error,
    NameFormatting, NullSink, ParseOptions, ProtectCasing, Severity, StringDelimiter, ValueItem,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn import(bytes: &[u8]) -> (Document, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let doc = parse_bytes(bytes, &mut diagnostics).unwrap();
    (doc, diagnostics)
}

#[test]
fn test_parse_simple_file() {
    let (doc, diagnostics) = import(include_bytes!("fixtures/simple.bib"));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(doc.properties().encoding, "UTF-8");
    assert_eq!(doc.entries().count(), 2);
    assert_eq!(doc.macros().count(), 1);

    let entry = doc.entry("einstein1905").unwrap();
    assert_eq!(entry.ty, "article");
    assert_eq!(entry.get_as_string("author").unwrap(), "Einstein, Albert");
    assert_eq!(
        entry.get_as_string("title").unwrap(),
        "Zur Elektrodynamik bewegter Körper"
    );
    assert_eq!(entry.get_as_string("pages").unwrap(), "891\u{2013}921");

    let knuth = doc.entry("knuth1984").unwrap();
    assert_eq!(
        knuth.get("author").unwrap().0,
        vec![ValueItem::MacroKey("knuth".into())]
    );
    assert_eq!(
        doc.find_macro("knuth").unwrap().value.text(),
        "Donald E. Knuth"
    );
    assert_eq!(doc.properties().string_delimiter, StringDelimiter::Quotes);
}

#[test]
fn test_parse_mixed_file() {
    let (doc, diagnostics) = import(include_bytes!("fixtures/mixed.bib"));

    let kinds: Vec<&str> = doc
        .elements()
        .iter()
        .map(|e| match e {
            Element::Entry(_) => "entry",
            Element::Macro(_) => "macro",
            Element::Preamble(_) => "preamble",
            Element::Comment(_) => "comment",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["comment", "preamble", "comment", "comment", "entry", "entry"]
    );

    let comments: Vec<_> = doc.comments().collect();
    assert_eq!(comments[0].context, CommentContext::Prefix);
    assert_eq!(comments[0].prefix, "%% ");
    assert_eq!(comments[0].text, "Generated bibliography\nSecond header line");
    assert_eq!(comments[1].context, CommentContext::Verbatim);
    assert_eq!(comments[2].context, CommentContext::Command);
    assert_eq!(comments[2].text, "jabref-meta: databaseType:bibtex;");

    let preamble = doc.preambles().next().unwrap();
    assert_eq!(
        preamble.value.0,
        vec![ValueItem::VerbatimText("\\newcommand{\\noopsort}[1]{}".into())]
    );

    let entry = doc.entry("Mueller2010").unwrap();
    assert_eq!(entry.ty, "inproceedings");
    let authors: Vec<_> = entry.get("author").unwrap().persons().collect();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].last, "Müller");
    assert_eq!(authors[1].last, "van der Berg");
    assert_eq!(
        entry.get("author").unwrap().iter().last(),
        Some(&ValueItem::PlainText("others".into()))
    );
    assert_eq!(entry.get_as_string("pages").unwrap(), "12\u{2013}34");
    assert_eq!(
        entry.get("keywords").unwrap().0,
        vec![
            ValueItem::Keyword("graph theory".into()),
            ValueItem::Keyword("networks".into()),
            ValueItem::Keyword("routing".into()),
        ]
    );
    assert_eq!(entry.get("url").unwrap().len(), 2);
    assert_eq!(entry.get_as_string("doi").unwrap(), "10.1109/ABC.2010.1234");
    assert_eq!(
        entry.get_as_string("file").unwrap(),
        "/home/hans/papers/mueller2010.pdf"
    );
    assert_eq!(
        entry.get("month").unwrap().0,
        vec![ValueItem::MacroKey("jun".into())]
    );

    assert!(doc.entry("broken").is_none());
    let second = doc.entry("Mueller2010-2").unwrap();
    let smith = second.get("author").unwrap().persons().next().unwrap();
    assert_eq!(smith.suffix, "Jr.");

    let severities: Vec<Severity> = diagnostics.iter().map(|d| d.severity).collect();
    assert_eq!(severities, vec![Severity::Error, Severity::Warning]);

    let properties = doc.properties();
    assert_eq!(properties.encoding, "LaTeX");
    assert_eq!(properties.string_delimiter, StringDelimiter::Braces);
    assert_eq!(properties.name_formatting, NameFormatting::LastFirst);
    assert_eq!(properties.protect_casing, ProtectCasing::Partial);
    assert_eq!(properties.comment_context, CommentContext::Prefix);
    assert_eq!(properties.comment_prefix, "%% ");
    assert_eq!(properties.list_separator.as_deref(), Some("; "));
    assert!(properties.sorted_by_id);
}

#[test]
fn test_empty_input_contract() {
    let mut sink = NullSink;
    assert!(matches!(parse_bytes(b"", &mut sink), Err(Error::EmptyInput)));
    assert!(matches!(
        parse_bytes(b"   \n  ", &mut sink),
        Err(Error::NoElements(_))
    ));

    let doc = parse_bytes(b"@comment{x}", &mut sink).unwrap();
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.comments().next().unwrap().text, "x");

    let doc = ParseOptions::new()
        .comment_handling(CommentHandling::Ignore)
        .parse_bytes(b"@comment{x}", &mut sink)
        .unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_single_malformed_entry_is_total_failure() {
    let mut diagnostics = Vec::new();
    let result = parse_str("@misc{a, title = {x} year = {1}}", &mut diagnostics);
    assert!(matches!(result, Err(Error::NoElements(_))));
    assert!(diagnostics.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn test_malformed_entry_then_valid_entry() {
    let mut diagnostics = Vec::new();
    let doc = parse_str(
        "@misc{a, title = {x} year = {1}}\n\n@misc{b, title = {y}}\n",
        &mut diagnostics,
    )
    .unwrap();
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.entries().count(), 1);
    assert!(doc.entry("b").is_some());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_field_routing() {
    let mut sink = NullSink;
    let doc = parse_str(
        "@misc{key, pages = \"12-34\", keywords = \"a; b;c\"}",
        &mut sink,
    )
    .unwrap();
    let entry = doc.entry("key").unwrap();
    assert_eq!(
        entry.get("pages").unwrap().0,
        vec![ValueItem::PlainText("12\u{2013}34".into())]
    );
    assert_eq!(entry.get("keywords").unwrap().len(), 3);
    assert_eq!(doc.properties().list_separator.as_deref(), Some("; "));
}

#[test]
fn test_title_protection_majority() {
    let corpus = |protected: usize, unprotected: usize| {
        let mut text = String::new();
        for i in 0..protected {
            text.push_str(&format!("@misc{{p{i}, title = {{{{Protected {i}}}}}}}\n"));
        }
        for i in 0..unprotected {
            text.push_str(&format!("@misc{{u{i}, title = {{Plain {i}}}}}\n"));
        }
        parse_str(&text, &mut NullSink).unwrap().properties().protect_casing
    };
    assert_eq!(corpus(9, 1), ProtectCasing::Checked);
    assert_eq!(corpus(5, 5), ProtectCasing::Partial);
    assert_eq!(corpus(1, 9), ProtectCasing::Unchecked);
}

#[test]
fn test_utf16_with_bom() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "@misc{a, title = {Grüße}}".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let (doc, _) = import(&bytes);
    assert_eq!(doc.properties().encoding, "UTF-16LE");
    assert_eq!(doc.entry("a").unwrap().get_as_string("title").unwrap(), "Grüße");
}

#[test]
fn test_western_fallback() {
    let (doc, _) = import(b"@misc{a, title = {M\xfcller}}");
    assert_eq!(doc.properties().encoding, "windows-1252");
    assert_eq!(doc.entry("a").unwrap().get_as_string("title").unwrap(), "Müller");
}

#[test]
fn test_html_tags_are_stripped() {
    let (doc, diagnostics) = import(b"<p>@misc{a, title={x}}</p>");
    assert!(doc.entry("a").is_some());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Info);
    assert_eq!(diagnostics[0].message, "Removed 7 characters of HTML tags");
}

#[test]
fn test_cancellation() {
    let flag = Arc::new(AtomicBool::new(true));
    let result = ParseOptions::new()
        .cancel_flag(flag)
        .parse_str("@misc{a}", &mut NullSink);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_progress_reports_every_element() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&calls);
    let input = "@misc{a}\n@misc{b}\n";
    ParseOptions::new()
        .progress(move |done, total| recorder.borrow_mut().push((done, total)))
        .parse_str(input, &mut NullSink)
        .unwrap();
    let calls = calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls.last(), Some(&(input.len(), input.len())));
}

#[test]
fn test_diagnostics_do_not_change_the_document() {
    let input = include_bytes!("fixtures/mixed.bib");
    let mut collected = Vec::new();
    let with_sink = parse_bytes(input, &mut collected).unwrap();
    let without_sink = parse_bytes(input, &mut NullSink).unwrap();
    assert_eq!(with_sink, without_sink);
    assert!(!collected.is_empty());
}

#[test]
fn test_document_serializes_to_json() {
    let (doc, _) = import(include_bytes!("fixtures/simple.bib"));
    let json = serde_json::to_value(&doc).unwrap();
    let restored: Document = serde_json::from_value(json).unwrap();
    assert_eq!(restored, doc);
}
