use bibtex_import::latex::{
    self,
    tables::{Direction, ESCAPED_CHARACTERS},
};
use bibtex_import::parser::{lexer::read_bracket_string, CharacterCursor};
use bibtex_import::{parse_str, NullSink};
use proptest::prelude::*;

fn accented() -> impl Strategy<Value = char> {
    let both: Vec<char> = ESCAPED_CHARACTERS
        .iter()
        .filter(|e| e.direction == Direction::Both)
        .map(|e| e.unicode)
        .collect();
    prop::sample::select(both)
}

/// Words made of ASCII letters and accented characters that have an escape
fn accented_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof!["[a-z ]{0,4}", accented().prop_map(String::from)],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

/// Brace-balanced text nested at most eight levels deep
fn balanced_text() -> impl Strategy<Value = String> {
    let leaf = "[a-z ,=]{0,6}";
    leaf.prop_recursive(8, 64, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|parts| format!("{{{}}}", parts.concat()))
    })
}

proptest! {
    #[test]
    fn test_decode_leaves_plain_text_alone(text in "[^\\\\{}$`'!?\"\\-]*") {
        prop_assert_eq!(latex::decode(&text), text);
    }

    #[test]
    fn test_encoded_accents_decode_back(text in accented_text()) {
        let encoded = latex::encode(&text);
        prop_assert!(encoded.is_ascii());
        prop_assert_eq!(latex::decode(&encoded), text);
    }

    #[test]
    fn test_bracket_string_finds_matching_close(content in balanced_text()) {
        let input = format!("{{{content}}} tail");
        let mut cursor = CharacterCursor::new(&input);
        prop_assert_eq!(read_bracket_string(&mut cursor), Some(content));
        prop_assert_eq!(cursor.rest(), " tail");
    }

    #[test]
    fn test_import_never_fails_on_entries(ids in prop::collection::vec("[a-z][a-z0-9]{0,8}", 1..8)) {
        let input: String = ids
            .iter()
            .map(|id| format!("@misc{{{id}, note = {{x}}}}\n"))
            .collect();
        let doc = parse_str(&input, &mut NullSink).unwrap();
        prop_assert_eq!(doc.entries().count(), ids.len());
    }
}
