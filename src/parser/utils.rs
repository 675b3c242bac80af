//! Parser utilities

use memchr::memchr;
use winnow::ascii::{alpha1, multispace0};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::one_of;

/// Internal parser result type
pub type PResult<O> = winnow::PResult<O, ContextError>;

pub(crate) fn backtrack<O>() -> PResult<O> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Case-insensitive tag parser
#[must_use]
pub fn tag_no_case<'a>(tag: &'static str) -> impl Parser<&'a str, &'a str, ContextError> {
    move |input: &mut &'a str| {
        let tag_len = tag.len();
        match input.get(..tag_len) {
            Some(start) if start.eq_ignore_ascii_case(tag) => {
                *input = &input[tag_len..];
                Ok(start)
            }
            _ => backtrack(),
        }
    }
}

/// Whether `input` begins like `@type{` or `@type (`
#[must_use]
pub fn looks_like_element_start(mut input: &str) -> bool {
    let result: PResult<_> = ('@', alpha1, multispace0, one_of(['{', '('])).parse_next(&mut input);
    result.is_ok()
}

/// Byte offset of the next `@` in `text` that starts an element
#[must_use]
pub fn find_element_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while let Some(offset) = memchr(b'@', &bytes[pos..]) {
        let at = pos + offset;
        if looks_like_element_start(&text[at..]) {
            return Some(at);
        }
        pos = at + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_no_case() {
        let mut input = "ARTICLE{...}";
        let result = tag_no_case("article").parse_next(&mut input).unwrap();
        assert_eq!(result, "ARTICLE");
        assert_eq!(input, "{...}");

        let mut input = "Art";
        assert!(tag_no_case("article").parse_next(&mut input).is_err());
    }

    #[test]
    fn test_element_start() {
        assert!(looks_like_element_start("@article{key,"));
        assert!(looks_like_element_start("@Book (key,"));
        assert!(!looks_like_element_start("@x.org is my domain"));
        assert!(!looks_like_element_start("me@x"));
    }

    #[test]
    fn test_find_element_start() {
        assert_eq!(find_element_start("x = {1}}\n\n@misc{b}"), Some(10));
        assert_eq!(find_element_start("mail me@host.org @Book (k"), Some(17));
        assert_eq!(find_element_start("year = {2001}}"), None);
    }
}
