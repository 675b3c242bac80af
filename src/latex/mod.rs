//! Bidirectional translation between LaTeX escapes and Unicode
//!
//! Decoding is total: text that cannot be interpreted is copied unchanged.
//! The tables behind both directions are immutable and built on first use,
//! so concurrent imports share them without locking.
//!
//! ```
//! use bibtex_import::latex;
//!
//! assert_eq!(latex::decode("Kr\\\"uger"), "Krüger");
//! assert_eq!(latex::decode("{\\AA}ngstr{\\\"o}m"), "Ångström");
//! assert_eq!(latex::encode("Erdős"), "Erd\\H{o}s");
//! ```

mod decode;
mod encode;
pub mod tables;

pub use decode::decode;
pub use encode::{contains_only_ascii, encode, encode_to_ascii, to_plain_ascii};

#[cfg(test)]
mod tests {
    use super::tables::{Direction, DOTLESS_CHARACTERS, ESCAPED_CHARACTERS};
    use super::*;

    #[test]
    fn test_accent_round_trip() {
        for escaped in ESCAPED_CHARACTERS {
            if escaped.direction != Direction::Both {
                continue;
            }
            let unicode = escaped.unicode.to_string();
            assert_eq!(decode(&encode(&unicode)), unicode, "{:?}", escaped);

            let braced = format!("{{\\{}{}}}", escaped.modifier, escaped.letter);
            let bare = format!("\\{}{}", escaped.modifier, escaped.letter);
            assert_eq!(decode(&braced), decode(&bare), "{braced} vs {bare}");
        }
    }

    #[test]
    fn test_dotless_round_trip() {
        for dotless in DOTLESS_CHARACTERS {
            let unicode = dotless.unicode.to_string();
            assert_eq!(decode(&encode(&unicode)), unicode);
        }
    }

    #[test]
    fn test_encode_to_ascii() {
        assert_eq!(encode_to_ascii("Müller"), "M\\\"{u}ller");
        assert_eq!(encode_to_ascii("日本"), "??");
    }
}
