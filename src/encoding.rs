//! Byte-level encoding detection and text preparation
//!
//! Detection runs in a fixed priority order: byte-order mark, zero-byte
//! pattern of unmarked UTF-16/UTF-32, in-band directive, UTF-8 validity scan
//! and finally a single-byte Western code page. Undecodable bytes become
//! U+FFFD; nothing here fails.

use crate::error::{emit, Diagnostic, DiagnosticSink, Severity};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use lazy_static::lazy_static;
use memchr::memchr;
use regex::Regex;
use std::borrow::Cow;

/// Bytes inspected for zero-byte patterns and UTF-8 validity
const SNIFF_PREFIX_LEN: usize = 8192;

/// Pseudo-encoding for 7-bit input whose non-ASCII text is LaTeX-escaped
pub const LATEX_ENCODING: &str = "LaTeX";

const KBIBTEX_ENCODING_DIRECTIVE: &str = "@comment{x-kbibtex-encoding=";
const JABREF_ENCODING_DIRECTIVE: &str = "% encoding:";

lazy_static! {
    static ref KBIBTEX_ENCODING: Regex =
        Regex::new(r"(?i)@comment\{x-kbibtex-encoding=[^}]*\}").unwrap();
    static ref PERSON_NAME_FORMATTING: Regex =
        Regex::new(r"(?i)@comment\{x-kbibtex-personnameformatting=[^}]*\}").unwrap();
    static ref HTML_TAG: Regex =
        Regex::new(r"(?i)</?(a|pre|p|br|span|i|b|italic)\b[^>{}]{0,32}>").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Standard(&'static Encoding),
    Utf32 { big_endian: bool },
}

/// Outcome of encoding detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Name reported in the document properties
    pub name: String,
    codec: Codec,
    /// Length of a byte-order mark to skip
    bom_len: usize,
}

impl Detection {
    fn new(name: impl Into<String>, codec: Codec, bom_len: usize) -> Self {
        Self {
            name: name.into(),
            codec,
            bom_len,
        }
    }

    fn standard(encoding: &'static Encoding) -> Self {
        Self::new(encoding.name(), Codec::Standard(encoding), 0)
    }
}

/// Decoded input text together with the encoding used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Unicode text
    pub text: String,
    /// Encoding name, `LaTeX` for pure 7-bit input
    pub encoding: String,
}

/// Detect the encoding of `bytes` and decode them
pub fn sniff(bytes: &[u8], sink: &mut dyn DiagnosticSink) -> DecodedText {
    let detection = detect(bytes, sink);
    let payload = &bytes[detection.bom_len.min(bytes.len())..];
    let text = match detection.codec {
        Codec::Utf32 { big_endian } => decode_utf32(payload, big_endian),
        Codec::Standard(encoding) => {
            let (text, had_errors) = encoding.decode_without_bom_handling(payload);
            if had_errors {
                emit(
                    sink,
                    Diagnostic::new(
                        Severity::Warning,
                        format!("Input contains bytes invalid in {}, replaced them", detection.name),
                    ),
                );
            }
            text.into_owned()
        }
    };
    tracing::debug!(encoding = %detection.name, "Decoded input");
    DecodedText {
        text,
        encoding: detection.name,
    }
}

/// Determine the encoding of `bytes`
pub fn detect(bytes: &[u8], sink: &mut dyn DiagnosticSink) -> Detection {
    if let Some(detection) = detect_bom(bytes) {
        return detection;
    }

    let prefix = &bytes[..bytes.len().min(SNIFF_PREFIX_LEN)];
    if let Some(detection) = detect_zero_pattern(prefix) {
        return detection;
    }

    if let Some(label) = find_directive(bytes) {
        return resolve_label(&label, sink);
    }

    match std::str::from_utf8(prefix) {
        Ok(valid) if valid.is_ascii() => Detection::new(LATEX_ENCODING, Codec::Standard(UTF_8), 0),
        Ok(_) => Detection::standard(UTF_8),
        // A multi-byte sequence cut off by the prefix boundary
        Err(e) if e.error_len().is_none() && prefix.len() < bytes.len() => {
            Detection::standard(UTF_8)
        }
        Err(_) => {
            if !has_isolated_high_byte(prefix) {
                emit(
                    sink,
                    Diagnostic::new(
                        Severity::Warning,
                        "Could not determine encoding with confidence, assuming windows-1252",
                    ),
                );
            }
            Detection::standard(WINDOWS_1252)
        }
    }
}

fn detect_bom(bytes: &[u8]) -> Option<Detection> {
    // UTF-32LE must be tested before UTF-16LE, they share a prefix
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        Some(Detection::new("UTF-32LE", Codec::Utf32 { big_endian: false }, 4))
    } else if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        Some(Detection::new("UTF-32BE", Codec::Utf32 { big_endian: true }, 4))
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(Detection::new(UTF_8.name(), Codec::Standard(UTF_8), 3))
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some(Detection::new(UTF_16LE.name(), Codec::Standard(UTF_16LE), 2))
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some(Detection::new(UTF_16BE.name(), Codec::Standard(UTF_16BE), 2))
    } else {
        None
    }
}

/// Unmarked UTF-16/UTF-32 text in a Latin script has zero bytes at fixed strides
fn detect_zero_pattern(prefix: &[u8]) -> Option<Detection> {
    memchr(0, prefix)?;

    let quads: Vec<&[u8]> = prefix.chunks_exact(4).collect();
    if !quads.is_empty() {
        if quads.iter().all(|q| q[2] == 0 && q[3] == 0) && quads.iter().any(|q| q[0] != 0) {
            return Some(Detection::new("UTF-32LE", Codec::Utf32 { big_endian: false }, 0));
        }
        if quads.iter().all(|q| q[0] == 0 && q[1] == 0) && quads.iter().any(|q| q[3] != 0) {
            return Some(Detection::new("UTF-32BE", Codec::Utf32 { big_endian: true }, 0));
        }
    }

    let pairs = prefix.len() / 2;
    if pairs == 0 {
        return None;
    }
    let (even_zeros, odd_zeros) = prefix
        .chunks_exact(2)
        .fold((0usize, 0usize), |(even, odd), pair| {
            (even + usize::from(pair[0] == 0), odd + usize::from(pair[1] == 0))
        });
    if odd_zeros * 2 > pairs && even_zeros * 10 < pairs {
        Some(Detection::standard(UTF_16LE))
    } else if even_zeros * 2 > pairs && odd_zeros * 10 < pairs {
        Some(Detection::standard(UTF_16BE))
    } else {
        None
    }
}

/// Encoding label of the first in-band directive, if any
fn find_directive(bytes: &[u8]) -> Option<String> {
    bytes
        .split(|&b| b == b'\n')
        .filter(|line| {
            matches!(
                line.iter().find(|b| !b.is_ascii_whitespace()),
                Some(b'@' | b'%')
            )
        })
        .find_map(|line| directive_label(&String::from_utf8_lossy(line)))
}

/// Encoding label declared by a directive line
///
/// Text after the closing brace of a `@comment{x-kbibtex-encoding=...}`
/// directive does not matter.
fn directive_label(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with(KBIBTEX_ENCODING_DIRECTIVE) {
        let tail = &trimmed[KBIBTEX_ENCODING_DIRECTIVE.len()..];
        let end = tail.find('}')?;
        Some(tail[..end].trim().to_string())
    } else if lower.starts_with(JABREF_ENCODING_DIRECTIVE) {
        Some(trimmed[JABREF_ENCODING_DIRECTIVE.len()..].trim().to_string())
    } else {
        None
    }
}

/// Lines removed as a whole: `% Encoding:` directives and XML declarations
fn is_dropped_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("<?xml")
        || trimmed
            .get(..JABREF_ENCODING_DIRECTIVE.len())
            .is_some_and(|start| start.eq_ignore_ascii_case(JABREF_ENCODING_DIRECTIVE))
}

fn resolve_label(label: &str, sink: &mut dyn DiagnosticSink) -> Detection {
    if label.eq_ignore_ascii_case("latex") {
        return Detection::new(LATEX_ENCODING, Codec::Standard(UTF_8), 0);
    }
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => Detection::standard(encoding),
        None => {
            emit(
                sink,
                Diagnostic::new(
                    Severity::Warning,
                    format!("Unknown encoding '{label}' declared, using UTF-8"),
                ),
            );
            Detection::standard(UTF_8)
        }
    }
}

/// A high-bit byte with 7-bit neighbors on both sides
fn has_isolated_high_byte(bytes: &[u8]) -> bool {
    bytes
        .windows(3)
        .any(|w| w[0] < 0x80 && w[1] >= 0x80 && w[2] < 0x80)
}

fn decode_utf32(bytes: &[u8], big_endian: bool) -> String {
    let chunks = bytes.chunks_exact(4);
    let trailing = !chunks.remainder().is_empty();
    let mut text: String = chunks
        .map(|c| {
            let quad = [c[0], c[1], c[2], c[3]];
            let value = if big_endian {
                u32::from_be_bytes(quad)
            } else {
                u32::from_le_bytes(quad)
            };
            char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();
    if trailing {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

/// Remove directives and foreign markup from decoded text before parsing
///
/// `% Encoding:` lines and XML declarations are dropped. Encoding and
/// deprecated name-formatting comments are deleted wherever they occur, and
/// simple HTML tags are stripped (reported as `Info`).
pub fn prepare_text<'a>(text: &'a str, sink: &mut dyn DiagnosticSink) -> Cow<'a, str> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut result: Cow<'a, str> = Cow::Borrowed(text);

    if text.lines().any(is_dropped_line) {
        result = Cow::Owned(
            text.split_inclusive('\n')
                .filter(|l| !is_dropped_line(l))
                .collect(),
        );
    }

    for internal in [&*KBIBTEX_ENCODING, &*PERSON_NAME_FORMATTING] {
        if internal.is_match(&result) {
            result = Cow::Owned(internal.replace_all(&result, "").into_owned());
        }
    }

    if HTML_TAG.is_match(&result) {
        let before = result.chars().count();
        let stripped = HTML_TAG.replace_all(&result, "").into_owned();
        let removed = before - stripped.chars().count();
        emit(
            sink,
            Diagnostic::new(
                Severity::Info,
                format!("Removed {removed} characters of HTML tags"),
            ),
        );
        result = Cow::Owned(stripped);
    }

    result
}
