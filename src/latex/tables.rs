//! Static translation tables between LaTeX escapes and Unicode
//!
//! Encoders and decoders consult the same rows; the [`Direction`] tag on
//! each row says which way it may be used.

use ahash::AHashMap;
use lazy_static::lazy_static;

/// Which translation direction a table row applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Only LaTeX to Unicode
    CommandToUnicode,
    /// Only Unicode to LaTeX
    UnicodeToCommand,
    /// Both ways
    Both,
}

impl Direction {
    /// Usable while decoding
    #[must_use]
    pub const fn decodes(self) -> bool {
        matches!(self, Self::CommandToUnicode | Self::Both)
    }

    /// Usable while encoding
    #[must_use]
    pub const fn encodes(self) -> bool {
        matches!(self, Self::UnicodeToCommand | Self::Both)
    }
}

/// Accent modifier applied to a base letter, like `\"a`
#[derive(Debug, Clone, Copy)]
pub struct EscapedCharacter {
    /// Modifier following the backslash
    pub modifier: char,
    /// ASCII base letter or digit
    pub letter: char,
    /// Resulting character
    pub unicode: char,
    /// Usable directions
    pub direction: Direction,
}

/// Accent on a dotless i or j, like `\'{\i}`
#[derive(Debug, Clone, Copy)]
pub struct DotlessCharacter {
    /// Modifier following the backslash
    pub modifier: char,
    /// `i` or `j`
    pub letter: char,
    /// Resulting character
    pub unicode: char,
    /// Usable directions
    pub direction: Direction,
}

/// Named command or symbol sequence for one character
#[derive(Debug, Clone, Copy)]
pub struct CharacterCommand {
    /// Command name without backslash, or the literal sequence
    pub command: &'static str,
    /// Resulting character
    pub unicode: char,
    /// Usable directions
    pub direction: Direction,
}

const fn esc(modifier: char, letter: char, unicode: char) -> EscapedCharacter {
    EscapedCharacter {
        modifier,
        letter,
        unicode,
        direction: Direction::Both,
    }
}

const fn esc_decode(modifier: char, letter: char, unicode: char) -> EscapedCharacter {
    EscapedCharacter {
        modifier,
        letter,
        unicode,
        direction: Direction::CommandToUnicode,
    }
}

const fn cmd(command: &'static str, unicode: char, direction: Direction) -> CharacterCommand {
    CharacterCommand {
        command,
        unicode,
        direction,
    }
}

const fn dotless(modifier: char, letter: char, unicode: char) -> DotlessCharacter {
    DotlessCharacter {
        modifier,
        letter,
        unicode,
        direction: Direction::Both,
    }
}

use Direction::{Both, CommandToUnicode, UnicodeToCommand};

/// Accent plus letter combinations
pub static ESCAPED_CHARACTERS: &[EscapedCharacter] = &[
    // grave
    esc('`', 'A', '\u{00C0}'),
    esc('`', 'E', '\u{00C8}'),
    esc('`', 'I', '\u{00CC}'),
    esc('`', 'O', '\u{00D2}'),
    esc('`', 'U', '\u{00D9}'),
    esc('`', 'a', '\u{00E0}'),
    esc('`', 'e', '\u{00E8}'),
    esc('`', 'o', '\u{00F2}'),
    esc('`', 'u', '\u{00F9}'),
    esc('`', 'N', '\u{01F8}'),
    esc('`', 'n', '\u{01F9}'),
    esc('`', 'W', '\u{1E80}'),
    esc('`', 'w', '\u{1E81}'),
    esc('`', 'Y', '\u{1EF2}'),
    esc('`', 'y', '\u{1EF3}'),
    // acute
    esc('\'', 'A', '\u{00C1}'),
    esc('\'', 'E', '\u{00C9}'),
    esc('\'', 'I', '\u{00CD}'),
    esc('\'', 'O', '\u{00D3}'),
    esc('\'', 'U', '\u{00DA}'),
    esc('\'', 'Y', '\u{00DD}'),
    esc('\'', 'a', '\u{00E1}'),
    esc('\'', 'e', '\u{00E9}'),
    esc('\'', 'o', '\u{00F3}'),
    esc('\'', 'u', '\u{00FA}'),
    esc('\'', 'y', '\u{00FD}'),
    esc('\'', 'C', '\u{0106}'),
    esc('\'', 'c', '\u{0107}'),
    esc('\'', 'L', '\u{0139}'),
    esc('\'', 'l', '\u{013A}'),
    esc('\'', 'N', '\u{0143}'),
    esc('\'', 'n', '\u{0144}'),
    esc('\'', 'R', '\u{0154}'),
    esc('\'', 'r', '\u{0155}'),
    esc('\'', 'S', '\u{015A}'),
    esc('\'', 's', '\u{015B}'),
    esc('\'', 'Z', '\u{0179}'),
    esc('\'', 'z', '\u{017A}'),
    esc('\'', 'G', '\u{01F4}'),
    esc('\'', 'g', '\u{01F5}'),
    esc('\'', 'W', '\u{1E82}'),
    esc('\'', 'w', '\u{1E83}'),
    // circumflex
    esc('^', 'A', '\u{00C2}'),
    esc('^', 'E', '\u{00CA}'),
    esc('^', 'I', '\u{00CE}'),
    esc('^', 'O', '\u{00D4}'),
    esc('^', 'U', '\u{00DB}'),
    esc('^', 'a', '\u{00E2}'),
    esc('^', 'e', '\u{00EA}'),
    esc('^', 'o', '\u{00F4}'),
    esc('^', 'u', '\u{00FB}'),
    esc('^', 'C', '\u{0108}'),
    esc('^', 'c', '\u{0109}'),
    esc('^', 'G', '\u{011C}'),
    esc('^', 'g', '\u{011D}'),
    esc('^', 'H', '\u{0124}'),
    esc('^', 'h', '\u{0125}'),
    esc('^', 'J', '\u{0134}'),
    esc('^', 'S', '\u{015C}'),
    esc('^', 's', '\u{015D}'),
    esc('^', 'W', '\u{0174}'),
    esc('^', 'w', '\u{0175}'),
    esc('^', 'Y', '\u{0176}'),
    esc('^', 'y', '\u{0177}'),
    // tilde
    esc('~', 'A', '\u{00C3}'),
    esc('~', 'N', '\u{00D1}'),
    esc('~', 'O', '\u{00D5}'),
    esc('~', 'a', '\u{00E3}'),
    esc('~', 'n', '\u{00F1}'),
    esc('~', 'o', '\u{00F5}'),
    esc('~', 'I', '\u{0128}'),
    esc('~', 'U', '\u{0168}'),
    esc('~', 'u', '\u{0169}'),
    // diaeresis
    esc('"', 'A', '\u{00C4}'),
    esc('"', 'E', '\u{00CB}'),
    esc('"', 'I', '\u{00CF}'),
    esc('"', 'O', '\u{00D6}'),
    esc('"', 'U', '\u{00DC}'),
    esc('"', 'a', '\u{00E4}'),
    esc('"', 'e', '\u{00EB}'),
    esc('"', 'o', '\u{00F6}'),
    esc('"', 'u', '\u{00FC}'),
    esc('"', 'y', '\u{00FF}'),
    esc('"', 'Y', '\u{0178}'),
    esc_decode('"', 's', '\u{00DF}'),
    // ring
    esc('r', 'A', '\u{00C5}'),
    esc('r', 'a', '\u{00E5}'),
    esc('r', 'U', '\u{016E}'),
    esc('r', 'u', '\u{016F}'),
    esc_decode('r', 'q', '\u{2019}'),
    // cedilla
    esc('c', 'C', '\u{00C7}'),
    esc('c', 'c', '\u{00E7}'),
    esc('c', 'G', '\u{0122}'),
    esc('c', 'g', '\u{0123}'),
    esc('c', 'K', '\u{0136}'),
    esc('c', 'k', '\u{0137}'),
    esc('c', 'L', '\u{013B}'),
    esc('c', 'l', '\u{013C}'),
    esc('c', 'N', '\u{0145}'),
    esc('c', 'n', '\u{0146}'),
    esc('c', 'R', '\u{0156}'),
    esc('c', 'r', '\u{0157}'),
    esc('c', 'S', '\u{015E}'),
    esc('c', 's', '\u{015F}'),
    esc('c', 'T', '\u{0162}'),
    esc('c', 't', '\u{0163}'),
    esc('c', 'E', '\u{0228}'),
    esc('c', 'e', '\u{0229}'),
    // macron
    esc('=', 'A', '\u{0100}'),
    esc('=', 'a', '\u{0101}'),
    esc('=', 'E', '\u{0112}'),
    esc('=', 'e', '\u{0113}'),
    esc('=', 'I', '\u{012A}'),
    esc('=', 'O', '\u{014C}'),
    esc('=', 'o', '\u{014D}'),
    esc('=', 'U', '\u{016A}'),
    esc('=', 'u', '\u{016B}'),
    esc('=', 'Y', '\u{0232}'),
    esc('=', 'y', '\u{0233}'),
    // breve
    esc('u', 'A', '\u{0102}'),
    esc('u', 'a', '\u{0103}'),
    esc('u', 'E', '\u{0114}'),
    esc('u', 'e', '\u{0115}'),
    esc('u', 'G', '\u{011E}'),
    esc('u', 'g', '\u{011F}'),
    esc('u', 'I', '\u{012C}'),
    esc('u', 'O', '\u{014E}'),
    esc('u', 'o', '\u{014F}'),
    esc('u', 'U', '\u{016C}'),
    esc('u', 'u', '\u{016D}'),
    // ogonek
    esc('k', 'A', '\u{0104}'),
    esc('k', 'a', '\u{0105}'),
    esc('k', 'E', '\u{0118}'),
    esc('k', 'e', '\u{0119}'),
    esc('k', 'I', '\u{012E}'),
    esc('k', 'U', '\u{0172}'),
    esc('k', 'u', '\u{0173}'),
    // caron
    esc('v', 'C', '\u{010C}'),
    esc('v', 'c', '\u{010D}'),
    esc('v', 'D', '\u{010E}'),
    esc('v', 'd', '\u{010F}'),
    esc('v', 'E', '\u{011A}'),
    esc('v', 'e', '\u{011B}'),
    esc('v', 'L', '\u{013D}'),
    esc('v', 'l', '\u{013E}'),
    esc('v', 'N', '\u{0147}'),
    esc('v', 'n', '\u{0148}'),
    esc('v', 'R', '\u{0158}'),
    esc('v', 'r', '\u{0159}'),
    esc('v', 'S', '\u{0160}'),
    esc('v', 's', '\u{0161}'),
    esc('v', 'T', '\u{0164}'),
    esc('v', 't', '\u{0165}'),
    esc('v', 'Z', '\u{017D}'),
    esc('v', 'z', '\u{017E}'),
    esc('v', 'A', '\u{01CD}'),
    esc('v', 'a', '\u{01CE}'),
    esc('v', 'I', '\u{01CF}'),
    esc('v', 'O', '\u{01D1}'),
    esc('v', 'o', '\u{01D2}'),
    esc('v', 'U', '\u{01D3}'),
    esc('v', 'u', '\u{01D4}'),
    esc('v', 'G', '\u{01E6}'),
    esc('v', 'g', '\u{01E7}'),
    esc('v', 'K', '\u{01E8}'),
    esc('v', 'k', '\u{01E9}'),
    // double acute
    esc('H', 'O', '\u{0150}'),
    esc('H', 'o', '\u{0151}'),
    esc('H', 'U', '\u{0170}'),
    esc('H', 'u', '\u{0171}'),
    // dot above
    esc('.', 'C', '\u{010A}'),
    esc('.', 'c', '\u{010B}'),
    esc('.', 'E', '\u{0116}'),
    esc('.', 'e', '\u{0117}'),
    esc('.', 'G', '\u{0120}'),
    esc('.', 'g', '\u{0121}'),
    esc('.', 'I', '\u{0130}'),
    esc('.', 'Z', '\u{017B}'),
    esc('.', 'z', '\u{017C}'),
    // dot below
    esc('d', 'A', '\u{1EA0}'),
    esc('d', 'a', '\u{1EA1}'),
    esc('d', 'E', '\u{1EB8}'),
    esc('d', 'e', '\u{1EB9}'),
    esc('d', 'I', '\u{1ECA}'),
    esc('d', 'O', '\u{1ECC}'),
    esc('d', 'o', '\u{1ECD}'),
    esc('d', 'U', '\u{1EE4}'),
    esc('d', 'u', '\u{1EE5}'),
    esc('d', 'Y', '\u{1EF4}'),
    esc('d', 'y', '\u{1EF5}'),
];

/// Accents on dotless i and j; the plain accent table cannot address `\i`
pub static DOTLESS_CHARACTERS: &[DotlessCharacter] = &[
    dotless('`', 'i', '\u{00EC}'),
    dotless('\'', 'i', '\u{00ED}'),
    dotless('^', 'i', '\u{00EE}'),
    dotless('"', 'i', '\u{00EF}'),
    dotless('~', 'i', '\u{0129}'),
    dotless('=', 'i', '\u{012B}'),
    dotless('u', 'i', '\u{012D}'),
    dotless('k', 'i', '\u{012F}'),
    dotless('^', 'j', '\u{0135}'),
    dotless('v', 'i', '\u{01D0}'),
    dotless('v', 'j', '\u{01F0}'),
];

/// Whole-glyph commands like `\AA` or `\ss`
pub static CHARACTER_COMMANDS: &[CharacterCommand] = &[
    cmd("pounds", '\u{00A3}', Both),
    cmd("S", '\u{00A7}', Both),
    cmd("textsection", '\u{00A7}', CommandToUnicode),
    cmd("copyright", '\u{00A9}', Both),
    cmd("textregistered", '\u{00AE}', Both),
    cmd("textdegree", '\u{00B0}', Both),
    cmd("P", '\u{00B6}', Both),
    cmd("textperiodcentered", '\u{00B7}', Both),
    cmd("AA", '\u{00C5}', Both),
    cmd("AE", '\u{00C6}', Both),
    cmd("DH", '\u{00D0}', Both),
    cmd("O", '\u{00D8}', Both),
    cmd("TH", '\u{00DE}', Both),
    cmd("ss", '\u{00DF}', Both),
    cmd("aa", '\u{00E5}', Both),
    cmd("ae", '\u{00E6}', Both),
    cmd("dh", '\u{00F0}', Both),
    cmd("o", '\u{00F8}', Both),
    cmd("th", '\u{00FE}', Both),
    cmd("DJ", '\u{0110}', Both),
    cmd("dj", '\u{0111}', Both),
    cmd("i", '\u{0131}', Both),
    cmd("IJ", '\u{0132}', Both),
    cmd("ij", '\u{0133}', Both),
    cmd("L", '\u{0141}', Both),
    cmd("l", '\u{0142}', Both),
    cmd("NG", '\u{014A}', Both),
    cmd("ng", '\u{014B}', Both),
    cmd("OE", '\u{0152}', Both),
    cmd("oe", '\u{0153}', Both),
    cmd("j", '\u{0237}', Both),
    cmd("textendash", '\u{2013}', CommandToUnicode),
    cmd("textemdash", '\u{2014}', CommandToUnicode),
    cmd("lq", '\u{2018}', Both),
    cmd("rq", '\u{2019}', Both),
    cmd("grqq", '\u{201C}', CommandToUnicode),
    cmd("textquotedblleft", '\u{201C}', CommandToUnicode),
    cmd("rqq", '\u{201D}', CommandToUnicode),
    cmd("textquotedblright", '\u{201D}', CommandToUnicode),
    cmd("glqq", '\u{201E}', Both),
    cmd("flqq", '\u{00AB}', CommandToUnicode),
    cmd("frqq", '\u{00BB}', CommandToUnicode),
    cmd("dag", '\u{2020}', Both),
    cmd("ddag", '\u{2021}', Both),
    cmd("ldots", '\u{2026}', Both),
    cmd("dots", '\u{2026}', CommandToUnicode),
    cmd("textellipsis", '\u{2026}', CommandToUnicode),
    cmd("texteuro", '\u{20AC}', Both),
    cmd("euro", '\u{20AC}', CommandToUnicode),
];

/// Math-mode symbols; in text mode they need `\ensuremath{...}`
pub static MATH_COMMANDS: &[CharacterCommand] = &[
    cmd("pm", '\u{00B1}', Both),
    cmd("times", '\u{00D7}', Both),
    cmd("Gamma", '\u{0393}', Both),
    cmd("Delta", '\u{0394}', Both),
    cmd("Theta", '\u{0398}', Both),
    cmd("Lambda", '\u{039B}', Both),
    cmd("Xi", '\u{039E}', Both),
    cmd("Pi", '\u{03A0}', Both),
    cmd("Sigma", '\u{03A3}', Both),
    cmd("Phi", '\u{03A6}', Both),
    cmd("Psi", '\u{03A8}', Both),
    cmd("Omega", '\u{03A9}', Both),
    cmd("alpha", '\u{03B1}', Both),
    cmd("beta", '\u{03B2}', Both),
    cmd("gamma", '\u{03B3}', Both),
    cmd("delta", '\u{03B4}', Both),
    cmd("varepsilon", '\u{03B5}', Both),
    cmd("zeta", '\u{03B6}', Both),
    cmd("eta", '\u{03B7}', Both),
    cmd("theta", '\u{03B8}', Both),
    cmd("iota", '\u{03B9}', Both),
    cmd("kappa", '\u{03BA}', Both),
    cmd("lambda", '\u{03BB}', Both),
    cmd("mu", '\u{03BC}', Both),
    cmd("nu", '\u{03BD}', Both),
    cmd("xi", '\u{03BE}', Both),
    cmd("pi", '\u{03C0}', Both),
    cmd("rho", '\u{03C1}', Both),
    cmd("sigma", '\u{03C3}', Both),
    cmd("tau", '\u{03C4}', Both),
    cmd("upsilon", '\u{03C5}', Both),
    cmd("varphi", '\u{03C6}', Both),
    cmd("chi", '\u{03C7}', Both),
    cmd("psi", '\u{03C8}', Both),
    cmd("omega", '\u{03C9}', Both),
    cmd("phi", '\u{03D5}', Both),
    cmd("epsilon", '\u{03F5}', Both),
    cmd("ell", '\u{2113}', Both),
    cmd("leftarrow", '\u{2190}', Both),
    cmd("rightarrow", '\u{2192}', Both),
    cmd("forall", '\u{2200}', Both),
    cmd("partial", '\u{2202}', Both),
    cmd("exists", '\u{2203}', Both),
    cmd("nabla", '\u{2207}', Both),
    cmd("in", '\u{2208}', Both),
    cmd("ni", '\u{220B}', Both),
    cmd("asterisk", '\u{2217}', Both),
    cmd("infty", '\u{221E}', Both),
    cmd("approx", '\u{2248}', Both),
    cmd("neq", '\u{2260}', Both),
    cmd("leq", '\u{2264}', Both),
    cmd("geq", '\u{2265}', Both),
    cmd("subset", '\u{2282}', Both),
    cmd("supset", '\u{2283}', Both),
    cmd("subseteq", '\u{2286}', Both),
    cmd("supseteq", '\u{2287}', Both),
    cmd("nsubseteq", '\u{2288}', Both),
    cmd("nsupseteq", '\u{2289}', Both),
    cmd("subsetneq", '\u{228A}', Both),
    cmd("supsetneq", '\u{228B}', Both),
    cmd("top", '\u{22A4}', Both),
    cmd("cdot", '\u{22C5}', Both),
    cmd("Subset", '\u{22D0}', Both),
    cmd("Supset", '\u{22D1}', Both),
];

/// Symbol sequences outside of commands; ligatures only encode
pub static SYMBOL_SEQUENCES: &[CharacterCommand] = &[
    cmd("!`", '\u{00A1}', Both),
    cmd("\"<", '\u{00AB}', Both),
    cmd("\">", '\u{00BB}', Both),
    cmd("?`", '\u{00BF}', Both),
    cmd("---", '\u{2014}', Both),
    cmd("--", '\u{2013}', Both),
    cmd("``", '\u{201C}', Both),
    cmd("''", '\u{201D}', Both),
    cmd("ff", '\u{FB00}', UnicodeToCommand),
    cmd("fi", '\u{FB01}', UnicodeToCommand),
    cmd("fl", '\u{FB02}', UnicodeToCommand),
    cmd("ffi", '\u{FB03}', UnicodeToCommand),
    cmd("ffl", '\u{FB04}', UnicodeToCommand),
    cmd("ft", '\u{FB05}', UnicodeToCommand),
    cmd("st", '\u{FB06}', UnicodeToCommand),
];

/// Characters that are escaped with a backslash everywhere
pub const PROTECTED_SYMBOLS: [char; 3] = ['#', '&', '%'];

/// Characters that are escaped with a backslash in text mode only
pub const PROTECTED_TEXT_ONLY_SYMBOLS: [char; 1] = ['_'];

/// `\,` in LaTeX
pub const THIN_SPACE: char = '\u{2009}';

const LOOKUP_TABLE_NUM_MODIFIERS: usize = 32;
const LOOKUP_TABLE_NUM_CHARACTERS: usize = 62;

/// Slot of a base character in a lookup row: A-Z, a-z, then 0-9
#[must_use]
pub const fn base_slot(c: char) -> Option<usize> {
    match c {
        'A'..='Z' => Some(c as usize - 'A' as usize),
        'a'..='z' => Some(26 + c as usize - 'a' as usize),
        '0'..='9' => Some(52 + c as usize - '0' as usize),
        _ => None,
    }
}

const fn slot_base(slot: usize) -> char {
    // slot is always < 62 here
    let byte = match slot {
        0..=25 => b'A' + slot as u8,
        26..=51 => b'a' + (slot - 26) as u8,
        _ => b'0' + (slot - 52) as u8,
    };
    byte as char
}

/// One modifier's row: base slot to resulting character
#[derive(Debug)]
pub struct LookupRow {
    /// The modifier of this row
    pub modifier: char,
    /// Identity-seeded translation for every base slot
    pub unicode: [char; LOOKUP_TABLE_NUM_CHARACTERS],
}

/// Modifier-indexed view of [`ESCAPED_CHARACTERS`] for decoding
#[derive(Debug)]
pub struct LookupTable {
    rows: Vec<LookupRow>,
}

impl LookupTable {
    fn build() -> Self {
        let mut rows: Vec<LookupRow> = Vec::with_capacity(LOOKUP_TABLE_NUM_MODIFIERS);
        // Reverse walk so the first row of the table wins on conflicts
        for escaped in ESCAPED_CHARACTERS.iter().rev() {
            if !escaped.direction.decodes() {
                continue;
            }
            let Some(slot) = base_slot(escaped.letter) else {
                tracing::warn!(letter = %escaped.letter, "Cannot handle letter in accent table");
                continue;
            };
            let row = match rows.iter().position(|r| r.modifier == escaped.modifier) {
                Some(pos) => pos,
                None if rows.len() < LOOKUP_TABLE_NUM_MODIFIERS => {
                    let mut unicode = ['\0'; LOOKUP_TABLE_NUM_CHARACTERS];
                    for (k, slot_char) in unicode.iter_mut().enumerate() {
                        *slot_char = slot_base(k);
                    }
                    rows.push(LookupRow {
                        modifier: escaped.modifier,
                        unicode,
                    });
                    rows.len() - 1
                }
                None => {
                    tracing::warn!(modifier = %escaped.modifier, "Accent lookup table is full");
                    continue;
                }
            };
            rows[row].unicode[slot] = escaped.unicode;
        }
        Self { rows }
    }

    /// Row index of a modifier, if any accent uses it
    #[must_use]
    pub fn modifier_row(&self, modifier: char) -> Option<usize> {
        self.rows.iter().position(|r| r.modifier == modifier)
    }

    /// Whether `c` is a known accent modifier
    #[must_use]
    pub fn is_modifier(&self, c: char) -> bool {
        self.modifier_row(c).is_some()
    }

    /// Translation of modifier plus base, identity when unknown
    #[must_use]
    pub fn lookup(&self, modifier: char, base: char) -> Option<char> {
        let row = self.modifier_row(modifier)?;
        let slot = base_slot(base)?;
        Some(self.rows[row].unicode[slot])
    }

    /// Number of modifier rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows exist
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

lazy_static! {
    /// Accent lookup table, built once on first use and read-only afterwards
    pub static ref LOOKUP_TABLE: LookupTable = LookupTable::build();

    static ref DECODE_CHARACTER_COMMANDS: AHashMap<&'static str, char> =
        decoding_map(CHARACTER_COMMANDS);

    static ref DECODE_MATH_COMMANDS: AHashMap<&'static str, char> = decoding_map(MATH_COMMANDS);

    /// Decodable symbol sequences, longest first
    pub static ref DECODE_SYMBOL_SEQUENCES: Vec<(Vec<char>, char)> = {
        let mut sequences: Vec<(Vec<char>, char)> = SYMBOL_SEQUENCES
            .iter()
            .filter(|s| s.direction.decodes())
            .map(|s| (s.command.chars().collect(), s.unicode))
            .collect();
        sequences.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        sequences
    };
}

fn decoding_map(table: &'static [CharacterCommand]) -> AHashMap<&'static str, char> {
    let mut map = AHashMap::with_capacity(table.len());
    for command in table.iter().filter(|c| c.direction.decodes()) {
        map.entry(command.command).or_insert(command.unicode);
    }
    map
}

/// Character for a whole-glyph command name
#[must_use]
pub fn character_command(name: &str) -> Option<char> {
    DECODE_CHARACTER_COMMANDS.get(name).copied()
}

/// Character for a math command name
#[must_use]
pub fn math_command(name: &str) -> Option<char> {
    DECODE_MATH_COMMANDS.get(name).copied()
}

/// Character for an accent on a dotless letter
#[must_use]
pub fn dotless_character(modifier: char, letter: char) -> Option<char> {
    DOTLESS_CHARACTERS
        .iter()
        .find(|d| d.direction.decodes() && d.modifier == modifier && d.letter == letter)
        .map(|d| d.unicode)
}
