//! Reversible escaping of lemmas and sense keys into XML identifiers.
//!
//! Two strategies implement [`Escaper`]: the historical [`LegacyEscaper`] with a
//! handful of digraphs, and [`DashEscaper`] with entity-style names such as
//! `-lpar-`. The dash strategy unescapes in one left-to-right scan, so a doubled
//! dash (`--`) is consumed as a literal dash before any named escape can match.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::CodecError;
use crate::xml_id::is_xml_id_char;

pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Escaping strategy for lemmas and sense keys.
pub trait Escaper {
    /// Escapes a lemma for use inside an entry id.
    fn escape_lemma(&self, lemma: &str) -> CodecResult<String>;

    fn unescape_lemma(&self, escaped: &str) -> String;

    /// Escapes the lemma and head word parts of a sense key.
    fn escape_sensekey_lemma(&self, lemma: &str) -> CodecResult<String>;

    fn unescape_sensekey_lemma(&self, escaped: &str) -> String;

    /// Replacement for `%`.
    fn main_separator(&self) -> &str;

    /// Replacement for `:`.
    fn minor_separator(&self) -> &str;

    fn escape_sensekey(&self, sensekey: &str) -> CodecResult<String> {
        let (lemma, lex_sense) = split_at_last(sensekey, "%")?;
        let mut fields = split_fields(sensekey, lex_sense, ":")?;
        if !fields[3].is_empty() {
            fields[3] = self.escape_sensekey_lemma(&fields[3])?;
        }
        Ok(format!(
            "{}{}{}",
            self.escape_sensekey_lemma(lemma)?,
            self.main_separator(),
            fields.join(self.minor_separator())
        ))
    }

    fn unescape_sensekey(&self, escaped: &str) -> CodecResult<String> {
        let (lemma, lex_sense) = split_at_last(escaped, self.main_separator())?;
        let mut fields = split_fields(escaped, lex_sense, self.minor_separator())?;
        if !fields[3].is_empty() {
            fields[3] = self.unescape_sensekey_lemma(&fields[3]);
        }
        Ok(format!(
            "{}%{}",
            self.unescape_sensekey_lemma(lemma),
            fields.join(":")
        ))
    }
}

/// Splits at the last occurrence of `separator`.
pub fn split_at_last<'a>(s: &'a str, separator: &str) -> CodecResult<(&'a str, &'a str)> {
    s.rfind(separator)
        .map(|cut| (&s[..cut], &s[cut + separator.len()..]))
        .ok_or_else(|| CodecError::MissingSeparator {
            separator: separator.to_string(),
            input: s.to_string(),
        })
}

fn split_fields(key: &str, lex_sense: &str, separator: &str) -> CodecResult<Vec<String>> {
    let fields: Vec<String> = lex_sense.split(separator).map(String::from).collect();
    if fields.len() != 5 {
        return Err(CodecError::FieldCount {
            input: key.to_string(),
            count: fields.len(),
        });
    }
    Ok(fields)
}

fn lookup(table: &[(char, &'static str)], c: char) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == c).map(|(_, v)| *v)
}

fn replace_in_reverse(table: &[(char, &'static str)], escaped: &str) -> String {
    let mut s = escaped.to_string();
    for &(c, seq) in table.iter().rev() {
        s = s.replace(seq, c.encode_utf8(&mut [0; 4]));
    }
    s
}

// --- Legacy ---

const LEGACY_LEMMA_ESCAPES: &[(char, &str)] = &[
    (' ', "_"),
    ('(', "-lb-"),
    (')', "-rb-"),
    ('\'', "-ap-"),
    ('/', "-sl-"),
    (':', "-cn-"),
    (',', "-cm-"),
    ('!', "-ex-"),
    ('+', "-pl-"),
];

const LEGACY_SENSEKEY_ESCAPES: &[(char, &str)] = &[
    ('\'', "-ap-"),
    ('/', "-sl-"),
    ('!', "-ex-"),
    (',', "-cm-"),
    (':', "-cn-"),
    ('+', "-pl-"),
];

/// Digraph escaping used by early OEWN releases. Separators are `__` and `.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyEscaper;

impl LegacyEscaper {
    fn escape_with(table: &[(char, &'static str)], text: &str) -> CodecResult<String> {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii_alphanumeric() || c == '.' {
                out.push(c);
            } else if let Some(seq) = lookup(table, c) {
                out.push_str(seq);
            } else if is_xml_id_char(c) {
                out.push(c);
            } else {
                return Err(CodecError::illegal(c, text));
            }
        }
        Ok(out)
    }
}

impl Escaper for LegacyEscaper {
    fn escape_lemma(&self, lemma: &str) -> CodecResult<String> {
        Self::escape_with(LEGACY_LEMMA_ESCAPES, lemma)
    }

    fn unescape_lemma(&self, escaped: &str) -> String {
        replace_in_reverse(LEGACY_LEMMA_ESCAPES, escaped)
    }

    fn escape_sensekey_lemma(&self, lemma: &str) -> CodecResult<String> {
        Self::escape_with(LEGACY_SENSEKEY_ESCAPES, lemma)
    }

    fn unescape_sensekey_lemma(&self, escaped: &str) -> String {
        replace_in_reverse(LEGACY_SENSEKEY_ESCAPES, escaped)
    }

    fn main_separator(&self) -> &str {
        "__"
    }

    fn minor_separator(&self) -> &str {
        "."
    }
}

// --- Dash ---

/// Named escapes shared by lemmas and sense keys.
const BASE_ESCAPES: &[(char, &str)] = &[
    ('\'', "-apos-"),
    ('`', "-grave-"),
    ('´', "-acute-"),
    ('‘', "-lsquo-"),
    ('’', "-rsquo-"),
    ('(', "-lpar-"),
    (')', "-rpar-"),
    ('[', "-lsqb-"),
    (']', "-rsqb-"),
    ('{', "-lbrace-"),
    ('}', "-rbrace-"),
    (',', "-comma-"),
    (';', "-semi-"),
    ('=', "-equals-"),
    ('+', "-plus-"),
    ('!', "-excl-"),
    ('?', "-quest-"),
    ('@', "-commat-"),
    ('#', "-num-"),
    ('%', "-percnt-"),
    ('&', "-amp-"),
    ('§', "-sect-"),
    ('¶', "-para-"),
    ('/', "-sol-"),
    ('\\', "-bsol-"),
    ('|', "-vert-"),
    ('^', "-Hat-"),
    ('*', "-ast-"),
    ('$', "-dollar-"),
    ('¢', "-cent-"),
    ('£', "-pound-"),
    ('©', "-copy-"),
    ('®', "-reg-"),
    ('º', "-ordm-"),
    ('°', "-deg-"),
    ('~', "-tilde-"),
];

const LEMMA_EXTRA_ESCAPES: &[(char, &str)] = &[('_', "-lowbar-"), (' ', "_"), (':', "-colon-")];

const SENSEKEY_EXTRA_ESCAPES: &[(char, &str)] = &[(':', "-colon-")];

const DASH_ESCAPE: (char, &str) = ('-', "--");

/// Entity-style escaping. Default separators are `·` and `.`.
#[derive(Debug, Clone)]
pub struct DashEscaper {
    main_separator: String,
    minor_separator: String,
    fallback: bool,
    lemma_table: Vec<(char, &'static str)>,
    sensekey_table: Vec<(char, &'static str)>,
}

impl DashEscaper {
    pub const MIDDLE_DOT: &'static str = "·";

    /// Builds an escaper with the given sense key separators.
    ///
    /// Fails if any escape sequence contains one of the separators, since the
    /// escaped key could then not be split back into its fields.
    pub fn new(main_separator: &str, minor_separator: &str) -> CodecResult<Self> {
        let escaper = Self::build(main_separator, minor_separator);
        for &(c, seq) in escaper.lemma_table.iter().chain(escaper.sensekey_table.iter()) {
            for separator in [main_separator, minor_separator] {
                if seq.contains(separator) {
                    return Err(CodecError::SeparatorClash {
                        ch: c,
                        escape: seq.to_string(),
                        separator: separator.to_string(),
                    });
                }
            }
        }
        Ok(escaper)
    }

    fn build(main_separator: &str, minor_separator: &str) -> Self {
        let table = |extra: &[(char, &'static str)]| {
            std::iter::once(DASH_ESCAPE)
                .chain(BASE_ESCAPES.iter().copied())
                .chain(extra.iter().copied())
                .collect::<Vec<_>>()
        };
        DashEscaper {
            main_separator: main_separator.to_string(),
            minor_separator: minor_separator.to_string(),
            fallback: false,
            lemma_table: table(LEMMA_EXTRA_ESCAPES),
            sensekey_table: table(SENSEKEY_EXTRA_ESCAPES),
        }
    }

    /// Encodes characters without a named escape as `-XXXX-` instead of failing.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    fn escape_with(&self, table: &[(char, &'static str)], text: &str) -> CodecResult<String> {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c);
            } else if let Some(seq) = lookup(table, c) {
                out.push_str(seq);
            } else if is_xml_id_char(c) {
                out.push(c);
            } else if self.fallback {
                // infallible on String
                let _ = write!(out, "-{:04X}-", c as u32);
            } else {
                return Err(CodecError::illegal(c, text));
            }
        }
        Ok(out)
    }

    fn unescape_with(&self, table: &[(char, &'static str)], escaped: &str) -> String {
        let mut out = String::with_capacity(escaped.len());
        let mut rest = escaped;
        while let Some(next) = rest.chars().next() {
            let (c, len) = longest_escape(table, rest)
                .or_else(|| self.fallback.then(|| code_point_escape(rest)).flatten())
                .unwrap_or((next, next.len_utf8()));
            out.push(c);
            rest = &rest[len..];
        }
        out
    }
}

impl Default for DashEscaper {
    fn default() -> Self {
        Self::build(Self::MIDDLE_DOT, ".")
    }
}

/// Longest table escape at the start of `s`, with its byte length.
fn longest_escape(table: &[(char, &'static str)], s: &str) -> Option<(char, usize)> {
    table
        .iter()
        .filter(|(_, seq)| s.starts_with(seq))
        .max_by_key(|(_, seq)| seq.len())
        .map(|&(c, seq)| (c, seq.len()))
}

/// Decodes a `-XXXX-` code point escape at the start of `s`.
fn code_point_escape(s: &str) -> Option<(char, usize)> {
    let tail = s.strip_prefix('-')?;
    let hex_len = tail
        .bytes()
        .take_while(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(b))
        .count();
    if !(4..=6).contains(&hex_len) || !tail[hex_len..].starts_with('-') {
        return None;
    }
    let c = u32::from_str_radix(&tail[..hex_len], 16)
        .ok()
        .and_then(char::from_u32)?;
    Some((c, hex_len + 2))
}

impl Escaper for DashEscaper {
    fn escape_lemma(&self, lemma: &str) -> CodecResult<String> {
        self.escape_with(&self.lemma_table, lemma)
    }

    fn unescape_lemma(&self, escaped: &str) -> String {
        self.unescape_with(&self.lemma_table, escaped)
    }

    fn escape_sensekey_lemma(&self, lemma: &str) -> CodecResult<String> {
        self.escape_with(&self.sensekey_table, lemma)
    }

    fn unescape_sensekey_lemma(&self, escaped: &str) -> String {
        self.unescape_with(&self.sensekey_table, escaped)
    }

    fn main_separator(&self) -> &str {
        &self.main_separator
    }

    fn minor_separator(&self) -> &str {
        &self.minor_separator
    }
}

/// Selects the escaping strategy used by the XML codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapeScheme {
    Legacy,
    #[default]
    Dash,
}

impl EscapeScheme {
    pub fn escaper(self) -> Box<dyn Escaper> {
        match self {
            EscapeScheme::Legacy => Box::new(LegacyEscaper),
            EscapeScheme::Dash => Box::new(DashEscaper::default()),
        }
    }
}

impl FromStr for EscapeScheme {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(EscapeScheme::Legacy),
            "dash" => Ok(EscapeScheme::Dash),
            _ => Err(format!("Invalid escape scheme: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_id::{KEY_PREFIX, is_valid_xml_id, is_valid_xsd_id};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const LEMMAS: &[&str] = &[
        "force",
        "a cappella",
        "Capital: Critique of Political Economy",
        "rock 'n' roll",
        "Hawai'i",
        "AT&T",
        "C++",
        "Yahoo!",
        "what's-its-name",
        "20/20",
        "non-(A)",
        "-a-",
        "--",
        "snake_case",
        "_ _",
        "café",
        "Zürich",
        "São Tomé",
        "1,000",
        "half-and-half",
        "b·c",
    ];

    #[test]
    fn test_dash_lemma_round_trip() {
        let escaper = DashEscaper::default();
        for lemma in LEMMAS {
            let escaped = escaper.escape_lemma(lemma).unwrap();
            let id = format!("{KEY_PREFIX}{escaped}");
            assert!(is_valid_xml_id(&id), "illegal id {id}");
            assert_eq!(escaper.unescape_lemma(&escaped), *lemma);
        }
    }

    #[test]
    fn test_capital_escapes_to_xsd_id() {
        let escaper = DashEscaper::default();
        let lemma = "Capital: Critique of Political Economy";
        let escaped = escaper.escape_lemma(lemma).unwrap();
        assert_eq!(escaped, "Capital-colon-_Critique_of_Political_Economy");
        assert!(!escaped.contains(':'));
        assert!(is_valid_xsd_id(&format!("{KEY_PREFIX}{escaped}")));
        assert_eq!(escaper.unescape_lemma(&escaped), lemma);
    }

    #[test]
    fn test_dash_sensekey_round_trip() {
        let escaper = DashEscaper::default();
        for key in [
            "force%1:19:00::",
            "capital:_critique_of_political_economy%1:10:01::",
            "non-(a)%3:00:00::",
            "forceful%5:00:00:strong:00",
            "hawai'ian%5:00:00:insular:01",
            "zürich%1:15:00::",
            "rock_'n'_roll%1:10:00::",
        ] {
            let escaped = escaper.escape_sensekey(key).unwrap();
            assert!(
                is_valid_xsd_id(&format!("{KEY_PREFIX}{escaped}")),
                "illegal id {escaped}"
            );
            assert_eq!(escaper.unescape_sensekey(&escaped).unwrap(), key);
        }
    }

    #[test]
    fn test_dash_sensekey_shape() {
        let escaper = DashEscaper::default();
        assert_eq!(
            escaper.escape_sensekey("forceful%5:00:00:strong:00").unwrap(),
            "forceful·5.00.00.strong.00"
        );
        assert_eq!(
            escaper.escape_sensekey("a:b%1:00:00::").unwrap(),
            "a-colon-b·1.00.00.."
        );
    }

    #[test]
    fn test_adjacent_escapes_do_not_collapse() {
        let escaper = DashEscaper::default();
        for lemma in ["()", "(-", "-(", "::", "-:", ":-", "a--b"] {
            let escaped = escaper.escape_lemma(lemma).unwrap();
            assert_eq!(escaper.unescape_lemma(&escaped), lemma, "via {escaped}");
        }
        let escaped = escaper.escape_sensekey("a::b%1:00:00::").unwrap();
        assert_eq!(escaper.unescape_sensekey(&escaped).unwrap(), "a::b%1:00:00::");
    }

    #[test]
    fn test_dash_rejects_unmapped_character() {
        let escaper = DashEscaper::default();
        let err = escaper.escape_lemma("a\u{2603}b").unwrap_err();
        assert!(matches!(err, CodecError::IllegalCharacter { ch: '\u{2603}', .. }));
    }

    #[test]
    fn test_dash_fallback_encodes_code_point() {
        let escaper = DashEscaper::default().with_fallback(true);
        let escaped = escaper.escape_lemma("snow\u{2603}man").unwrap();
        assert_eq!(escaped, "snow-2603-man");
        assert_eq!(escaper.unescape_lemma(&escaped), "snow\u{2603}man");
        // a dash-wrapped number that was not produced by the fallback survives
        let escaped = escaper.escape_lemma("route-0041-").unwrap();
        assert_eq!(escaper.unescape_lemma(&escaped), "route-0041-");
    }

    #[test]
    fn test_literal_escape_patterns_survive() {
        for escaper in [DashEscaper::default(), DashEscaper::default().with_fallback(true)] {
            for lemma in ["-2603-", "a-00E9-b", "-lpar-", "x-colon-y", "--lowbar--", "-Hat-"] {
                let escaped = escaper.escape_lemma(lemma).unwrap();
                assert_eq!(escaper.unescape_lemma(&escaped), lemma, "via {escaped}");
            }
            let key = "-lpar-a-%1:00:00::";
            let escaped = escaper.escape_sensekey(key).unwrap();
            assert_eq!(escaper.unescape_sensekey(&escaped).unwrap(), key);
        }
        let escaper = DashEscaper::default().with_fallback(true);
        assert_eq!(escaper.escape_lemma("-2603-").unwrap(), "--2603--");
        assert_eq!(escaper.unescape_lemma("--2603---2603-"), "-2603-\u{2603}");
    }

    #[test]
    fn test_separator_clash_is_rejected() {
        assert!(DashEscaper::new("__", ".").is_ok());
        let err = DashEscaper::new("·", "-").unwrap_err();
        assert!(matches!(err, CodecError::SeparatorClash { .. }));
        assert!(DashEscaper::new("rp", ".").is_err());
    }

    #[test]
    fn test_default_separators_are_clash_free() {
        assert!(DashEscaper::new(DashEscaper::MIDDLE_DOT, ".").is_ok());
    }

    #[test]
    fn test_escape_tables_only_map_illegal_characters() {
        for (c, _) in BASE_ESCAPES {
            assert!(!is_xml_id_char(*c), "{c:?} needs no escape");
        }
    }

    #[test]
    fn test_legacy_lemma_round_trip() {
        let escaper = LegacyEscaper;
        assert_eq!(escaper.escape_lemma("rock 'n' roll").unwrap(), "rock_-ap-n-ap-_roll");
        assert_eq!(escaper.escape_lemma("(a)").unwrap(), "-lb-a-rb-");
        for lemma in ["rock 'n' roll", "C++", "Yahoo!", "20/20", "Capital: Critique", "café"] {
            let escaped = escaper.escape_lemma(lemma).unwrap();
            assert_eq!(escaper.unescape_lemma(&escaped), lemma);
        }
    }

    #[test]
    fn test_legacy_has_no_fallback() {
        let err = LegacyEscaper.escape_lemma("a?b").unwrap_err();
        assert!(matches!(err, CodecError::IllegalCharacter { ch: '?', .. }));
        assert!(LegacyEscaper.escape_sensekey("a(b%1:00:00::").is_err());
    }

    #[test]
    fn test_legacy_sensekey() {
        let escaper = LegacyEscaper;
        let escaped = escaper.escape_sensekey("hawai'i%1:15:00::").unwrap();
        assert_eq!(escaped, "hawai-ap-i__1.15.00..");
        assert_eq!(escaper.unescape_sensekey(&escaped).unwrap(), "hawai'i%1:15:00::");
    }

    #[test]
    fn test_sensekey_field_count() {
        let escaper = DashEscaper::default();
        assert!(matches!(
            escaper.escape_sensekey("force%1:19:00:").unwrap_err(),
            CodecError::FieldCount { count: 4, .. }
        ));
        assert!(matches!(
            escaper.escape_sensekey("force").unwrap_err(),
            CodecError::MissingSeparator { .. }
        ));
    }

    #[test]
    fn test_scheme_selection() {
        assert_eq!("legacy".parse::<EscapeScheme>(), Ok(EscapeScheme::Legacy));
        assert_eq!(EscapeScheme::default(), EscapeScheme::Dash);
        assert_eq!(EscapeScheme::Legacy.escaper().main_separator(), "__");
        assert_eq!(EscapeScheme::Dash.escaper().main_separator(), "·");
    }

    proptest! {
        #[test]
        fn prop_dash_lemma_round_trip(
            lemma in "([A-Za-z0-9 '(),.!?/:+&_\\-éü·]|-(lpar|colon|comma|lowbar)-|-00E9-){1,24}"
        ) {
            let escaper = DashEscaper::default();
            let escaped = escaper.escape_lemma(&lemma).unwrap();
            let id = format!("{}{}", KEY_PREFIX, escaped);
            prop_assert!(is_valid_xsd_id(&id), "illegal id {}", id);
            prop_assert_eq!(escaper.unescape_lemma(&escaped), lemma);
        }

        #[test]
        fn prop_dash_fallback_round_trip(
            lemma in "(-[0-9A-F]{4,6}-|-(lpar|colon|lowbar|apos|Hat)-|--|[a-zA-Z0-9 '(:_\\-\u{2603}\u{1F600}])+"
        ) {
            for escaper in [DashEscaper::default().with_fallback(true), DashEscaper::default()] {
                match escaper.escape_lemma(&lemma) {
                    Ok(escaped) => {
                        let id = format!("{}{}", KEY_PREFIX, escaped);
                        prop_assert!(is_valid_xsd_id(&id), "illegal id {}", id);
                        prop_assert_eq!(escaper.unescape_lemma(&escaped), lemma.clone());
                    }
                    Err(e) => prop_assert!(!escaper.fallback, "fallback failed: {}", e),
                }
            }
        }

        #[test]
        fn prop_dash_sensekey_round_trip(
            lemma in "([a-z0-9_'(),!/:+&\\-é]|-(lpar|colon|apos)-){1,16}",
            head in "([A-Z_'\\-]{1,8})?",
            lex_id in 0u8..100,
        ) {
            let escaper = DashEscaper::default();
            let head_id = if head.is_empty() { String::new() } else { "00".to_string() };
            let key = format!("{lemma}%5:00:{lex_id:02}:{head}:{head_id}");
            let escaped = escaper.escape_sensekey(&key).unwrap();
            let id = format!("{}{}", KEY_PREFIX, escaped);
            prop_assert!(is_valid_xsd_id(&id), "illegal id {}", id);
            prop_assert_eq!(escaper.unescape_sensekey(&escaped).unwrap(), key);
        }

        #[test]
        fn prop_legacy_lemma_round_trip(lemma in "[A-Z0-9 '()/:,!+.]{1,24}") {
            let escaper = LegacyEscaper;
            let escaped = escaper.escape_lemma(&lemma).unwrap();
            let id = format!("{}{}", KEY_PREFIX, escaped);
            prop_assert!(is_valid_xml_id(&id), "illegal id {}", id);
            prop_assert_eq!(escaper.unescape_lemma(&escaped), lemma);
        }
    }
}
