//! XML identifier grammar and the mapping between model ids and LMF ids.

use crate::codec::{CodecResult, Escaper};
use crate::error::CodecError;
use crate::models::{EntryKey, PartOfSpeech};

/// Namespace prefix of every LMF identifier.
pub const KEY_PREFIX: &str = "oewn-";

fn in_extended_ranges(c: char) -> bool {
    matches!(c,
        '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// XML NameStartChar.
pub fn is_xml_id_start_char(c: char) -> bool {
    c == ':' || c == '_' || c.is_ascii_alphabetic() || in_extended_ranges(c)
}

/// XML NameChar.
pub fn is_xml_id_char(c: char) -> bool {
    is_xml_id_start_char(c)
        || matches!(c, '-' | '.' | '·' | '0'..='9' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

pub fn is_valid_xml_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => is_xml_id_start_char(first) && chars.all(is_xml_id_char),
        None => false,
    }
}

/// `xsd:ID` is an XML id without colons.
pub fn is_valid_xsd_id(s: &str) -> bool {
    is_valid_xml_id(s) && !s.contains(':')
}

fn strip_prefix(xml_id: &str) -> CodecResult<&str> {
    xml_id
        .strip_prefix(KEY_PREFIX)
        .ok_or_else(|| CodecError::MalformedId(xml_id.to_string()))
}

pub fn to_xml_synset_id(synset_id: &str) -> String {
    format!("{KEY_PREFIX}{synset_id}")
}

pub fn from_xml_synset_id(xml_id: &str) -> CodecResult<String> {
    strip_prefix(xml_id).map(String::from)
}

/// `oewn-{lemma}-{pos}` with an optional `-{discriminant}` suffix.
pub fn to_xml_entry_id(
    lemma: &str,
    pos: PartOfSpeech,
    discriminant: Option<&str>,
    escaper: &dyn Escaper,
) -> CodecResult<String> {
    let escaped = escaper.escape_lemma(lemma)?;
    Ok(match discriminant {
        Some(d) => format!("{KEY_PREFIX}{escaped}-{}-{d}", pos.as_char()),
        None => format!("{KEY_PREFIX}{escaped}-{}", pos.as_char()),
    })
}

pub fn from_xml_entry_id(xml_id: &str, escaper: &dyn Escaper) -> CodecResult<EntryKey> {
    let body = strip_prefix(xml_id)?;
    let malformed = || CodecError::MalformedId(xml_id.to_string());

    let (escaped, pos, discriminant) = match body.rsplit_once('-') {
        Some((head, last)) if last.len() == 1 => {
            let pos = last.chars().next().and_then(PartOfSpeech::from_char);
            match pos {
                Some(pos) => (head, pos, None),
                None => {
                    // single-character discriminant
                    let (lemma, pos) = head.rsplit_once('-').ok_or_else(malformed)?;
                    (lemma, parse_pos(pos).ok_or_else(malformed)?, Some(last))
                }
            }
        }
        Some((head, last)) => {
            let (lemma, pos) = head.rsplit_once('-').ok_or_else(malformed)?;
            (lemma, parse_pos(pos).ok_or_else(malformed)?, Some(last))
        }
        None => return Err(malformed()),
    };
    Ok(EntryKey {
        lemma: escaper.unescape_lemma(escaped),
        pos,
        discriminant: discriminant.map(String::from),
    })
}

fn parse_pos(s: &str) -> Option<PartOfSpeech> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => PartOfSpeech::from_char(c),
        _ => None,
    }
}

pub fn to_xml_sense_id(sensekey: &str, escaper: &dyn Escaper) -> CodecResult<String> {
    Ok(format!("{KEY_PREFIX}{}", escaper.escape_sensekey(sensekey)?))
}

pub fn from_xml_sense_id(xml_id: &str, escaper: &dyn Escaper) -> CodecResult<String> {
    escaper.unescape_sensekey(strip_prefix(xml_id)?)
}

/// Verb frame ids are plain xsd ids and carry no prefix.
pub fn to_xml_frame_id(frame_id: &str) -> CodecResult<String> {
    if is_valid_xsd_id(frame_id) {
        Ok(frame_id.to_string())
    } else {
        Err(CodecError::MalformedId(frame_id.to_string()))
    }
}

pub fn from_xml_frame_id(xml_id: &str) -> CodecResult<String> {
    to_xml_frame_id(xml_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DashEscaper, LegacyEscaper};

    #[test]
    fn test_valid_chars() {
        for c in ['.', '·', ':', '_', '-'] {
            assert!(is_xml_id_char(c), "{c:?} should be valid");
        }
        for c in [',', ';', '%', '!', '?', '*', '/', '|', '\\', '`'] {
            assert!(!is_xml_id_char(c), "{c:?} should not be valid");
        }
        assert!(!is_xml_id_start_char('-'));
        assert!(!is_xml_id_start_char('1'));
    }

    #[test]
    fn test_valid_ids() {
        for s in ["a.b", "a·b", "a:b", "a_b", "a-b", "oewn-00001740-n"] {
            assert!(is_valid_xml_id(s), "{s} should be valid");
        }
        for s in ["a,b", "a;b", "a!b", "a?b", "a*b", "a/b", "a|b", "a\\b", "a`b", "", "1a"] {
            assert!(!is_valid_xml_id(s), "{s} should not be valid");
        }
        assert!(!is_valid_xsd_id("a:b"));
    }

    #[test]
    fn test_entry_id_round_trip() {
        let escaper = DashEscaper::default();
        for (lemma, pos, discriminant) in [
            ("force", PartOfSpeech::N, None),
            ("Capital: Critique of Political Economy", PartOfSpeech::N, None),
            ("bass", PartOfSpeech::N, Some("2")),
            ("x-n", PartOfSpeech::N, None),
            ("good", PartOfSpeech::S, None),
            ("lead", PartOfSpeech::V, Some("12")),
        ] {
            let id = to_xml_entry_id(lemma, pos, discriminant, &escaper).unwrap();
            assert!(is_valid_xsd_id(&id), "{id}");
            let key = from_xml_entry_id(&id, &escaper).unwrap();
            assert_eq!(key, EntryKey::new(lemma, pos, discriminant), "via {id}");
        }
        assert_eq!(
            to_xml_entry_id("bass", PartOfSpeech::N, Some("2"), &escaper).unwrap(),
            "oewn-bass-n-2"
        );
    }

    #[test]
    fn test_entry_id_rejects_garbage() {
        let escaper = DashEscaper::default();
        assert!(from_xml_entry_id("bass-n", &escaper).is_err());
        assert!(from_xml_entry_id("oewn-bass", &escaper).is_err());
    }

    #[test]
    fn test_sense_id_round_trip() {
        for escaper in [
            Box::new(DashEscaper::default()) as Box<dyn Escaper>,
            Box::new(LegacyEscaper) as Box<dyn Escaper>,
        ] {
            let id = to_xml_sense_id("force%1:19:00::", escaper.as_ref()).unwrap();
            assert!(is_valid_xml_id(&id));
            assert_eq!(
                from_xml_sense_id(&id, escaper.as_ref()).unwrap(),
                "force%1:19:00::"
            );
        }
    }

    #[test]
    fn test_synset_id() {
        assert_eq!(to_xml_synset_id("00001740-n"), "oewn-00001740-n");
        assert_eq!(from_xml_synset_id("oewn-00001740-n").unwrap(), "00001740-n");
    }

    #[test]
    fn test_frame_id() {
        assert_eq!(to_xml_frame_id("via").unwrap(), "via");
        assert!(from_xml_frame_id("1 via").is_err());
    }
}
