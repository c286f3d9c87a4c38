//! Sense key grammar and derivation.
//!
//! A sense key reads `lemma%ss_type:lex_filenum:lex_id:head_word:head_id`.
//! Head fields are only filled for adjective satellites.

use thiserror::Error;

use crate::models::{Entry, PartOfSpeech, Sense};
use crate::relations::SynsetRelType;
use crate::wordnet::WordnetModel;

/// Lexicographer file names and their numbers.
pub const LEX_FILES: [(&str, u8); 47] = [
    ("adj.all", 0),
    ("adj.pert", 1),
    ("adv.all", 2),
    ("noun.Tops", 3),
    ("noun.act", 4),
    ("noun.animal", 5),
    ("noun.artifact", 6),
    ("noun.attribute", 7),
    ("noun.body", 8),
    ("noun.cognition", 9),
    ("noun.communication", 10),
    ("noun.event", 11),
    ("noun.feeling", 12),
    ("noun.food", 13),
    ("noun.group", 14),
    ("noun.location", 15),
    ("noun.motive", 16),
    ("noun.object", 17),
    ("noun.person", 18),
    ("noun.phenomenon", 19),
    ("noun.plant", 20),
    ("noun.possession", 21),
    ("noun.process", 22),
    ("noun.quantity", 23),
    ("noun.relation", 24),
    ("noun.shape", 25),
    ("noun.state", 26),
    ("noun.substance", 27),
    ("noun.time", 28),
    ("verb.body", 29),
    ("verb.change", 30),
    ("verb.cognition", 31),
    ("verb.communication", 32),
    ("verb.competition", 33),
    ("verb.consumption", 34),
    ("verb.contact", 35),
    ("verb.creation", 36),
    ("verb.emotion", 37),
    ("verb.motion", 38),
    ("verb.perception", 39),
    ("verb.possession", 40),
    ("verb.social", 41),
    ("verb.stative", 42),
    ("verb.weather", 43),
    ("adj.ppl", 44),
    ("contrib.colloq", 50),
    ("contrib.plwn", 51),
];

pub fn lex_file_num(lex_name: &str) -> Option<u8> {
    LEX_FILES
        .iter()
        .find(|(name, _)| *name == lex_name)
        .map(|&(_, num)| num)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SenseKeyError {
    #[error("Sense {sense} refers to nonexistent synset {synset}")]
    UnknownSynset { sense: String, synset: String },

    #[error("Synset {synset} has unknown lexicographer file {lex_name}")]
    UnknownLexFile { synset: String, lex_name: String },

    #[error("Could not deduce target of satellite {0}")]
    UnresolvedHead(String),

    #[error("{0} is not well-formed sense id")]
    Malformed(String),
}

/// The five fields of a well-formed sense key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenseKeyParts<'a> {
    pub lemma: &'a str,
    pub ss_type: u8,
    pub lex_filenum: u8,
    pub lex_id: u8,
    pub head_word: &'a str,
    pub head_id: &'a str,
}

fn two_digits(s: &str) -> Option<u8> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Splits a sense key into its fields, or `None` if it is not well-formed.
///
/// The lemma may not contain spaces or `%`; the head word may contain colons,
/// so the head id is taken after the last one.
pub fn parse_sense_key(key: &str) -> Option<SenseKeyParts<'_>> {
    if key.contains(' ') {
        return None;
    }
    let (lemma, rest) = key.split_once('%')?;
    if lemma.is_empty() || rest.contains('%') {
        return None;
    }
    let mut fields = rest.splitn(4, ':');
    let ss_type = fields.next()?;
    let lex_filenum = two_digits(fields.next()?)?;
    let lex_id = two_digits(fields.next()?)?;
    let (head_word, head_id) = fields.next()?.rsplit_once(':')?;

    let ss_type = match ss_type.as_bytes() {
        [d] if d.is_ascii_digit() => d - b'0',
        _ => return None,
    };
    if head_id.len() > 2 || !head_id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(SenseKeyParts {
        lemma,
        ss_type,
        lex_filenum,
        lex_id,
        head_word,
        head_id,
    })
}

/// Part of speech named by an `\d{8}-[nvars]` synset id.
pub fn synset_id_pos(synset_id: &str) -> Option<PartOfSpeech> {
    let (offset, pos) = synset_id.split_once('-')?;
    if offset.len() != 8 || !offset.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut chars = pos.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => PartOfSpeech::from_char(c),
        _ => None,
    }
}

pub fn pos_from_ss_type(ss_type: u8) -> Option<PartOfSpeech> {
    PartOfSpeech::ALL.into_iter().find(|p| p.ss_type() == ss_type)
}

/// The lex id stored in a sense key.
pub fn extract_lex_id(key: &str) -> Option<u8> {
    parse_sense_key(key).map(|p| p.lex_id)
}

/// Lex id for a sense that has no key yet: one past the highest lex id of its
/// keyed siblings, offset by its rank among the unkeyed ones.
pub fn gen_lex_id(entry: &Entry, sense_index: usize) -> u32 {
    let max_id = entry
        .senses
        .iter()
        .filter(|s| !s.id.is_empty())
        .filter_map(|s| extract_lex_id(&s.id))
        .map(u32::from)
        .max()
        .unwrap_or(0);
    let rank = entry
        .senses
        .iter()
        .take(sense_index)
        .filter(|s| s.id.is_empty())
        .count() as u32;
    max_id + rank + 1
}

/// Head word and head id of a satellite sense, taken from the one sense of
/// the head synset's first member.
///
/// Similar edges to synsets whose offsets start with 8 or 9 are ignored.
pub fn head_word(wn: &WordnetModel, sense: &Sense) -> Result<(String, String), SenseKeyError> {
    let unresolved = || SenseKeyError::UnresolvedHead(sense.id.clone());
    let synset = wn.synset(&sense.synset).ok_or_else(|| SenseKeyError::UnknownSynset {
        sense: sense.id.clone(),
        synset: sense.synset.clone(),
    })?;
    let similars: Vec<&str> = synset
        .targets(SynsetRelType::Similar)
        .filter(|t| !t.starts_with('8') && !t.starts_with('9'))
        .collect();
    let [target_id] = similars.as_slice() else {
        return Err(unresolved());
    };
    let target = wn.synset(target_id).ok_or_else(unresolved)?;
    let first_member = target.members.first().ok_or_else(unresolved)?;
    let target_sense = wn
        .member(first_member, &target.id)
        .and_then(|entry| entry.senses.iter().find(|s| s.synset == target.id))
        .ok_or_else(unresolved)?;
    let (head, _) = target_sense.id.rsplit_once('%').ok_or_else(unresolved)?;
    let head_id = parse_sense_key(&target_sense.id)
        .map(|p| format!("{:02}", p.lex_id))
        .ok_or_else(unresolved)?;
    Ok((head.to_string(), head_id))
}

/// Computes the sense key of the sense at `sense_index` in `entry` from model
/// data alone.
pub fn make_sense_key(
    wn: &WordnetModel,
    entry: &Entry,
    sense_index: usize,
) -> Result<String, SenseKeyError> {
    let Some(sense) = entry.senses.get(sense_index) else {
        return Err(SenseKeyError::Malformed(entry.lemma.clone()));
    };
    let synset = wn.synset(&sense.synset).ok_or_else(|| SenseKeyError::UnknownSynset {
        sense: sense.id.clone(),
        synset: sense.synset.clone(),
    })?;
    let lex_filenum =
        lex_file_num(&synset.lex_name).ok_or_else(|| SenseKeyError::UnknownLexFile {
            synset: synset.id.clone(),
            lex_name: synset.lex_name.clone(),
        })?;
    let lex_id = if sense.id.is_empty() {
        gen_lex_id(entry, sense_index)
    } else {
        extract_lex_id(&sense.id)
            .map(u32::from)
            .ok_or_else(|| SenseKeyError::Malformed(sense.id.clone()))?
    };
    let (head, head_id) = if synset.pos == PartOfSpeech::S {
        head_word(wn, sense)?
    } else {
        (String::new(), String::new())
    };
    let lemma = entry.lemma.to_lowercase().replace(' ', "_");
    Ok(format!(
        "{}%{}:{:02}:{:02}:{}:{}",
        lemma,
        synset.pos.ss_type(),
        lex_filenum,
        lex_id,
        head,
        head_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::force_model;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lex_file_table() {
        assert_eq!(lex_file_num("noun.Tops"), Some(3));
        assert_eq!(lex_file_num("verb.weather"), Some(43));
        assert_eq!(lex_file_num("contrib.plwn"), Some(51));
        assert_eq!(lex_file_num("noun.tops"), None);
        let mut nums: Vec<_> = LEX_FILES.iter().map(|(_, n)| *n).collect();
        nums.dedup();
        assert_eq!(nums.len(), LEX_FILES.len());
    }

    #[test]
    fn test_parse_sense_key() {
        let parts = parse_sense_key("forceful%5:00:00:strong:00").unwrap();
        assert_eq!(parts.lemma, "forceful");
        assert_eq!(parts.ss_type, 5);
        assert_eq!(parts.head_word, "strong");
        assert_eq!(parts.head_id, "00");
        let parts = parse_sense_key("capital:_critique%1:10:00::").unwrap();
        assert_eq!(parts.lemma, "capital:_critique");
        assert_eq!(parts.head_word, "");
        assert_eq!(parts.head_id, "");
        for bad in [
            "force",
            "force%1:19:00:",
            "force%1:19:0::",
            "force%x:19:00::",
            "for ce%1:19:00::",
            "%1:19:00::",
            "force%1:19:00::123",
        ] {
            assert!(parse_sense_key(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn test_synset_id_pos() {
        assert_eq!(synset_id_pos("00001740-n"), Some(PartOfSpeech::N));
        assert_eq!(synset_id_pos("00000500-s"), Some(PartOfSpeech::S));
        assert_eq!(synset_id_pos("0001740-n"), None);
        assert_eq!(synset_id_pos("00001740-x"), None);
        assert_eq!(synset_id_pos("00001740-nn"), None);
    }

    #[test]
    fn test_gen_lex_id() {
        let mut entry = Entry::new("force", PartOfSpeech::N, None);
        entry.senses.push(Sense::new("force%1:19:00::", "00000100-n"));
        entry.senses.push(Sense::new("", "00000200-n"));
        entry.senses.push(Sense::new("force%1:04:03::", "00000300-n"));
        entry.senses.push(Sense::new("", "00000400-n"));
        assert_eq!(gen_lex_id(&entry, 1), 4);
        assert_eq!(gen_lex_id(&entry, 3), 5);
    }

    #[test]
    fn test_make_sense_key_matches_stored_ids() {
        let wn = force_model();
        for entry in &wn.entries {
            for (i, sense) in entry.senses.iter().enumerate() {
                assert_eq!(make_sense_key(&wn, entry, i).unwrap(), sense.id);
            }
        }
    }

    #[test]
    fn test_satellite_head() {
        let wn = force_model();
        let sense = wn.sense("forceful%5:00:00:strong:00").unwrap();
        assert_eq!(
            head_word(&wn, sense).unwrap(),
            ("strong".to_string(), "00".to_string())
        );
    }

    #[test]
    fn test_satellite_without_similar_has_no_head() {
        let mut wn = force_model();
        let i = wn.synset_index("00000500-s").unwrap();
        wn.synsets[i].relations.clear();
        let sense = wn.sense("forceful%5:00:00:strong:00").unwrap();
        assert_eq!(
            head_word(&wn, sense),
            Err(SenseKeyError::UnresolvedHead("forceful%5:00:00:strong:00".to_string()))
        );
    }
}
