use serde::{Deserialize, Serialize};
use std::fmt;

use crate::relations::{SenseRelKind, SynsetRelType};

/// ILI value of a synset that has no interlingual index entry yet.
pub const ILI_UNASSIGNED: &str = "in";

// --- Lexicon metadata ---

/// Metadata of the lexicon, written as attributes of the LMF `Lexicon` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconInfo {
    pub id: String,
    pub label: String,
    pub language: String,
    pub email: String,
    pub license: String,
    pub version: String,
    pub url: Option<String>,
}

impl Default for LexiconInfo {
    fn default() -> Self {
        LexiconInfo {
            id: "oewn".to_string(),
            label: "Open English Wordnet".to_string(),
            language: "en".to_string(),
            email: "english-wordnet@googlegroups.com".to_string(),
            license: "https://creativecommons.org/licenses/by/4.0".to_string(),
            version: "2024".to_string(),
            url: Some("https://github.com/globalwordnet/english-wordnet".to_string()),
        }
    }
}

// --- Part of speech ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    N, // Noun
    V, // Verb
    A, // Adjective
    R, // Adverb
    S, // Adjective Satellite
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 5] = [
        PartOfSpeech::N,
        PartOfSpeech::V,
        PartOfSpeech::A,
        PartOfSpeech::R,
        PartOfSpeech::S,
    ];

    /// Single letter used in ids and files.
    pub fn as_char(self) -> char {
        match self {
            PartOfSpeech::N => 'n',
            PartOfSpeech::V => 'v',
            PartOfSpeech::A => 'a',
            PartOfSpeech::R => 'r',
            PartOfSpeech::S => 's',
        }
    }

    pub fn from_char(c: char) -> Option<PartOfSpeech> {
        match c {
            'n' => Some(PartOfSpeech::N),
            'v' => Some(PartOfSpeech::V),
            'a' => Some(PartOfSpeech::A),
            'r' => Some(PartOfSpeech::R),
            's' => Some(PartOfSpeech::S),
            _ => None,
        }
    }

    /// Numeric class of the pos in a sense key (n1 v2 a3 r4 s5).
    pub fn ss_type(self) -> u8 {
        match self {
            PartOfSpeech::N => 1,
            PartOfSpeech::V => 2,
            PartOfSpeech::A => 3,
            PartOfSpeech::R => 4,
            PartOfSpeech::S => 5,
        }
    }

    /// Adjectives and satellites compare equal.
    pub fn equivalent(self, other: PartOfSpeech) -> bool {
        self == other || (self.is_adjective() && other.is_adjective())
    }

    pub fn is_adjective(self) -> bool {
        matches!(self, PartOfSpeech::A | PartOfSpeech::S)
    }
}

// Implement Display for PartOfSpeech for easier printing
impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PartOfSpeech::N => "noun",
                PartOfSpeech::V => "verb",
                PartOfSpeech::A => "adjective",
                PartOfSpeech::R => "adverb",
                PartOfSpeech::S => "adjective satellite",
            }
        )
    }
}

// Implement FromStr for PartOfSpeech for CLI parsing etc.
impl std::str::FromStr for PartOfSpeech {
    type Err = String; // Simple error type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "n" | "noun" => Ok(PartOfSpeech::N),
            "v" | "verb" => Ok(PartOfSpeech::V),
            "a" | "adj" | "adjective" => Ok(PartOfSpeech::A),
            "r" | "adv" | "adverb" => Ok(PartOfSpeech::R),
            "s" | "adj_sat" | "adjective_satellite" => Ok(PartOfSpeech::S),
            _ => Err(format!("Invalid part of speech: {}", s)),
        }
    }
}

/// Syntactic position of an adjective sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjPosition {
    #[serde(rename = "a")]
    Attributive,
    #[serde(rename = "p")]
    Predicative,
    #[serde(rename = "ip")]
    Postnominal,
}

impl AdjPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            AdjPosition::Attributive => "a",
            AdjPosition::Predicative => "p",
            AdjPosition::Postnominal => "ip",
        }
    }
}

impl std::str::FromStr for AdjPosition {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(AdjPosition::Attributive),
            "p" => Ok(AdjPosition::Predicative),
            "ip" => Ok(AdjPosition::Postnominal),
            _ => Err(format!("Invalid adjective position: {}", s)),
        }
    }
}

// --- Lexical Entry ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pronunciation {
    pub value: String,
    pub variety: Option<String>, // e.g., "GB"
}

/// Identity of an entry: lemma, part of speech and optional discriminant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub discriminant: Option<String>,
}

impl EntryKey {
    pub fn new(lemma: &str, pos: PartOfSpeech, discriminant: Option<&str>) -> Self {
        EntryKey {
            lemma: lemma.to_string(),
            pos,
            discriminant: discriminant.map(String::from),
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.discriminant {
            Some(d) => write!(f, "{}-{}-{}", self.lemma, self.pos.as_char(), d),
            None => write!(f, "{}-{}", self.lemma, self.pos.as_char()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub discriminant: Option<String>,
    pub forms: Vec<String>,
    pub pronunciations: Vec<Pronunciation>,
    pub senses: Vec<Sense>,
}

impl Entry {
    pub fn new(lemma: &str, pos: PartOfSpeech, discriminant: Option<&str>) -> Self {
        Entry {
            lemma: lemma.to_string(),
            pos,
            discriminant: discriminant.map(String::from),
            forms: Vec::new(),
            pronunciations: Vec::new(),
            senses: Vec::new(),
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            lemma: self.lemma.clone(),
            pos: self.pos,
            discriminant: self.discriminant.clone(),
        }
    }
}

// --- Sense ---

/// Link between an entry and a synset. Owned by its entry; the model maps
/// the sense id back to the owning entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    pub id: String,
    pub synset: String,
    pub adjposition: Option<AdjPosition>,
    pub examples: Vec<String>,
    pub verbframe_ids: Option<Vec<String>>,
    pub relations: Vec<SenseRelation>,
}

impl Sense {
    pub fn new(id: &str, synset: &str) -> Self {
        Sense {
            id: id.to_string(),
            synset: synset.to_string(),
            adjposition: None,
            examples: Vec::new(),
            verbframe_ids: None,
            relations: Vec::new(),
        }
    }

    /// Targets of every relation of the given kind.
    pub fn targets(&self, kind: impl Into<SenseRelKind>) -> impl Iterator<Item = &str> {
        let kind = kind.into();
        self.relations
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.target.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenseRelation {
    pub target: String, // Reference to another Sense ID
    pub kind: SenseRelKind,
}

impl SenseRelation {
    pub fn new(target: &str, kind: impl Into<SenseRelKind>) -> Self {
        SenseRelation {
            target: target.to_string(),
            kind: kind.into(),
        }
    }
}

// --- Synset ---

/// Example sentence, optionally attributed to a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub source: Option<String>,
}

impl Example {
    pub fn plain(text: &str) -> Self {
        Example {
            text: text.to_string(),
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synset {
    pub id: String,
    pub pos: PartOfSpeech,
    pub members: Vec<String>, // Lemmas, resolved through (lemma, synset id)
    pub lex_name: String,
    pub definitions: Vec<String>,
    pub examples: Vec<Example>,
    pub usages: Vec<String>,
    pub ili_definition: Option<String>,
    pub source: Option<String>,
    pub wikidata: Option<String>,
    pub ili: String,
    pub relations: Vec<SynsetRelation>,
}

impl Synset {
    pub fn new(id: &str, pos: PartOfSpeech, members: Vec<String>, lex_name: &str) -> Self {
        Synset {
            id: id.to_string(),
            pos,
            members,
            lex_name: lex_name.to_string(),
            definitions: Vec::new(),
            examples: Vec::new(),
            usages: Vec::new(),
            ili_definition: None,
            source: None,
            wikidata: None,
            ili: ILI_UNASSIGNED.to_string(),
            relations: Vec::new(),
        }
    }

    pub fn targets(&self, rel_type: SynsetRelType) -> impl Iterator<Item = &str> {
        self.relations
            .iter()
            .filter(move |r| r.rel_type == rel_type)
            .map(|r| r.target.as_str())
    }

    pub fn has_relation(&self, rel_type: SynsetRelType) -> bool {
        self.relations.iter().any(|r| r.rel_type == rel_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynsetRelation {
    pub target: String, // Reference to another Synset ID
    pub rel_type: SynsetRelType,
}

impl SynsetRelation {
    pub fn new(target: &str, rel_type: SynsetRelType) -> Self {
        SynsetRelation {
            target: target.to_string(),
            rel_type,
        }
    }
}

// --- Verb frames ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbFrame {
    pub id: String,
    pub frame: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::SenseRelType;

    #[test]
    fn test_part_of_speech_letters() {
        for pos in PartOfSpeech::ALL {
            assert_eq!(PartOfSpeech::from_char(pos.as_char()), Some(pos));
        }
        assert_eq!(PartOfSpeech::from_char('x'), None);
        assert_eq!("adj_sat".parse::<PartOfSpeech>(), Ok(PartOfSpeech::S));
        assert_eq!(PartOfSpeech::S.ss_type(), 5);
    }

    #[test]
    fn test_adjective_equivalence() {
        assert!(PartOfSpeech::A.equivalent(PartOfSpeech::S));
        assert!(PartOfSpeech::S.equivalent(PartOfSpeech::A));
        assert!(!PartOfSpeech::N.equivalent(PartOfSpeech::V));
    }

    #[test]
    fn test_entry_key_ordering() {
        let a = EntryKey::new("bank", PartOfSpeech::N, None);
        let b = EntryKey::new("bank", PartOfSpeech::N, Some("1"));
        let c = EntryKey::new("bank", PartOfSpeech::V, None);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.to_string(), "bank-n-1");
    }

    #[test]
    fn test_sense_targets_filter_by_kind() {
        let mut sense = Sense::new("good%3:00:01::", "00001740-a");
        sense
            .relations
            .push(SenseRelation::new("bad%3:00:01::", SenseRelType::Antonym));
        sense
            .relations
            .push(SenseRelation::new("goodness%1:07:00::", SenseRelType::Derivation));
        let antonyms: Vec<_> = sense.targets(SenseRelType::Antonym).collect();
        assert_eq!(antonyms, vec!["bad%3:00:01::"]);
    }
}
