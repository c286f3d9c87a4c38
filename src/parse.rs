//! Event-driven reader for WN-LMF documents.

use flate2::read::GzDecoder;
use log::{debug, info};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::codec::{CodecResult, Escaper};
use crate::error::{OewnError, Result};
use crate::models::{
    AdjPosition, Entry, Example, LexiconInfo, PartOfSpeech, Pronunciation, Sense, SenseRelation,
    Synset, SynsetRelation, VerbFrame,
};
use crate::relations::{OtherSenseRelType, SenseRelKind, SenseRelType, SynsetRelType};
use crate::wordnet::WordnetModel;
use crate::xml_id::{from_xml_entry_id, from_xml_frame_id, from_xml_sense_id, from_xml_synset_id};

/// Element whose text content is being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    Definition,
    IliDefinition,
    Example,
    Usage,
    Pronunciation,
}

/// Attributes of one element, decoded and unescaped.
struct Attrs {
    element: String,
    values: HashMap<String, String>,
}

impl Attrs {
    fn read(e: &BytesStart<'_>) -> Result<Self> {
        let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut values = HashMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            values.insert(key, value);
        }
        Ok(Attrs { element, values })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn required(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            OewnError::load(format!("Missing attribute {} in {}", name, self.element))
        })
    }
}

/// Parser state: the entity under construction at each level plus the
/// text accumulator.
struct LmfReader<'e> {
    escaper: &'e dyn Escaper,

    info: Option<LexiconInfo>,
    entry: Option<Entry>,
    current_entry_id: Option<String>,
    sense: Option<Sense>,
    synset: Option<Synset>,

    text_target: Option<TextTarget>,
    text: String,
    example_source: Option<String>,
    pronunciation_variety: Option<String>,

    entries: Vec<Entry>,
    synsets: Vec<Synset>,
    verbframes: Vec<VerbFrame>,

    /// LMF entry id → lemma, for synset members.
    entry_lemmas: HashMap<String, String>,
    sense_ids: HashSet<String>,
    member_keys: HashSet<(String, String)>,
    synset_ids: HashSet<String>,
}

fn parse_enum<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(OewnError::Load)
}

impl<'e> LmfReader<'e> {
    fn new(escaper: &'e dyn Escaper) -> Self {
        LmfReader {
            escaper,
            info: None,
            entry: None,
            current_entry_id: None,
            sense: None,
            synset: None,
            text_target: None,
            text: String::new(),
            example_source: None,
            pronunciation_variety: None,
            entries: Vec::new(),
            synsets: Vec::new(),
            verbframes: Vec::new(),
            entry_lemmas: HashMap::new(),
            sense_ids: HashSet::new(),
            member_keys: HashSet::new(),
            synset_ids: HashSet::new(),
        }
    }

    fn entry_mut(&mut self, element: &str) -> Result<&mut Entry> {
        self.entry
            .as_mut()
            .ok_or_else(|| OewnError::load(format!("{} outside LexicalEntry", element)))
    }

    fn sense_mut(&mut self, element: &str) -> Result<&mut Sense> {
        self.sense
            .as_mut()
            .ok_or_else(|| OewnError::load(format!("{} outside Sense", element)))
    }

    fn synset_mut(&mut self, element: &str) -> Result<&mut Synset> {
        self.synset
            .as_mut()
            .ok_or_else(|| OewnError::load(format!("{} outside Synset", element)))
    }

    fn begin_text(&mut self, target: TextTarget) {
        self.text_target = Some(target);
        self.text.clear();
    }

    fn start(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let attrs = Attrs::read(e)?;
        match attrs.element.as_str() {
            "LexicalResource" => {}
            "Lexicon" => {
                self.info = Some(LexiconInfo {
                    id: attrs.required("id")?.to_string(),
                    label: attrs.required("label")?.to_string(),
                    language: attrs.required("language")?.to_string(),
                    email: attrs.required("email")?.to_string(),
                    license: attrs.required("license")?.to_string(),
                    version: attrs.required("version")?.to_string(),
                    url: attrs.get("url").map(String::from),
                });
            }
            "LexicalEntry" => {
                let xml_id = attrs.required("id")?;
                if self.entry_lemmas.contains_key(xml_id) {
                    return Err(OewnError::load(format!(
                        "Duplicate entry ID while parsing: {}",
                        xml_id
                    )));
                }
                let key = from_xml_entry_id(xml_id, self.escaper)?;
                // lemma and pos come from the Lemma element
                self.entry_lemmas.insert(xml_id.to_string(), String::new());
                self.entry = Some(Entry::new("", key.pos, key.discriminant.as_deref()));
                self.current_entry_id = Some(xml_id.to_string());
            }
            "Lemma" => {
                let lemma = attrs.required("writtenForm")?.to_string();
                let pos: PartOfSpeech = parse_enum(attrs.required("partOfSpeech")?)?;
                let entry = self.entry_mut("Lemma")?;
                entry.lemma = lemma;
                entry.pos = pos;
            }
            "Form" => {
                let form = attrs.required("writtenForm")?.to_string();
                self.entry_mut("Form")?.forms.push(form);
            }
            "Pronunciation" => {
                self.entry_mut("Pronunciation")?;
                self.pronunciation_variety = attrs.get("variety").map(String::from);
                self.begin_text(TextTarget::Pronunciation);
            }
            "Sense" => {
                self.entry_mut("Sense")?;
                let id = from_xml_sense_id(attrs.required("id")?, self.escaper)?;
                let synset = from_xml_synset_id(attrs.required("synset")?)?;
                let mut sense = Sense::new(&id, &synset);
                sense.adjposition = attrs
                    .get("adjposition")
                    .map(parse_enum::<AdjPosition>)
                    .transpose()?;
                sense.verbframe_ids = attrs
                    .get("subcat")
                    .map(|s| s.split(' ').map(from_xml_frame_id).collect::<CodecResult<_>>())
                    .transpose()?;
                self.sense = Some(sense);
            }
            "SenseRelation" => {
                let target = from_xml_sense_id(attrs.required("target")?, self.escaper)?;
                let rel_type: SenseRelType = parse_enum(attrs.required("relType")?)?;
                let kind = if rel_type == SenseRelType::Other {
                    SenseRelKind::Other(parse_enum::<OtherSenseRelType>(
                        attrs.required("dc:type")?,
                    )?)
                } else {
                    SenseRelKind::Standard(rel_type)
                };
                self.sense_mut("SenseRelation")?
                    .relations
                    .push(SenseRelation::new(&target, kind));
            }
            "Synset" => {
                let id = from_xml_synset_id(attrs.required("id")?)?;
                let ili = attrs.required("ili")?.to_string();
                let pos: PartOfSpeech = parse_enum(attrs.required("partOfSpeech")?)?;
                let members = attrs
                    .get("members")
                    .unwrap_or_default()
                    .split(' ')
                    .filter(|m| !m.is_empty())
                    .map(|m| {
                        self.entry_lemmas
                            .get(m)
                            .cloned()
                            .ok_or_else(|| OewnError::reference("synset member", &id, m))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut synset = Synset::new(&id, pos, members, attrs.get("lexfile").unwrap_or_default());
                synset.ili = ili;
                synset.source = attrs.get("dc:source").map(String::from);
                synset.wikidata = attrs.get("dc:subject").map(String::from);
                self.synset = Some(synset);
            }
            "Definition" => {
                self.synset_mut("Definition")?;
                self.begin_text(TextTarget::Definition);
            }
            "ILIDefinition" => {
                self.synset_mut("ILIDefinition")?;
                self.begin_text(TextTarget::IliDefinition);
            }
            "Example" => {
                if self.synset.is_none() && self.sense.is_none() {
                    return Err(OewnError::load("Example outside Sense or Synset"));
                }
                self.example_source = attrs.get("dc:source").map(String::from);
                self.begin_text(TextTarget::Example);
            }
            "Usage" => {
                self.synset_mut("Usage")?;
                self.begin_text(TextTarget::Usage);
            }
            "SynsetRelation" => {
                let target = from_xml_synset_id(attrs.required("target")?)?;
                let rel_type: SynsetRelType = parse_enum(attrs.required("relType")?)?;
                self.synset_mut("SynsetRelation")?
                    .relations
                    .push(SynsetRelation::new(&target, rel_type));
            }
            "SyntacticBehaviour" => {
                self.verbframes.push(VerbFrame {
                    id: from_xml_frame_id(attrs.required("id")?)?,
                    frame: attrs.required("subcategorizationFrame")?.to_string(),
                });
            }
            other => return Err(OewnError::load(format!("Unexpected Tag: {}", other))),
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"LexicalEntry" => {
                let entry = self.entry.take().ok_or_else(|| OewnError::load("Unbalanced LexicalEntry"))?;
                if let Some(xml_id) = self.current_entry_id.take() {
                    self.entry_lemmas.insert(xml_id, entry.lemma.clone());
                }
                self.entries.push(entry);
            }
            b"Sense" => {
                let sense = self.sense.take().ok_or_else(|| OewnError::load("Unbalanced Sense"))?;
                let entry = self.entry_mut("Sense")?;
                let member_key = (entry.lemma.clone(), sense.synset.clone());
                if !self.sense_ids.insert(sense.id.clone()) {
                    return Err(OewnError::load(format!(
                        "Duplicate sense ID while parsing: {}",
                        sense.id
                    )));
                }
                if !self.member_keys.insert(member_key.clone()) {
                    return Err(OewnError::load(format!(
                        "Duplicate member ID while parsing: ({}, {})",
                        member_key.0, member_key.1
                    )));
                }
                self.entry_mut("Sense")?.senses.push(sense);
            }
            b"Synset" => {
                let synset = self.synset.take().ok_or_else(|| OewnError::load("Unbalanced Synset"))?;
                if !self.synset_ids.insert(synset.id.clone()) {
                    return Err(OewnError::load(format!(
                        "Duplicate synset ID while parsing: {}",
                        synset.id
                    )));
                }
                self.synsets.push(synset);
            }
            b"Definition" | b"ILIDefinition" | b"Example" | b"Usage" | b"Pronunciation" => {
                self.end_text()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn end_text(&mut self) -> Result<()> {
        let Some(target) = self.text_target.take() else {
            return Ok(());
        };
        let text = std::mem::take(&mut self.text);
        match target {
            TextTarget::Definition => self.synset_mut("Definition")?.definitions.push(text),
            TextTarget::IliDefinition => self.synset_mut("ILIDefinition")?.ili_definition = Some(text),
            TextTarget::Usage => self.synset_mut("Usage")?.usages.push(text),
            TextTarget::Example => {
                let source = self.example_source.take();
                if let Some(synset) = self.synset.as_mut() {
                    synset.examples.push(Example { text, source });
                } else {
                    self.sense_mut("Example")?.examples.push(text);
                }
            }
            TextTarget::Pronunciation => {
                let variety = self.pronunciation_variety.take();
                self.entry_mut("Pronunciation")?
                    .pronunciations
                    .push(Pronunciation { value: text, variety });
            }
        }
        Ok(())
    }

    fn characters(&mut self, content: &str) -> Result<()> {
        if self.text_target.is_some() {
            self.text.push_str(content);
            Ok(())
        } else if content.trim().is_empty() {
            Ok(())
        } else {
            Err(OewnError::load(format!("Text content not expected: \"{}\"", content)))
        }
    }

    fn finish(self) -> Result<WordnetModel> {
        let info = self
            .info
            .ok_or_else(|| OewnError::load("No Lexicon element"))?;
        Ok(WordnetModel::from_parts(
            info,
            self.entries,
            self.synsets,
            self.verbframes,
        ))
    }
}

/// Reads a WN-LMF document into an unextended model.
pub fn read_lmf<R: BufRead>(source: R, escaper: &dyn Escaper) -> Result<WordnetModel> {
    let mut reader = Reader::from_reader(source);
    let mut state = LmfReader::new(escaper);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.start(&e)?,
            Event::Empty(e) => {
                state.start(&e)?;
                state.end(e.name().as_ref())?;
            }
            Event::End(e) => state.end(e.name().as_ref())?,
            Event::Text(e) => state.characters(&e.unescape()?)?,
            Event::CData(e) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|err| OewnError::load(format!("Invalid UTF-8 in CDATA: {}", err)))?;
                state.characters(text)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    state.finish()
}

/// Reads a WN-LMF file, gunzipping it when the name ends in `.gz`.
pub fn load(path: &Path, escaper: &dyn Escaper) -> Result<WordnetModel> {
    let start = Instant::now();
    info!("Reading and parsing XML file: {:?}", path);
    let file = File::open(path)?;
    let wn = if path.extension().is_some_and(|e| e == "gz") {
        debug!("Decompressing {:?}", path);
        read_lmf(BufReader::new(GzDecoder::new(file)), escaper)?
    } else {
        read_lmf(BufReader::new(file), escaper)?
    };
    info!("Loaded {} from XML. Took {:.2?}", wn, start.elapsed());
    Ok(wn)
}
