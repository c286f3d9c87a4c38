//! WN-LMF 1.1 writer.

use flate2::Compression;
use flate2::write::GzEncoder;
use log::info;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::codec::{CodecResult, Escaper};
use crate::error::{OewnError, Result};
use crate::models::{Entry, Sense, Synset};
use crate::relations::SenseRelKind;
use crate::wordnet::WordnetModel;
use crate::xml_id::{to_xml_entry_id, to_xml_frame_id, to_xml_sense_id, to_xml_synset_id};

const DOCTYPE: &str =
    r#"LexicalResource SYSTEM "http://globalwordnet.github.io/schemas/WN-LMF-1.1.dtd""#;
const DC_NAMESPACE: &str = "https://globalwordnet.github.io/schemas/dc/";

struct LmfWriter<'w, W: Write> {
    xml: Writer<W>,
    wn: &'w WordnetModel,
    escaper: &'w dyn Escaper,
}

impl<W: Write> LmfWriter<'_, W> {
    fn start(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.xml.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.xml.write_event(Event::Empty(element))?;
        Ok(())
    }

    /// `<name attrs>text</name>`
    fn text_element(&mut self, element: BytesStart<'_>, text: &str) -> Result<()> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        self.start(element)?;
        self.xml.write_event(Event::Text(BytesText::new(text)))?;
        self.end(&name)
    }

    fn entry_xml_id(&self, entry: &Entry) -> Result<String> {
        Ok(to_xml_entry_id(
            &entry.lemma,
            entry.pos,
            entry.discriminant.as_deref(),
            self.escaper,
        )?)
    }

    fn document(&mut self) -> Result<()> {
        let wn = self.wn;
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.xml
            .write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;

        let mut root = BytesStart::new("LexicalResource");
        root.push_attribute(("xmlns:dc", DC_NAMESPACE));
        self.start(root)?;

        let info = &wn.info;
        let mut lexicon = BytesStart::new("Lexicon");
        lexicon.push_attribute(("id", info.id.as_str()));
        lexicon.push_attribute(("label", info.label.as_str()));
        lexicon.push_attribute(("language", info.language.as_str()));
        lexicon.push_attribute(("email", info.email.as_str()));
        lexicon.push_attribute(("license", info.license.as_str()));
        lexicon.push_attribute(("version", info.version.as_str()));
        if let Some(url) = &info.url {
            lexicon.push_attribute(("url", url.as_str()));
        }
        self.start(lexicon)?;

        let mut entries = wn
            .entries
            .iter()
            .map(|e| Ok((self.entry_xml_id(e)?, e)))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (xml_id, entry) in entries {
            self.entry(&xml_id, entry)?;
        }

        let mut synsets: Vec<&Synset> = wn.synsets.iter().collect();
        synsets.sort_by(|a, b| a.id.cmp(&b.id));
        for synset in synsets {
            self.synset(synset)?;
        }

        let mut frames: Vec<_> = wn.verbframes.iter().collect();
        frames.sort_by(|a, b| a.id.cmp(&b.id));
        for frame in frames {
            let id = to_xml_frame_id(&frame.id)?;
            let mut behaviour = BytesStart::new("SyntacticBehaviour");
            behaviour.push_attribute(("id", id.as_str()));
            behaviour.push_attribute(("subcategorizationFrame", frame.frame.as_str()));
            self.empty(behaviour)?;
        }

        self.end("Lexicon")?;
        self.end("LexicalResource")?;
        self.xml.get_mut().write_all(b"\n")?;
        Ok(())
    }

    fn entry(&mut self, xml_id: &str, entry: &Entry) -> Result<()> {
        let mut element = BytesStart::new("LexicalEntry");
        element.push_attribute(("id", xml_id));
        self.start(element)?;

        let pos = entry.pos.as_char().to_string();
        let mut lemma = BytesStart::new("Lemma");
        lemma.push_attribute(("writtenForm", entry.lemma.as_str()));
        lemma.push_attribute(("partOfSpeech", pos.as_str()));
        if entry.pronunciations.is_empty() {
            self.empty(lemma)?;
        } else {
            self.start(lemma)?;
            for p in &entry.pronunciations {
                let mut pron = BytesStart::new("Pronunciation");
                if let Some(variety) = &p.variety {
                    pron.push_attribute(("variety", variety.as_str()));
                }
                self.text_element(pron, &p.value)?;
            }
            self.end("Lemma")?;
        }

        for form in &entry.forms {
            let mut element = BytesStart::new("Form");
            element.push_attribute(("writtenForm", form.as_str()));
            self.empty(element)?;
        }

        for sense in &entry.senses {
            self.sense(sense)?;
        }
        self.end("LexicalEntry")
    }

    fn sense(&mut self, sense: &Sense) -> Result<()> {
        let id = to_xml_sense_id(&sense.id, self.escaper)?;
        let synset = to_xml_synset_id(&sense.synset);
        let subcat = sense
            .verbframe_ids
            .as_ref()
            .map(|ids| {
                ids.iter()
                    .map(|id| to_xml_frame_id(id))
                    .collect::<CodecResult<Vec<_>>>()
            })
            .transpose()?
            .map(|ids| ids.join(" "));
        let mut element = BytesStart::new("Sense");
        element.push_attribute(("id", id.as_str()));
        if let Some(adjposition) = sense.adjposition {
            element.push_attribute(("adjposition", adjposition.as_str()));
        }
        if let Some(subcat) = subcat.as_deref().filter(|s| !s.is_empty()) {
            element.push_attribute(("subcat", subcat));
        }
        element.push_attribute(("synset", synset.as_str()));

        if sense.relations.is_empty() && sense.examples.is_empty() {
            return self.empty(element);
        }
        self.start(element)?;
        for relation in &sense.relations {
            let target = to_xml_sense_id(&relation.target, self.escaper)?;
            let mut element = BytesStart::new("SenseRelation");
            match relation.kind {
                SenseRelKind::Other(other) => {
                    element.push_attribute(("relType", "other"));
                    element.push_attribute(("target", target.as_str()));
                    element.push_attribute(("dc:type", other.as_str()));
                }
                SenseRelKind::Standard(rel_type) => {
                    element.push_attribute(("relType", rel_type.as_str()));
                    element.push_attribute(("target", target.as_str()));
                }
            }
            self.empty(element)?;
        }
        for example in &sense.examples {
            self.text_element(BytesStart::new("Example"), example)?;
        }
        self.end("Sense")
    }

    fn synset(&mut self, synset: &Synset) -> Result<()> {
        let members = synset
            .members
            .iter()
            .map(|lemma| {
                let entry = self
                    .wn
                    .member(lemma, &synset.id)
                    .ok_or_else(|| OewnError::reference("synset member", &synset.id, lemma))?;
                self.entry_xml_id(entry)
            })
            .collect::<Result<Vec<_>>>()?
            .join(" ");

        let id = to_xml_synset_id(&synset.id);
        let pos = synset.pos.as_char().to_string();
        let mut element = BytesStart::new("Synset");
        element.push_attribute(("id", id.as_str()));
        element.push_attribute(("ili", synset.ili.as_str()));
        element.push_attribute(("members", members.as_str()));
        element.push_attribute(("partOfSpeech", pos.as_str()));
        element.push_attribute(("lexfile", synset.lex_name.as_str()));
        if let Some(source) = &synset.source {
            element.push_attribute(("dc:source", source.as_str()));
        }
        if let Some(wikidata) = &synset.wikidata {
            element.push_attribute(("dc:subject", wikidata.as_str()));
        }
        self.start(element)?;

        for definition in &synset.definitions {
            self.text_element(BytesStart::new("Definition"), definition)?;
        }
        if let Some(ili_definition) = &synset.ili_definition {
            self.text_element(BytesStart::new("ILIDefinition"), ili_definition)?;
        }
        for relation in &synset.relations {
            let target = to_xml_synset_id(&relation.target);
            let mut element = BytesStart::new("SynsetRelation");
            element.push_attribute(("relType", relation.rel_type.as_str()));
            element.push_attribute(("target", target.as_str()));
            self.empty(element)?;
        }
        for example in &synset.examples {
            let mut element = BytesStart::new("Example");
            if let Some(source) = &example.source {
                element.push_attribute(("dc:source", source.as_str()));
            }
            self.text_element(element, &example.text)?;
        }
        for usage in &synset.usages {
            self.text_element(BytesStart::new("Usage"), usage)?;
        }
        self.end("Synset")
    }
}

/// Writes the model as a WN-LMF 1.1 document.
///
/// Entries are ordered by LMF id and synsets by id. Members must resolve
/// through the member resolver.
pub fn write_lmf<W: Write>(wn: &WordnetModel, out: W, escaper: &dyn Escaper) -> Result<W> {
    let mut writer = LmfWriter {
        xml: Writer::new_with_indent(out, b' ', 2),
        wn,
        escaper,
    };
    writer.document()?;
    Ok(writer.xml.into_inner())
}

/// Writes the model to `path`, gzipped when the name ends in `.gz`.
pub fn save(wn: &WordnetModel, path: &Path, escaper: &dyn Escaper) -> Result<()> {
    let start = Instant::now();
    info!("Writing XML to {:?}", path);
    let out = BufWriter::new(File::create(path)?);
    if path.extension().is_some_and(|e| e == "gz") {
        let gz = write_lmf(wn, GzEncoder::new(out, Compression::default()), escaper)?;
        gz.finish()?.flush()?;
    } else {
        write_lmf(wn, out, escaper)?.flush()?;
    }
    info!("Wrote {} to XML. Took {:.2?}", wn, start.elapsed());
    Ok(())
}

/// Writes the model to a string.
pub fn to_lmf_string(wn: &WordnetModel, escaper: &dyn Escaper) -> Result<String> {
    let bytes = write_lmf(wn, Vec::new(), escaper)?;
    String::from_utf8(bytes).map_err(|e| OewnError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DashEscaper;
    use crate::parse::read_lmf;
    use crate::test_utils::force_model;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_layout() {
        let mut wn = force_model();
        wn.extend().unwrap();
        let xml = to_lmf_string(&wn, &DashEscaper::default()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<!DOCTYPE LexicalResource SYSTEM"));
        assert!(xml.contains(r#"<LexicalResource xmlns:dc="https://globalwordnet.github.io/schemas/dc/">"#));
        assert!(xml.contains(r#"<LexicalEntry id="oewn-force-n">"#));
        assert!(xml.contains(r#"<Pronunciation variety="GB">fɔːs</Pronunciation>"#));
        assert!(xml.contains(r#"adjposition="a""#));
        assert!(xml.contains(r#"subcat="via""#));
        assert!(xml.contains(r#"members="oewn-force-n oewn-violence-n""#));
        assert!(xml.contains(r#"<Example dc:source="Physics">the force of gravity</Example>"#));
        assert!(xml.contains(r#"dc:subject="Q11402""#));
        assert!(xml.contains(r#"<SyntacticBehaviour id="nonreferential" subcategorizationFrame="It is ----ing"/>"#));

        // entries sorted by LMF id, synsets by id
        let entity = xml.find("oewn-entity-n").unwrap();
        let weak = xml.find("oewn-weak-a").unwrap();
        assert!(entity < weak);
        let first = xml.find(r#"<Synset id="oewn-00000100-n""#).unwrap();
        let root = xml.find(r#"<Synset id="oewn-00001740-n""#).unwrap();
        assert!(first < root);
    }

    #[test]
    fn test_synset_children_order() {
        let wn = force_model();
        let xml = to_lmf_string(&wn, &DashEscaper::default()).unwrap();
        let synset = &xml[xml.find(r#"<Synset id="oewn-00000300-n""#).unwrap()..];
        let synset = &synset[..synset.find("</Synset>").unwrap()];
        let definition = synset.find("<Definition>").unwrap();
        let relation = synset.find("<SynsetRelation").unwrap();
        let example = synset.find("<Example>").unwrap();
        let usage = synset.find("<Usage>").unwrap();
        assert!(definition < relation && relation < example && example < usage);
    }

    #[test]
    fn test_xml_round_trip_preserves_model() {
        let escaper = DashEscaper::default();
        let mut wn = force_model();
        wn.extend().unwrap();
        let xml = to_lmf_string(&wn, &escaper).unwrap();
        let mut back = read_lmf(xml.as_bytes(), &escaper).unwrap();
        assert_eq!(back.extend().unwrap(), 0);

        assert_eq!(back.entries.len(), wn.entries.len());
        assert_eq!(back.synsets.len(), wn.synsets.len());
        let original = wn.synset("00000300-n").unwrap();
        let parsed = back.synset("00000300-n").unwrap();
        assert_eq!(parsed.members, original.members);
        assert_eq!(parsed.examples, original.examples);
        assert_eq!(parsed.relations, original.relations);
        assert_eq!(
            back.sense("force%2:35:00::").unwrap().examples,
            vec!["they forced the door"]
        );
    }

    #[test]
    fn test_unresolved_member_is_reference_error() {
        let mut wn = force_model();
        wn.synsets[0].members.push("ghost".to_string());
        let err = to_lmf_string(&wn, &DashEscaper::default()).unwrap_err();
        assert!(matches!(err, OewnError::Reference { kind: "synset member", .. }));
    }

    #[test]
    fn test_gzip_file_round_trip() {
        let escaper = DashEscaper::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wn.xml.gz");
        let wn = force_model();
        save(&wn, &path, &escaper).unwrap();
        let back = crate::parse::load(&path, &escaper).unwrap();
        assert_eq!(back.senses().count(), 9);
    }
}
