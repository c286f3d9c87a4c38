//! Lexicographer YAML sources.
//!
//! Layout of a source directory:
//! - `entries-{a..z,0}.yaml`: lemma → `pos[-discriminant]` → entry
//! - `{lex_name}.yaml`: synset id → synset, one file per lexicographer file
//! - `frames.yaml`: verb frame id → frame text

use log::{debug, info, warn};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{OewnError, Result};
use crate::models::{
    AdjPosition, Entry, Example, LexiconInfo, PartOfSpeech, Pronunciation, Sense, SenseRelation,
    Synset, SynsetRelation, VerbFrame, ILI_UNASSIGNED,
};
use crate::progress::{ProgressCallback, StageProgress};
use crate::relations::{SenseRelKind, SynsetRelType};
use crate::wordnet::WordnetModel;

const ENTRY_BUCKETS: &str = "abcdefghijklmnopqrstuvwxyz0";
const FRAMES_FILE: &str = "frames.yaml";
const SYNSET_FILE_PREFIXES: [&str; 5] = ["noun.", "verb.", "adj.", "adv.", "contrib."];

// --- Source shapes ---

#[derive(Debug, Deserialize)]
struct EntryYaml {
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    pronunciation: Vec<PronunciationYaml>,
    sense: Vec<SenseYaml>,
}

#[derive(Debug, Deserialize)]
struct PronunciationYaml {
    value: String,
    #[serde(default)]
    variety: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SenseYaml {
    id: String,
    synset: String,
    #[serde(default)]
    adjposition: Option<AdjPosition>,
    #[serde(default)]
    subcat: Option<Vec<String>>,
    #[serde(default)]
    sent: Vec<String>,
    /// Every remaining key is a relation type.
    #[serde(flatten)]
    relations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SynsetYaml {
    members: Vec<String>,
    #[serde(rename = "partOfSpeech")]
    pos: PartOfSpeech,
    definition: Vec<String>,
    #[serde(default)]
    example: Vec<ExampleYaml>,
    #[serde(default)]
    usage: Vec<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    wikidata: Option<String>,
    #[serde(default)]
    ili: Option<String>,
    #[serde(flatten)]
    relations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExampleYaml {
    Plain(String),
    Sourced { text: String, source: String },
}

type EntriesYaml = BTreeMap<String, BTreeMap<String, EntryYaml>>;

// --- Loading ---

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    serde_yaml::from_reader(reader)
        .map_err(|e| OewnError::load(format!("{}: {}", path.display(), e)))
}

fn yaml_files(home: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir_entry in fs::read_dir(home)? {
        let path = dir_entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        if path.file_stem().and_then(|s| s.to_str()).is_some_and(&keep) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_synset_file(stem: &str) -> bool {
    SYNSET_FILE_PREFIXES.iter().any(|p| stem.starts_with(p))
}

/// Loads a source directory into an unextended model with its resolvers built.
pub fn load(home: &Path) -> Result<WordnetModel> {
    load_with_progress(home, None)
}

pub fn load_with_progress(
    home: &Path,
    progress_callback: Option<&mut ProgressCallback>,
) -> Result<WordnetModel> {
    let start = Instant::now();
    info!("Loading YAML from {:?}", home);
    if !home.is_dir() {
        return Err(OewnError::load(format!("{} is not a directory", home.display())));
    }

    let entry_files = yaml_files(home, |stem| stem.starts_with("entries-"))?;
    let synset_files = yaml_files(home, is_synset_file)?;
    let total = (entry_files.len() + synset_files.len() + 1) as u64;
    let mut progress = StageProgress::new(progress_callback, "Loading YAML", total);

    let mut entries = Vec::new();
    for path in &entry_files {
        progress.step(path.display().to_string());
        let y: EntriesYaml = read_yaml(path)?;
        for (lemma, poses) in y {
            for (pos_discriminant, entry_y) in poses {
                entries.push(load_entry(&lemma, &pos_discriminant, entry_y)?);
            }
        }
        debug!("Loaded {:?}: {} entries so far", path, entries.len());
    }

    let mut synsets = Vec::new();
    for path in &synset_files {
        progress.step(path.display().to_string());
        let lex_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let y: BTreeMap<String, SynsetYaml> = read_yaml(path)?;
        for (id, synset_y) in y {
            synsets.push(load_synset(&id, &lex_name, synset_y));
        }
        debug!("Loaded {:?}: {} synsets so far", path, synsets.len());
    }

    progress.step(FRAMES_FILE);
    let frames_path = home.join(FRAMES_FILE);
    if !frames_path.exists() {
        return Err(OewnError::load(format!("{} is missing", frames_path.display())));
    }
    let frames: BTreeMap<String, String> = read_yaml(&frames_path)?;
    let verbframes = frames
        .into_iter()
        .map(|(id, frame)| VerbFrame { id, frame })
        .collect();

    progress.finish();

    let wn = WordnetModel::from_parts(LexiconInfo::default(), entries, synsets, verbframes);
    info!("Loaded {} from YAML. Took {:.2?}", wn, start.elapsed());
    Ok(wn)
}

fn load_entry(lemma: &str, pos_discriminant: &str, y: EntryYaml) -> Result<Entry> {
    let mut chars = pos_discriminant.chars();
    let pos = chars
        .next()
        .and_then(PartOfSpeech::from_char)
        .ok_or_else(|| {
            OewnError::load(format!("Bad part of speech '{}' for {}", pos_discriminant, lemma))
        })?;
    let discriminant = pos_discriminant.get(2..).filter(|d| !d.is_empty());

    let mut entry = Entry::new(lemma, pos, discriminant);
    entry.forms = y.form;
    entry.pronunciations = y
        .pronunciation
        .into_iter()
        .map(|p| Pronunciation {
            value: p.value,
            variety: p.variety,
        })
        .collect();
    entry.senses = y.sense.into_iter().map(load_sense).collect();
    Ok(entry)
}

fn load_sense(y: SenseYaml) -> Sense {
    let mut sense = Sense::new(&y.id, &y.synset);
    sense.adjposition = y.adjposition;
    sense.verbframe_ids = y.subcat;
    sense.examples = y.sent;
    for (name, targets) in y.relations {
        match SenseRelKind::from_name(&name) {
            Some(kind) => sense
                .relations
                .extend(targets.iter().map(|t| SenseRelation::new(t, kind))),
            None => warn!("Unknown sense relation {} in {}", name, sense.id),
        }
    }
    sense
}

fn load_synset(id: &str, lex_name: &str, y: SynsetYaml) -> Synset {
    let mut synset = Synset::new(id, y.pos, y.members, lex_name);
    synset.definitions = y.definition;
    synset.examples = y
        .example
        .into_iter()
        .map(|x| match x {
            ExampleYaml::Plain(text) => Example { text, source: None },
            ExampleYaml::Sourced { text, source } => Example {
                text,
                source: Some(source),
            },
        })
        .collect();
    synset.usages = y.usage;
    synset.source = y.source;
    synset.wikidata = y.wikidata;
    synset.ili = y.ili.unwrap_or_else(|| ILI_UNASSIGNED.to_string());
    for (name, targets) in y.relations {
        match name.parse::<SynsetRelType>() {
            Ok(t) => synset
                .relations
                .extend(targets.iter().map(|target| SynsetRelation::new(target, t))),
            Err(_) => warn!("Unknown synset relation {} in {}", name, id),
        }
    }
    synset
}

// --- Saving ---

fn strings(values: &[String]) -> Value {
    Value::Sequence(values.iter().cloned().map(Value::String).collect())
}

fn to_mapping(fields: BTreeMap<String, Value>) -> Value {
    let mut mapping = Mapping::new();
    for (k, v) in fields {
        mapping.insert(Value::String(k), v);
    }
    Value::Mapping(mapping)
}

/// Groups relation targets by type name, rejecting unresolvable targets.
fn sense_relations_to_yaml(
    wn: &WordnetModel,
    sense: &Sense,
    y: &mut BTreeMap<String, Value>,
) -> Result<()> {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for r in &sense.relations {
        if r.kind.is_symmetry_ignored() {
            continue;
        }
        if wn.sense_index(&r.target).is_none() {
            return Err(OewnError::reference("sense relation target", &sense.id, &r.target));
        }
        grouped.entry(r.kind.as_str()).or_default().push(r.target.clone());
    }
    for (k, targets) in grouped {
        y.insert(k.to_string(), strings(&targets));
    }
    Ok(())
}

fn sense_to_yaml(wn: &WordnetModel, sense: &Sense) -> Result<Value> {
    let mut y = BTreeMap::new();
    y.insert("id".to_string(), Value::String(sense.id.clone()));
    y.insert("synset".to_string(), Value::String(sense.synset.clone()));
    if let Some(adjposition) = sense.adjposition {
        y.insert("adjposition".to_string(), Value::String(adjposition.as_str().to_string()));
    }
    if let Some(frames) = sense.verbframe_ids.as_deref().filter(|f| !f.is_empty()) {
        y.insert("subcat".to_string(), strings(frames));
    }
    if !sense.examples.is_empty() {
        y.insert("sent".to_string(), strings(&sense.examples));
    }
    sense_relations_to_yaml(wn, sense, &mut y)?;
    Ok(to_mapping(y))
}

fn entry_to_yaml(wn: &WordnetModel, entry: &Entry) -> Result<Value> {
    let mut y = BTreeMap::new();
    if !entry.forms.is_empty() {
        y.insert("form".to_string(), strings(&entry.forms));
    }
    if !entry.pronunciations.is_empty() {
        let pronunciations = entry
            .pronunciations
            .iter()
            .map(|p| {
                let mut py = BTreeMap::new();
                py.insert("value".to_string(), Value::String(p.value.clone()));
                if let Some(variety) = &p.variety {
                    py.insert("variety".to_string(), Value::String(variety.clone()));
                }
                to_mapping(py)
            })
            .collect();
        y.insert("pronunciation".to_string(), Value::Sequence(pronunciations));
    }
    let senses = entry
        .senses
        .iter()
        .map(|s| sense_to_yaml(wn, s))
        .collect::<Result<Vec<_>>>()?;
    y.insert("sense".to_string(), Value::Sequence(senses));
    Ok(to_mapping(y))
}

fn example_to_yaml(example: &Example) -> Value {
    match &example.source {
        Some(source) => {
            let mut y = BTreeMap::new();
            y.insert("text".to_string(), Value::String(example.text.clone()));
            y.insert("source".to_string(), Value::String(source.clone()));
            to_mapping(y)
        }
        None => Value::String(example.text.clone()),
    }
}

fn synset_to_yaml(wn: &WordnetModel, synset: &Synset) -> Result<Value> {
    if let Some(m) = synset
        .members
        .iter()
        .find(|m| wn.member_index(m, &synset.id).is_none())
    {
        return Err(OewnError::reference("synset member", &synset.id, m));
    }

    let mut y = BTreeMap::new();
    y.insert("members".to_string(), strings(&synset.members));
    y.insert(
        "partOfSpeech".to_string(),
        Value::String(synset.pos.as_char().to_string()),
    );
    y.insert("definition".to_string(), strings(&synset.definitions));
    if !synset.examples.is_empty() {
        y.insert(
            "example".to_string(),
            Value::Sequence(synset.examples.iter().map(example_to_yaml).collect()),
        );
    }
    if !synset.usages.is_empty() {
        y.insert("usage".to_string(), strings(&synset.usages));
    }
    if let Some(wikidata) = &synset.wikidata {
        y.insert("wikidata".to_string(), Value::String(wikidata.clone()));
    }
    if let Some(source) = &synset.source {
        y.insert("source".to_string(), Value::String(source.clone()));
    }
    if !synset.ili.is_empty() && synset.ili != ILI_UNASSIGNED {
        y.insert("ili".to_string(), Value::String(synset.ili.clone()));
    }

    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for r in &synset.relations {
        if r.rel_type.is_symmetry_ignored() {
            continue;
        }
        if wn.synset_index(&r.target).is_none() {
            return Err(OewnError::reference("synset relation target", &synset.id, &r.target));
        }
        grouped.entry(r.rel_type.as_str()).or_default().push(r.target.clone());
    }
    for (k, targets) in grouped {
        y.insert(k.to_string(), strings(&targets));
    }
    Ok(to_mapping(y))
}

fn write_yaml<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(writer, value)?;
    debug!("Wrote {:?}", path);
    Ok(())
}

/// Bucket of an entry file: first lowercased letter, `0` for anything else.
fn bucket(lemma: &str) -> char {
    match lemma.to_lowercase().chars().next() {
        Some(c) if c.is_ascii_lowercase() => c,
        _ => '0',
    }
}

/// Writes the model in the source layout. Every entry file is written, even
/// when empty.
pub fn save(wn: &WordnetModel, home: &Path) -> Result<()> {
    let start = Instant::now();
    fs::create_dir_all(home)?;

    let mut buckets: BTreeMap<char, BTreeMap<String, BTreeMap<String, Value>>> =
        ENTRY_BUCKETS.chars().map(|c| (c, BTreeMap::new())).collect();
    for entry in &wn.entries {
        let key = match &entry.discriminant {
            Some(d) => format!("{}-{}", entry.pos.as_char(), d),
            None => entry.pos.as_char().to_string(),
        };
        let lemmas = buckets.entry(bucket(&entry.lemma)).or_default();
        let poses = lemmas.entry(entry.lemma.clone()).or_default();
        if poses.contains_key(&key) {
            return Err(OewnError::Write(format!("Duplicate entry: {}-{}", entry.lemma, key)));
        }
        poses.insert(key, entry_to_yaml(wn, entry)?);
    }
    for (c, lemmas) in &buckets {
        write_yaml(&home.join(format!("entries-{}.yaml", c)), lemmas)?;
    }

    let mut lex_files: BTreeMap<&str, BTreeMap<String, Value>> = BTreeMap::new();
    for synset in &wn.synsets {
        let file = lex_files.entry(synset.lex_name.as_str()).or_default();
        if file.contains_key(&synset.id) {
            return Err(OewnError::Write(format!(
                "Duplicate synset: {} in {}",
                synset.id, synset.lex_name
            )));
        }
        file.insert(synset.id.clone(), synset_to_yaml(wn, synset)?);
    }
    for (lex_name, synsets) in &lex_files {
        write_yaml(&home.join(format!("{}.yaml", lex_name)), synsets)?;
    }

    let frames: BTreeMap<&str, &str> = wn
        .verbframes
        .iter()
        .map(|f| (f.id.as_str(), f.frame.as_str()))
        .collect();
    write_yaml(&home.join(FRAMES_FILE), &frames)?;

    info!("Saved {} to YAML in {:?}. Took {:.2?}", wn, home, start.elapsed());
    Ok(())
}

// --- Collocations ---

/// Reads a collocation file: sense key → list of partner sense keys.
pub fn load_collocations(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let collocations: BTreeMap<String, Vec<String>> = read_yaml(path)?;
    info!(
        "Loaded {} collocation sources from {:?}",
        collocations.len(),
        path
    );
    Ok(collocations)
}

pub fn save_collocations(wn: &WordnetModel, path: &Path) -> Result<()> {
    write_yaml(path, &wn.collocations())
}
