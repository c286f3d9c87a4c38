// Declare modules
pub mod codec;
pub mod error;
pub mod models;
pub mod parse;
pub mod progress;
pub mod relations;
pub mod resolve;
pub mod sensekey;
pub mod serialize;
pub mod snapshot;
pub mod validate;
pub mod wordnet;
pub mod xml_id;
pub mod yaml;

#[cfg(test)]
mod test_utils;

// Re-export key types for easier use
pub use codec::{DashEscaper, EscapeScheme, Escaper, LegacyEscaper};
pub use error::{CodecError, OewnError, Result};
pub use models::{
    AdjPosition, Entry, EntryKey, Example, LexiconInfo, PartOfSpeech, Pronunciation, Sense,
    SenseRelation, Synset, SynsetRelation, VerbFrame,
};
pub use relations::{OtherSenseRelType, SenseRelKind, SenseRelType, SynsetRelType};
pub use resolve::Resolved;
pub use validate::{Rule, ValidationMode, ValidationOptions, ValidationReport, Violation};
pub use wordnet::{SenseIdx, WordnetModel};

use log::info;
use progress::ProgressCallback;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Options for loading a wordnet from any source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Add the missing inverse relations after loading.
    pub extend: bool,
    /// Build the resolved view after loading.
    pub resolve: bool,
    /// Id escaping used by the XML reader and writer.
    pub scheme: EscapeScheme,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            extend: true,
            resolve: false,
            scheme: EscapeScheme::default(),
        }
    }
}

/// On-disk representation of a wordnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Directory of lexicographer YAML files.
    Yaml,
    /// WN-LMF document, optionally gzipped.
    Xml,
    /// Gzipped bincode snapshot.
    Snapshot,
}

impl SourceFormat {
    /// Directory → YAML, `*.xml` or `*.xml.gz` → XML, anything else → snapshot.
    pub fn detect(path: &Path) -> SourceFormat {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if path.is_dir() {
            SourceFormat::Yaml
        } else if name.ends_with(".xml") || name.ends_with(".xml.gz") {
            SourceFormat::Xml
        } else {
            SourceFormat::Snapshot
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Yaml => "yaml",
            SourceFormat::Xml => "xml",
            SourceFormat::Snapshot => "snapshot",
        })
    }
}

impl FromStr for SourceFormat {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(SourceFormat::Yaml),
            "xml" | "lmf" => Ok(SourceFormat::Xml),
            "snapshot" | "bin" => Ok(SourceFormat::Snapshot),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Loads a wordnet, detecting the format from the path.
pub fn load(path: &Path, options: &LoadOptions) -> Result<WordnetModel> {
    load_as(path, SourceFormat::detect(path), options, None)
}

/// Loads a wordnet in the given format, then extends and resolves it as
/// `options` ask. Progress is only reported for YAML sources.
pub fn load_as(
    path: &Path,
    format: SourceFormat,
    options: &LoadOptions,
    progress_callback: Option<&mut ProgressCallback>,
) -> Result<WordnetModel> {
    info!("Loading {} as {}", path.display(), format);
    let mut wn = match format {
        SourceFormat::Yaml => yaml::load_with_progress(path, progress_callback)?,
        SourceFormat::Xml => parse::load(path, options.scheme.escaper().as_ref())?,
        SourceFormat::Snapshot => snapshot::load(path)?,
    };
    if options.extend {
        let added = wn.extend()?;
        info!("Extended {} with {} inverse relation(s)", wn, added);
    }
    if options.resolve {
        wn.resolve()?;
    }
    Ok(wn)
}

/// Writes a wordnet in the given format.
pub fn save_as(
    wn: &WordnetModel,
    path: &Path,
    format: SourceFormat,
    scheme: EscapeScheme,
) -> Result<()> {
    match format {
        SourceFormat::Yaml => yaml::save(wn, path),
        SourceFormat::Xml => serialize::save(wn, path, scheme.escaper().as_ref()),
        SourceFormat::Snapshot => snapshot::save(wn, path),
    }
}
