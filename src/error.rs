use thiserror::Error;

use crate::validate::Violation;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, OewnError>;

/// Enum representing all possible errors in the oewn_graph library.
#[derive(Error, Debug)]
pub enum OewnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Snapshot serialization/deserialization error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// Malformed or incomplete source data.
    #[error("Load error: {0}")]
    Load(String),

    /// A relation, member or synset target is absent from its resolver.
    #[error("Unresolved {kind} '{target}' referenced from '{origin}'")]
    Reference {
        kind: &'static str,
        origin: String,
        target: String,
    },

    /// The model cannot be written in the target layout.
    #[error("Write error: {0}")]
    Write(String),

    #[error("Missing {0} resolver: model was not fully loaded")]
    MissingResolver(&'static str),

    #[error("Validation error: {0}")]
    Validation(Violation),

    #[error("Validation failed with {} violation(s)", .0.len())]
    Invalid(Vec<Violation>),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl OewnError {
    pub(crate) fn load(message: impl Into<String>) -> Self {
        OewnError::Load(message.into())
    }

    pub(crate) fn reference(kind: &'static str, origin: &str, target: &str) -> Self {
        OewnError::Reference {
            kind,
            origin: origin.to_string(),
            target: target.to_string(),
        }
    }
}

/// Failures of the identifier and sense-key codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Illegal character '{ch}' (U+{code:04X}) in '{input}'")]
    IllegalCharacter { ch: char, code: u32, input: String },

    #[error("Separator '{separator}' not found in '{input}'")]
    MissingSeparator { separator: String, input: String },

    #[error("Sense key '{input}' has {count} fields, expected 5")]
    FieldCount { input: String, count: usize },

    #[error("Escape '{escape}' for '{ch}' contains separator '{separator}'")]
    SeparatorClash {
        ch: char,
        escape: String,
        separator: String,
    },

    #[error("Malformed identifier '{0}'")]
    MalformedId(String),
}

impl CodecError {
    pub(crate) fn illegal(ch: char, input: &str) -> Self {
        CodecError::IllegalCharacter {
            ch,
            code: ch as u32,
            input: input.to_string(),
        }
    }
}
