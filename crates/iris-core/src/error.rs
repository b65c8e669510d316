use thiserror::Error;

use crate::kind::Notation;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A kind key that no notation registers.
    #[error("unknown {kind} key: {key}")]
    UnknownKind { kind: &'static str, key: String },

    #[error("invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn unknown(kind: &'static str, key: &str) -> Self {
        Self::UnknownKind {
            kind,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// A notation whose display metadata and rendering handlers disagree.
#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "{notation} registry is incomplete: no handler for [{}], no metadata for [{}]",
    .missing_handlers.join(", "),
    .missing_metadata.join(", ")
)]
pub struct RegistryError {
    pub notation: Notation,
    pub missing_handlers: Vec<&'static str>,
    pub missing_metadata: Vec<&'static str>,
}
