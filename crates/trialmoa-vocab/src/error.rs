use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("vocabulary source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("unsupported vocabulary source format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error(
        "duplicate term '{term}' in {source_name}: already maps to {existing}, \
         also claimed by {incoming}"
    )]
    DuplicateTerm {
        source_name: String,
        term: String,
        existing: String,
        incoming: String,
    },

    #[error("malformed record in {source_name}: {reason}")]
    MalformedRecord { source_name: String, reason: String },

    #[error("xml error in {source_name}: {message}")]
    Xml {
        source_name: String,
        message: String,
    },

    #[error("no usable vocabulary source ({attempted} attempted)")]
    NoUsableSources { attempted: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// A source that is absent or of an unknown format is an input
    /// mistake, not bad data, and fails the whole run. Everything else
    /// fails only the source it came from.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::SourceNotFound(_) | Self::UnsupportedFormat(_))
    }
}
