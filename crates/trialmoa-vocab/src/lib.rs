//! Controlled-vocabulary layer: source parsers and the term index.

mod error;
pub mod index;
pub mod jsonl;
pub mod record;
pub mod xml;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use error::ParseError;
pub use index::{BuildReport, IndexBuilder, SourceStats, VocabularyIndex};
pub use record::{RawRecord, SourceBatch};
use trialmoa_core::RecordKind;

/// Parse one vocabulary file, choosing the parser from its extension
/// (`.xml`, `.jsonl`, `.json`).
pub fn load_source(path: &Path, kind: RecordKind) -> Result<SourceBatch, ParseError> {
    if !path.exists() {
        return Err(ParseError::SourceNotFound(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let reader = BufReader::new(File::open(path)?);
    match (ext.as_deref(), kind) {
        (Some("xml"), RecordKind::Descriptor) => xml::parse_descriptors(reader, &name),
        (Some("xml"), RecordKind::Supplemental) => xml::parse_supplementals(reader, &name),
        (Some("jsonl" | "json"), _) => jsonl::parse_records(reader, &name, kind),
        _ => Err(ParseError::UnsupportedFormat(path.to_path_buf())),
    }
}
