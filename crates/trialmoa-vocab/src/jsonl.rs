//! JSON-lines vocabulary sources.
//!
//! One object per line:
//! `{"record_id": "D061026", "preferred_term": "...", "synonym_terms": [...],
//!   "tree_locators": [...], "scope_note": "..."}`. Blank lines are ignored;
//! a line that does not deserialize is a malformed record.

use std::io::BufRead;

use trialmoa_core::RecordKind;

use crate::ParseError;
use crate::record::{RawRecord, SourceBatch};

pub fn parse_records<R: BufRead>(
    reader: R,
    name: &str,
    kind: RecordKind,
) -> Result<SourceBatch, ParseError> {
    let mut batch = SourceBatch::new(name, kind);

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawRecord>(line) {
            Ok(record) => batch.push_checked(record),
            Err(e) => {
                let err = ParseError::MalformedRecord {
                    source_name: name.to_string(),
                    reason: format!("line {}: {e}", lineno + 1),
                };
                tracing::warn!(%err, "skipping malformed record");
                batch.malformed += 1;
            }
        }
    }

    tracing::info!(
        source = %batch.name,
        kind = kind.as_str(),
        records = batch.records.len(),
        malformed = batch.malformed,
        "parsed vocabulary json lines"
    );
    Ok(batch)
}
