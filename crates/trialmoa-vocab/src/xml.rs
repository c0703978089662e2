//! Streaming parsers for the MeSH descriptor and supplementary-concept XML.
//!
//! Both files are large (hundreds of MB), so records are read with a pull
//! parser and only the fields the index needs are kept:
//!
//! | Field | Descriptor | Supplemental |
//! |---|---|---|
//! | id | `DescriptorUI` | `SupplementalRecordUI` |
//! | preferred term | `DescriptorName/String` | `SupplementalRecordName/String` |
//! | locators | `TreeNumberList/TreeNumber` | (none) |
//! | synonyms | `ConceptList/Concept/TermList/Term/String` | same |
//! | scope note | preferred concept's `ScopeNote` | `Note` |
//! | pharmacological actions | `PharmacologicalActionList/.../DescriptorName/String` | same |
//!
//! Paths are matched relative to the record element, so the nested
//! `DescriptorUI`/`String` elements inside cross-references are not mistaken
//! for the record's own.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use trialmoa_core::RecordKind;

use crate::ParseError;
use crate::record::{RawRecord, SourceBatch};

struct Layout {
    record: &'static str,
    id: &'static str,
    name: &'static str,
    /// Record-level note element, for formats without concept scope notes.
    note: Option<&'static str>,
}

const DESCRIPTOR: Layout = Layout {
    record: "DescriptorRecord",
    id: "DescriptorUI",
    name: "DescriptorName",
    note: None,
};

const SUPPLEMENTAL: Layout = Layout {
    record: "SupplementalRecord",
    id: "SupplementalRecordUI",
    name: "SupplementalRecordName",
    note: Some("Note"),
};

const TREE_NUMBER: &[&str] = &["TreeNumberList", "TreeNumber"];
const CONCEPT_SCOPE_NOTE: &[&str] = &["ConceptList", "Concept", "ScopeNote"];
const TERM_STRING: &[&str] = &["ConceptList", "Concept", "TermList", "Term", "String"];
const PHARM_ACTION: &[&str] = &[
    "PharmacologicalActionList",
    "PharmacologicalAction",
    "DescriptorReferredTo",
    "DescriptorName",
    "String",
];

/// Parse a descriptor file (`desc20XX.xml`).
pub fn parse_descriptors<R: BufRead>(reader: R, name: &str) -> Result<SourceBatch, ParseError> {
    parse_with(reader, name, &DESCRIPTOR, RecordKind::Descriptor)
}

/// Parse a supplementary concept file (`supp20XX.xml`).
pub fn parse_supplementals<R: BufRead>(
    reader: R,
    name: &str,
) -> Result<SourceBatch, ParseError> {
    parse_with(reader, name, &SUPPLEMENTAL, RecordKind::Supplemental)
}

/// Per-record parse state.
#[derive(Default)]
struct Pending {
    record: RawRecord,
    /// Stack depth of the record element.
    depth: usize,
    in_preferred_concept: bool,
}

fn parse_with<R: BufRead>(
    reader: R,
    source_name: &str,
    layout: &Layout,
    kind: RecordKind,
) -> Result<SourceBatch, ParseError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut batch = SourceBatch::new(source_name, kind);
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut pending: Option<Pending> = None;
    let mut buf = Vec::new();

    let xml_err = |message: String| ParseError::Xml {
        source_name: source_name.to_string(),
        message,
    };

    loop {
        let event = xml
            .read_event_into(&mut buf)
            .map_err(|e| xml_err(format!("at byte {}: {e}", xml.buffer_position())))?;

        match event {
            Event::Start(start) => {
                let tag = element_name(&start);
                stack.push(tag);
                text.clear();

                let tag = stack.last().map(String::as_str).unwrap_or_default();
                if tag == layout.record {
                    pending = Some(Pending {
                        depth: stack.len(),
                        ..Default::default()
                    });
                } else if tag == "Concept"
                    && let Some(p) = pending.as_mut()
                {
                    p.in_preferred_concept = is_preferred_concept(&start);
                }
            }
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| xml_err(format!("bad text: {e}")))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(_) => {
                let closes_record = pending.as_ref().is_some_and(|p| stack.len() == p.depth);
                if closes_record {
                    if let Some(done) = pending.take() {
                        batch.push_checked(done.record);
                    }
                } else if let Some(p) = pending.as_mut()
                    && stack.len() > p.depth
                {
                    let rel: Vec<&str> = stack[p.depth..].iter().map(String::as_str).collect();
                    let value = std::mem::take(&mut text);
                    apply_field(p, layout, &rel, value);
                }
                stack.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if pending.is_some() || !stack.is_empty() {
        return Err(xml_err(format!(
            "document ended inside <{}>",
            stack.last().map(String::as_str).unwrap_or(layout.record)
        )));
    }

    tracing::info!(
        source = %batch.name,
        kind = kind.as_str(),
        records = batch.records.len(),
        malformed = batch.malformed,
        "parsed vocabulary xml"
    );
    Ok(batch)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn is_preferred_concept(start: &BytesStart<'_>) -> bool {
    matches!(
        start.try_get_attribute("PreferredConceptYN"),
        Ok(Some(attr)) if attr.value.as_ref() == b"Y"
    )
}

/// Route the text of a closed element (path relative to the record) into
/// the record being built.
fn apply_field(p: &mut Pending, layout: &Layout, rel: &[&str], value: String) {
    let value = value.trim().to_string();
    if value.is_empty() {
        return;
    }
    let record = &mut p.record;

    match rel {
        [id] if *id == layout.id => record.record_id = value,
        [name, "String"] if *name == layout.name => record.preferred_term = value,
        [note] if Some(*note) == layout.note => record.scope_note = Some(value),
        _ if rel == TREE_NUMBER => record.tree_locators.push(value),
        _ if rel == TERM_STRING => record.synonym_terms.push(value),
        _ if rel == CONCEPT_SCOPE_NOTE && p.in_preferred_concept => {
            record.scope_note = Some(value)
        }
        _ if rel == PHARM_ACTION => record.pharmacological_actions.push(value),
        _ => {}
    }
}
