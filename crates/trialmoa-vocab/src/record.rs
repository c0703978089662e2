//! Parser output: raw records grouped per source stream.

use serde::Deserialize;
use trialmoa_core::{RecordKind, VocabularyRecord, locator};

/// One record as a parser produced it, before indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    pub record_id: String,
    pub preferred_term: String,
    #[serde(default)]
    pub synonym_terms: Vec<String>,
    #[serde(default)]
    pub tree_locators: Vec<String>,
    #[serde(default)]
    pub scope_note: Option<String>,
    #[serde(default)]
    pub pharmacological_actions: Vec<String>,
}

impl RawRecord {
    /// Check required fields and locator shape.
    pub fn check(&self) -> Result<(), String> {
        if self.record_id.trim().is_empty() {
            return Err(format!("record '{}' has no identifier", self.preferred_term));
        }
        if self.preferred_term.trim().is_empty() {
            return Err(format!("record {} has no preferred term", self.record_id));
        }
        if let Some(bad) = self
            .tree_locators
            .iter()
            .find(|l| !locator::is_well_formed(l))
        {
            return Err(format!(
                "record {} has malformed tree locator '{bad}'",
                self.record_id
            ));
        }
        Ok(())
    }

    /// Convert into an indexed record. Synonyms equal to the preferred term
    /// and repeated synonyms are dropped.
    pub fn into_record(self, kind: RecordKind) -> VocabularyRecord {
        let preferred = self.preferred_term.trim().to_string();
        let mut synonyms: Vec<String> = Vec::with_capacity(self.synonym_terms.len());
        for s in self.synonym_terms {
            let s = s.trim();
            if s.is_empty() || s == preferred || synonyms.iter().any(|x| x == s) {
                continue;
            }
            synonyms.push(s.to_string());
        }

        let mut record = VocabularyRecord::new(self.record_id.trim(), preferred, kind)
            .with_synonyms(synonyms)
            .with_locators(self.tree_locators);
        record.scope_note = self
            .scope_note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        record.pharmacological_actions = self.pharmacological_actions;
        record
    }
}

/// Everything parsed from one source stream.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    /// Display name (usually the file name).
    pub name: String,
    pub kind: RecordKind,
    pub records: Vec<RawRecord>,
    /// Records the parser skipped as malformed.
    pub malformed: usize,
}

impl SourceBatch {
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
            records: Vec::new(),
            malformed: 0,
        }
    }

    /// Keep `record` if it passes [`RawRecord::check`], otherwise count it.
    pub fn push_checked(&mut self, record: RawRecord) {
        match record.check() {
            Ok(()) => self.records.push(record),
            Err(reason) => {
                tracing::warn!(source = %self.name, %reason, "skipping malformed record");
                self.malformed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, term: &str) -> RawRecord {
        RawRecord {
            record_id: id.into(),
            preferred_term: term.into(),
            ..Default::default()
        }
    }

    #[test]
    fn check_requires_id_and_term() {
        assert!(raw("D1", "Alpha").check().is_ok());
        assert!(raw("", "Alpha").check().is_err());
        assert!(raw("D1", "  ").check().is_err());
    }

    #[test]
    fn check_rejects_bad_locator() {
        let mut r = raw("D1", "Alpha");
        r.tree_locators = vec!["D12.776".into(), "D12..1".into()];
        assert!(r.check().unwrap_err().contains("D12..1"));
    }

    #[test]
    fn into_record_dedupes_synonyms() {
        let mut r = raw("D1", "Alpha");
        r.synonym_terms = vec!["Alpha".into(), "Beta".into(), " Beta ".into(), "".into()];
        r.scope_note = Some("   ".into());
        let rec = r.into_record(RecordKind::Descriptor);
        assert_eq!(rec.synonyms, vec!["Beta"]);
        assert!(rec.scope_note.is_none());
    }

    #[test]
    fn push_checked_counts_malformed() {
        let mut batch = SourceBatch::new("test", RecordKind::Descriptor);
        batch.push_checked(raw("D1", "Alpha"));
        batch.push_checked(raw("", "Beta"));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.malformed, 1);
    }
}
