//! In-memory controlled-vocabulary index.
//!
//! Maps every normalised term (preferred and synonym) to exactly one
//! record. Built once from an ordered list of sources, read-only afterwards;
//! share it by reference across worker threads.

use std::collections::HashMap;

use trialmoa_core::{RecordKind, VocabularyRecord, normalize_term};

use crate::ParseError;
use crate::record::SourceBatch;

/// Read-only term index.
#[derive(Debug, Default)]
pub struct VocabularyIndex {
    records: Vec<VocabularyRecord>,
    /// normalised term → position in `records`
    by_term: HashMap<String, usize>,
    /// record_id → position in `records`
    by_id: HashMap<String, usize>,
}

/// Per-source outcome of an index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    pub kind: RecordKind,
    /// Records committed to the index.
    pub records: usize,
    /// Distinct term keys committed.
    pub terms: usize,
    /// Records skipped by the parser or the builder.
    pub malformed: usize,
    /// Set when the whole source was rejected.
    pub failure: Option<String>,
}

/// Summary of a build across all sources.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub sources: Vec<SourceStats>,
}

impl BuildReport {
    pub fn total_records(&self) -> usize {
        self.sources.iter().map(|s| s.records).sum()
    }

    pub fn total_malformed(&self) -> usize {
        self.sources.iter().map(|s| s.malformed).sum()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceStats> {
        self.sources.iter().filter(|s| s.failure.is_some())
    }
}

/// Incremental builder: each source is committed atomically or not at all.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: VocabularyIndex,
    report: BuildReport,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage and commit one source.
    ///
    /// Records with a repeated id or an empty term key are skipped and
    /// counted. A term key that already belongs to a different record fails
    /// the whole source with [`ParseError::DuplicateTerm`]; nothing from that
    /// source is committed and earlier sources are unaffected.
    pub fn add_source(&mut self, batch: SourceBatch) -> Result<SourceStats, ParseError> {
        let SourceBatch {
            name,
            kind,
            records,
            mut malformed,
        } = batch;

        let base = self.index.records.len();
        let mut staged: Vec<VocabularyRecord> = Vec::with_capacity(records.len());
        let mut staged_terms: HashMap<String, usize> = HashMap::new();
        let mut staged_ids: HashMap<String, usize> = HashMap::new();

        for raw in records {
            let record = raw.into_record(kind);

            if record.normalized_term.is_empty() {
                tracing::warn!(source = %name, id = %record.record_id, "term has no lookup key; skipping");
                malformed += 1;
                continue;
            }
            if self.index.by_id.contains_key(&record.record_id)
                || staged_ids.contains_key(&record.record_id)
            {
                tracing::warn!(source = %name, id = %record.record_id, "repeated record id; skipping");
                malformed += 1;
                continue;
            }

            let mut keys: Vec<String> = record
                .all_terms()
                .map(normalize_term)
                .filter(|k| !k.is_empty())
                .collect();
            keys.sort();
            keys.dedup();

            for key in &keys {
                let clash = self
                    .index
                    .by_term
                    .get(key)
                    .map(|&i| self.index.records[i].record_id.as_str())
                    .or_else(|| {
                        staged_terms
                            .get(key)
                            .map(|&i| staged[i - base].record_id.as_str())
                    });
                if let Some(existing) = clash {
                    let err = ParseError::DuplicateTerm {
                        source_name: name.clone(),
                        term: key.clone(),
                        existing: existing.to_string(),
                        incoming: record.record_id.clone(),
                    };
                    self.report.sources.push(SourceStats {
                        name: name.clone(),
                        kind,
                        records: 0,
                        terms: 0,
                        malformed,
                        failure: Some(err.to_string()),
                    });
                    return Err(err);
                }
            }

            let position = base + staged.len();
            for key in keys {
                staged_terms.insert(key, position);
            }
            staged_ids.insert(record.record_id.clone(), position);
            staged.push(record);
        }

        let stats = SourceStats {
            name,
            kind,
            records: staged.len(),
            terms: staged_terms.len(),
            malformed,
            failure: None,
        };

        self.index.records.extend(staged);
        self.index.by_term.extend(staged_terms);
        self.index.by_id.extend(staged_ids);
        self.report.sources.push(stats.clone());

        tracing::info!(
            source = %stats.name,
            records = stats.records,
            terms = stats.terms,
            malformed = stats.malformed,
            "indexed vocabulary source"
        );
        Ok(stats)
    }

    /// Finish the build. Fails when no source was committed.
    pub fn finish(self) -> Result<(VocabularyIndex, BuildReport), ParseError> {
        let attempted = self.report.sources.len();
        if self.report.sources.iter().all(|s| s.failure.is_some()) {
            return Err(ParseError::NoUsableSources { attempted });
        }
        tracing::info!(
            records = self.index.len(),
            terms = self.index.term_count(),
            sources = attempted,
            failed = self.report.failed_sources().count(),
            "vocabulary index ready"
        );
        Ok((self.index, self.report))
    }
}

impl VocabularyIndex {
    /// Build from sources in order.
    ///
    /// A source rejected for a duplicate term is logged and skipped; the
    /// build only fails when no source survives (or none was given).
    pub fn build<I>(sources: I) -> Result<(Self, BuildReport), ParseError>
    where
        I: IntoIterator<Item = SourceBatch>,
    {
        let mut builder = IndexBuilder::new();
        for batch in sources {
            if let Err(err) = builder.add_source(batch) {
                tracing::error!(%err, "vocabulary source rejected");
            }
        }
        builder.finish()
    }

    /// Exact lookup after normalisation. No fuzzy matching.
    pub fn lookup(&self, term: &str) -> Option<&VocabularyRecord> {
        self.lookup_normalized(&normalize_term(term))
    }

    /// Lookup by an already-normalised key.
    pub fn lookup_normalized(&self, key: &str) -> Option<&VocabularyRecord> {
        self.by_term.get(key).map(|&i| &self.records[i])
    }

    /// Lookup by record identifier.
    pub fn get(&self, record_id: &str) -> Option<&VocabularyRecord> {
        self.by_id.get(record_id).map(|&i| &self.records[i])
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct term keys.
    pub fn term_count(&self) -> usize {
        self.by_term.len()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &VocabularyRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn raw(id: &str, term: &str, synonyms: &[&str], locators: &[&str]) -> RawRecord {
        RawRecord {
            record_id: id.into(),
            preferred_term: term.into(),
            synonym_terms: synonyms.iter().map(|s| s.to_string()).collect(),
            tree_locators: locators.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn batch(name: &str, kind: RecordKind, records: Vec<RawRecord>) -> SourceBatch {
        SourceBatch {
            name: name.into(),
            kind,
            records,
            malformed: 0,
        }
    }

    fn descriptors() -> SourceBatch {
        batch(
            "desc",
            RecordKind::Descriptor,
            vec![
                raw(
                    "D061026",
                    "Programmed Cell Death 1 Receptor",
                    &["PD-1 Receptor", "Antigens, CD279"],
                    &["D12.776.543.750.705.852.760"],
                ),
                raw(
                    "D000911",
                    "Antibodies, Monoclonal",
                    &[],
                    &["D12.776.124.486.485.114.224"],
                ),
            ],
        )
    }

    #[test]
    fn lookup_by_preferred_and_synonym() {
        let (index, _) = VocabularyIndex::build([descriptors()]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.lookup("programmed cell death 1 receptor").unwrap().record_id,
            "D061026"
        );
        assert_eq!(index.lookup("PD-1 receptor").unwrap().record_id, "D061026");
        assert_eq!(index.lookup("  ANTIGENS,  CD279 ").unwrap().record_id, "D061026");
        assert_eq!(index.get("D000911").unwrap().term, "Antibodies, Monoclonal");
    }

    #[test]
    fn lookup_is_exact_only() {
        let (index, _) = VocabularyIndex::build([descriptors()]).unwrap();
        assert!(index.lookup("programmed cell death").is_none());
        assert!(index.lookup("PD-1 Receptors").is_none());
        assert!(index.lookup("").is_none());
    }

    #[test]
    fn records_without_locators_are_retained() {
        let supp = batch(
            "supp",
            RecordKind::Supplemental,
            vec![raw("C582435", "pembrolizumab", &["Keytruda"], &[])],
        );
        let (index, report) = VocabularyIndex::build([descriptors(), supp]).unwrap();
        let rec = index.lookup("keytruda").unwrap();
        assert_eq!(rec.record_kind, RecordKind::Supplemental);
        assert!(rec.tree_locators.is_empty());
        assert_eq!(report.total_records(), 3);
    }

    #[test]
    fn duplicate_term_fails_only_that_source() {
        let clash = batch(
            "supp",
            RecordKind::Supplemental,
            vec![
                raw("C1", "nivolumab", &[], &[]),
                raw("C2", "PD 1 receptor", &[], &[]),
            ],
        );
        let (index, report) = VocabularyIndex::build([descriptors(), clash]).unwrap();

        // Nothing from the failed source was committed.
        assert!(index.lookup("nivolumab").is_none());
        assert_eq!(index.lookup("pd-1 receptor").unwrap().record_id, "D061026");
        assert_eq!(index.len(), 2);

        let failed: Vec<_> = report.failed_sources().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "supp");
        assert!(failed[0].failure.as_ref().unwrap().contains("D061026"));
    }

    #[test]
    fn duplicate_term_within_one_source() {
        let mut builder = IndexBuilder::new();
        let err = builder
            .add_source(batch(
                "desc",
                RecordKind::Descriptor,
                vec![
                    raw("D1", "Alpha", &[], &[]),
                    raw("D2", "Beta", &["alpha"], &[]),
                ],
            ))
            .unwrap_err();
        match err {
            ParseError::DuplicateTerm {
                term,
                existing,
                incoming,
                ..
            } => {
                assert_eq!(term, "alpha");
                assert_eq!(existing, "D1");
                assert_eq!(incoming, "D2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn synonym_equal_to_own_term_is_not_a_duplicate() {
        let (index, _) = VocabularyIndex::build([batch(
            "desc",
            RecordKind::Descriptor,
            vec![raw("D1", "Alpha-1", &["alpha 1", "ALPHA-1"], &[])],
        )])
        .unwrap();
        assert_eq!(index.term_count(), 1);
    }

    #[test]
    fn repeated_record_id_is_skipped() {
        let (index, report) = VocabularyIndex::build([batch(
            "desc",
            RecordKind::Descriptor,
            vec![raw("D1", "Alpha", &[], &[]), raw("D1", "Beta", &[], &[])],
        )])
        .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.lookup("beta").is_none());
        assert_eq!(report.total_malformed(), 1);
    }

    #[test]
    fn no_sources_is_fatal() {
        let err = VocabularyIndex::build(Vec::<SourceBatch>::new()).unwrap_err();
        assert!(matches!(err, ParseError::NoUsableSources { attempted: 0 }));
    }

    #[test]
    fn all_sources_failing_is_fatal() {
        let bad = batch(
            "desc",
            RecordKind::Descriptor,
            vec![raw("D1", "Alpha", &[], &[]), raw("D2", "alpha", &[], &[])],
        );
        let err = VocabularyIndex::build([bad]).unwrap_err();
        assert!(matches!(err, ParseError::NoUsableSources { attempted: 1 }));
    }

    #[test]
    fn malformed_count_carries_parser_skips() {
        let mut b = descriptors();
        b.malformed = 3;
        let (_, report) = VocabularyIndex::build([b]).unwrap();
        assert_eq!(report.total_malformed(), 3);
    }
}
