//! Shared data model: vocabulary records, mechanism candidates, resolutions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_term;

/// Which vocabulary stream a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Main descriptor headings (carry tree locators).
    Descriptor,
    /// Supplementary concept records (usually no tree locators).
    Supplemental,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Descriptor => "descriptor",
            Self::Supplemental => "supplemental",
        }
    }
}

/// One controlled-vocabulary entry. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    /// Preferred term as published.
    pub term: String,
    /// Lookup key for `term`.
    pub normalized_term: String,
    /// Unique identifier (e.g. `D061026`).
    pub record_id: String,
    /// Entry terms other than the preferred one, as published.
    pub synonyms: Vec<String>,
    /// Hierarchical locators, sorted.
    pub tree_locators: BTreeSet<String>,
    pub scope_note: Option<String>,
    pub record_kind: RecordKind,
    /// Names of the pharmacologic-action headings this record points at.
    #[serde(default)]
    pub pharmacological_actions: Vec<String>,
}

impl VocabularyRecord {
    pub fn new(
        record_id: impl Into<String>,
        term: impl Into<String>,
        record_kind: RecordKind,
    ) -> Self {
        let term = term.into();
        Self {
            normalized_term: normalize_term(&term),
            term,
            record_id: record_id.into(),
            synonyms: Vec::new(),
            tree_locators: BTreeSet::new(),
            scope_note: None,
            record_kind,
            pharmacological_actions: Vec::new(),
        }
    }

    pub fn with_locators<I, S>(mut self, locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tree_locators
            .extend(locators.into_iter().map(Into::into));
        self
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms.extend(synonyms.into_iter().map(Into::into));
        self
    }

    pub fn with_scope_note(mut self, note: impl Into<String>) -> Self {
        self.scope_note = Some(note.into());
        self
    }

    /// Preferred term followed by every synonym.
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.term.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}

/// Where a candidate mechanism string was found upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Literature-index mechanism-of-action field.
    MechanismField,
    /// Literature-index target field.
    TargetField,
    /// Term proposed by the language-model refinement step.
    #[serde(rename = "LLMRefined")]
    LlmRefined,
}

/// A free-text mechanism string gathered for a drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismCandidate {
    pub raw_text: String,
    pub source: CandidateSource,
}

impl MechanismCandidate {
    pub fn new(raw_text: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            raw_text: raw_text.into(),
            source,
        }
    }
}

/// The union of a drug's candidate strings.
///
/// Members are compared byte-for-byte, exactly as supplied. Iteration order
/// is sorted so that serialisation and fingerprints are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateSet(BTreeSet<String>);

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of the raw texts of `candidates`, skipping empty strings.
    pub fn from_candidates<'a, I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = &'a MechanismCandidate>,
    {
        candidates
            .into_iter()
            .map(|c| c.raw_text.as_str())
            .collect()
    }

    /// Exact (byte-for-byte) membership.
    pub fn contains(&self, term: &str) -> bool {
        self.0.contains(term)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl FromIterator<String> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().filter(|s| !s.is_empty()).collect())
    }
}

/// Outcome of resolving one drug's candidates to a vocabulary term.
///
/// Invariants (enforced by the constructors, re-checked by
/// [`is_consistent`](Self::is_consistent)):
/// - `chosen_term`, when present, is an exact member of `candidate_set`
/// - no `chosen_term` implies no `primary_locator`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMechanism {
    pub drug_id: String,
    pub chosen_term: Option<String>,
    pub primary_locator: Option<String>,
    pub candidate_set: CandidateSet,
}

impl ResolvedMechanism {
    /// A drug with no usable term.
    pub fn unresolved(drug_id: impl Into<String>, candidate_set: CandidateSet) -> Self {
        Self {
            drug_id: drug_id.into(),
            chosen_term: None,
            primary_locator: None,
            candidate_set,
        }
    }

    /// A drug whose chosen term is a member of its candidate set.
    ///
    /// Returns `None` when `chosen_term` is not in `candidate_set`.
    pub fn resolved(
        drug_id: impl Into<String>,
        candidate_set: CandidateSet,
        chosen_term: impl Into<String>,
        primary_locator: Option<String>,
    ) -> Option<Self> {
        let chosen_term = chosen_term.into();
        if !candidate_set.contains(&chosen_term) {
            return None;
        }
        Some(Self {
            drug_id: drug_id.into(),
            chosen_term: Some(chosen_term),
            primary_locator,
            candidate_set,
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.chosen_term.is_some()
    }

    pub fn is_consistent(&self) -> bool {
        match &self.chosen_term {
            Some(term) => self.candidate_set.contains(term),
            None => self.primary_locator.is_none(),
        }
    }
}

/// Per-drug input to the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugEvidence {
    pub drug_id: String,
    pub trial_id: String,
    #[serde(default)]
    pub candidates: Vec<MechanismCandidate>,
    /// Answer already produced by the external selection service, if any.
    #[serde(default)]
    pub selection: Option<String>,
}

impl DrugEvidence {
    pub fn candidate_set(&self) -> CandidateSet {
        CandidateSet::from_candidates(&self.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> CandidateSet {
        items.iter().copied().collect()
    }

    #[test]
    fn record_normalizes_term() {
        let r = VocabularyRecord::new("D000911", "Antibodies, Monoclonal", RecordKind::Descriptor);
        assert_eq!(r.normalized_term, "antibodies monoclonal");
        assert!(r.tree_locators.is_empty());
    }

    #[test]
    fn all_terms_lists_preferred_first() {
        let r = VocabularyRecord::new("D1", "Alpha", RecordKind::Descriptor)
            .with_synonyms(["Beta", "Gamma"]);
        let terms: Vec<_> = r.all_terms().collect();
        assert_eq!(terms, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn candidate_set_is_byte_exact() {
        let s = set(&["PD-1", "Antibodies, Monoclonal"]);
        assert!(s.contains("PD-1"));
        assert!(!s.contains("pd-1"));
        assert!(!s.contains("PD-1 "));
    }

    #[test]
    fn candidate_set_unions_and_skips_empty() {
        let cands = vec![
            MechanismCandidate::new("PD-1", CandidateSource::MechanismField),
            MechanismCandidate::new("PD-1", CandidateSource::TargetField),
            MechanismCandidate::new("", CandidateSource::LlmRefined),
        ];
        let s = CandidateSet::from_candidates(&cands);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn candidate_set_iterates_sorted() {
        let s = set(&["b", "a", "c"]);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn resolved_rejects_out_of_set_term() {
        let s = set(&["PD-1"]);
        assert!(ResolvedMechanism::resolved("d1", s.clone(), "PD-L1", None).is_none());
        let r = ResolvedMechanism::resolved("d1", s, "PD-1", Some("D12.776".into())).unwrap();
        assert!(r.is_consistent());
        assert!(r.is_resolved());
    }

    #[test]
    fn consistency_catches_orphan_locator() {
        let mut r = ResolvedMechanism::unresolved("d1", set(&["x"]));
        assert!(r.is_consistent());
        r.primary_locator = Some("D12".into());
        assert!(!r.is_consistent());
    }

    #[test]
    fn candidate_source_json_names() {
        let json = serde_json::to_string(&CandidateSource::LlmRefined).unwrap();
        assert_eq!(json, "\"LLMRefined\"");
        let parsed: CandidateSource = serde_json::from_str("\"TargetField\"").unwrap();
        assert_eq!(parsed, CandidateSource::TargetField);
    }

    #[test]
    fn drug_evidence_defaults() {
        let json = r#"{ "drug_id": "d1", "trial_id": "NCT01" }"#;
        let d: DrugEvidence = serde_json::from_str(json).unwrap();
        assert!(d.candidates.is_empty());
        assert!(d.selection.is_none());
        assert!(d.candidate_set().is_empty());
    }
}
