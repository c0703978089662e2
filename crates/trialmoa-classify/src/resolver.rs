//! Term resolution: pick one canonical mechanism term per drug.
//!
//! The choice itself is delegated to a [`MechanismSelector`]. Whatever the
//! selector returns is checked against the candidate set byte for byte; a
//! value outside the set is rejected as a hallucination and never coerced
//! to a near match. A valid choice must also be present in the vocabulary.

use std::collections::HashMap;

use trialmoa_core::{
    CandidateSet, DrugEvidence, ResolutionStatus, ResolvedMechanism, VocabularyRecord,
};
use trialmoa_vocab::VocabularyIndex;

use crate::error::ValidationError;
use crate::primary::{BranchPriority, primary_key};

/// Chooses the most mechanism-specific term from a candidate set.
///
/// `drug_id` is context only. Implementations must be shareable across
/// the worker pool.
pub trait MechanismSelector: Send + Sync {
    fn select(&self, drug_id: &str, candidates: &CandidateSet) -> Option<String>;

    /// Bytes that identify what this selector answers for `drug_id`.
    /// They are part of the cache fingerprint, so a changed answer or a
    /// different kind of selector invalidates cached outcomes. The default
    /// contributes nothing.
    fn fingerprint_input(&self, _drug_id: &str) -> Vec<u8> {
        Vec::new()
    }
}

impl<F> MechanismSelector for F
where
    F: Fn(&str, &CandidateSet) -> Option<String> + Send + Sync,
{
    fn select(&self, drug_id: &str, candidates: &CandidateSet) -> Option<String> {
        self(drug_id, candidates)
    }
}

/// Answers produced ahead of time by the external selection service.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedSelector {
    selections: HashMap<String, String>,
}

impl PrecomputedSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the `selection` field of every drug that has one.
    pub fn from_evidence(drugs: &[DrugEvidence]) -> Self {
        let selections = drugs
            .iter()
            .filter_map(|d| Some((d.drug_id.clone(), d.selection.clone()?)))
            .collect();
        Self { selections }
    }

    pub fn insert(&mut self, drug_id: impl Into<String>, term: impl Into<String>) {
        self.selections.insert(drug_id.into(), term.into());
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

impl MechanismSelector for PrecomputedSelector {
    fn select(&self, drug_id: &str, _candidates: &CandidateSet) -> Option<String> {
        self.selections.get(drug_id).cloned()
    }

    fn fingerprint_input(&self, drug_id: &str) -> Vec<u8> {
        let mut bytes = b"precomputed\0".to_vec();
        match self.selections.get(drug_id) {
            Some(term) => {
                bytes.push(1);
                bytes.extend_from_slice(term.as_bytes());
            }
            None => bytes.push(0),
        }
        bytes
    }
}

/// Offline selector driven by the hierarchy alone.
///
/// Among candidates found in the vocabulary, prefers the one whose primary
/// locator ranks best: highest-priority branch, then deepest, then the
/// lexicographically smallest candidate. Candidates without a primary
/// locator are never chosen.
pub struct VocabularySelector<'a> {
    index: &'a VocabularyIndex,
    priority: &'a BranchPriority,
}

impl<'a> VocabularySelector<'a> {
    pub fn new(index: &'a VocabularyIndex, priority: &'a BranchPriority) -> Self {
        Self { index, priority }
    }
}

impl MechanismSelector for VocabularySelector<'_> {
    fn select(&self, _drug_id: &str, candidates: &CandidateSet) -> Option<String> {
        let mut best: Option<(usize, usize, &str)> = None;
        // Candidate iteration is sorted, so the first of equal keys is the smallest.
        for candidate in candidates.iter() {
            let Some(record) = self.index.lookup(candidate) else {
                continue;
            };
            let Some((rank, depth)) = primary_key(record, self.priority) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((r, d, _)) => rank < r || (rank == r && depth > d),
            };
            if better {
                best = Some((rank, depth, candidate));
            }
        }
        best.map(|(_, _, term)| term.to_string())
    }

    fn fingerprint_input(&self, _drug_id: &str) -> Vec<u8> {
        b"vocabulary".to_vec()
    }
}

/// Check a selector's answer against the candidate set.
///
/// `None` passes through as "no suitable term".
pub fn validate_selection(
    drug_id: &str,
    candidates: &CandidateSet,
    choice: Option<String>,
) -> Result<Option<String>, ValidationError> {
    match choice {
        None => Ok(None),
        Some(term) if candidates.contains(&term) => Ok(Some(term)),
        Some(term) => Err(ValidationError::HallucinatedTerm {
            drug_id: drug_id.to_string(),
            term,
        }),
    }
}

/// Result of resolving one drug. `record` is set exactly when the
/// mechanism is resolved.
#[derive(Debug, Clone)]
pub struct Resolution<'v> {
    pub mechanism: ResolvedMechanism,
    pub status: ResolutionStatus,
    pub record: Option<&'v VocabularyRecord>,
}

impl Resolution<'_> {
    fn unresolved(drug_id: &str, candidates: CandidateSet, status: ResolutionStatus) -> Self {
        Self {
            mechanism: ResolvedMechanism::unresolved(drug_id, candidates),
            status,
            record: None,
        }
    }
}

/// Resolve a drug's candidate set against the vocabulary.
///
/// The primary locator is left empty; the caller fills it from `record`.
pub fn resolve<'v>(
    index: &'v VocabularyIndex,
    drug_id: &str,
    candidates: CandidateSet,
    selector: &dyn MechanismSelector,
) -> Resolution<'v> {
    if candidates.is_empty() {
        return Resolution::unresolved(drug_id, candidates, ResolutionStatus::EmptyCandidates);
    }

    let choice = selector.select(drug_id, &candidates);
    let term = match validate_selection(drug_id, &candidates, choice) {
        Ok(Some(term)) => term,
        Ok(None) => {
            return Resolution::unresolved(drug_id, candidates, ResolutionStatus::NoSuitableTerm);
        }
        Err(err) => {
            tracing::warn!(%err, candidates = candidates.len(), "rejecting selection");
            return Resolution::unresolved(drug_id, candidates, ResolutionStatus::HallucinatedTerm);
        }
    };

    let Some(record) = index.lookup(&term) else {
        tracing::debug!(drug_id, term = %term, "chosen term not in vocabulary");
        return Resolution::unresolved(drug_id, candidates, ResolutionStatus::NotInVocabulary);
    };

    match ResolvedMechanism::resolved(drug_id, candidates.clone(), term, None) {
        Some(mechanism) => Resolution {
            mechanism,
            status: ResolutionStatus::Resolved,
            record: Some(record),
        },
        // validate_selection already established membership
        None => Resolution::unresolved(drug_id, candidates, ResolutionStatus::HallucinatedTerm),
    }
}
