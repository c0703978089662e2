//! Corpus pipeline: resolve, select primary locator, classify, aggregate.
//!
//! Per-drug work is pure and fans out over the rayon pool. Cache reads
//! happen before the fan-out and cache writes after it, on the calling
//! thread, so a [`ResultCache`] needs no interior locking. Results are
//! collected back into input order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use trialmoa_core::{
    CandidateSet, ConfigError, DrugEvidence, NO_MECHANISM, PipelineConfig, ResolutionStatus,
    ResolvedMechanism, SuperGroupLabel, label_or_marker,
};
use trialmoa_vocab::VocabularyIndex;

use crate::classifier::Classifier;
use crate::error::{CacheError, PipelineError};
use crate::primary::{BranchPriority, select_primary};
use crate::resolver::{MechanismSelector, Resolution, resolve};
use crate::rules::RuleTable;

/// Final result for one drug.
///
/// `label` is `Some` exactly when the mechanism resolved; an unresolved
/// drug is reported with the `no_mechanism` marker, never `unclassified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugOutcome {
    pub mechanism: ResolvedMechanism,
    pub status: ResolutionStatus,
    pub label: Option<SuperGroupLabel>,
}

impl DrugOutcome {
    pub fn is_consistent(&self) -> bool {
        let resolved = self.mechanism.is_resolved();
        self.mechanism.is_consistent()
            && self.status.is_resolved() == resolved
            && self.label.is_some() == resolved
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// A stored outcome together with the fingerprint of the inputs that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub drug_id: String,
    pub fingerprint: String,
    pub outcome: DrugOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(DrugOutcome),
    /// An entry exists but was produced from different inputs, or could
    /// not be read back. It will be recomputed and overwritten.
    Stale,
    Miss,
}

/// Persistent memo of per-drug outcomes, keyed by drug id.
pub trait ResultCache {
    fn get(&self, drug_id: &str, fingerprint: &str) -> Result<CacheLookup, CacheError>;
    fn put(&mut self, entry: CacheEntry) -> Result<(), CacheError>;
}

/// In-process cache. Used for single runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, drug_id: &str, fingerprint: &str) -> Result<CacheLookup, CacheError> {
        Ok(match self.entries.get(drug_id) {
            Some(entry) if entry.fingerprint == fingerprint => CacheLookup::Hit(entry.outcome.clone()),
            Some(_) => CacheLookup::Stale,
            None => CacheLookup::Miss,
        })
    }

    fn put(&mut self, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.insert(entry.drug_id.clone(), entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Placeholder for a missing chosen term in joined trial columns.
pub const MISSING_TERM: &str = "-";

/// Separator for per-trial joined columns.
pub const JOIN_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugRow {
    pub drug_id: String,
    pub trial_id: String,
    pub chosen_term: Option<String>,
    pub primary_locator: Option<String>,
    pub label: Option<SuperGroupLabel>,
    pub status: ResolutionStatus,
}

impl DrugRow {
    pub fn label_str(&self) -> &'static str {
        label_or_marker(self.label)
    }
}

/// Drugs of one trial, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRow {
    pub trial_id: String,
    pub drug_ids: Vec<String>,
    pub chosen_terms: Vec<Option<String>>,
    pub labels: Vec<Option<SuperGroupLabel>>,
}

impl TrialRow {
    pub fn joined_drug_ids(&self) -> String {
        self.drug_ids.join(JOIN_SEPARATOR)
    }

    pub fn joined_terms(&self) -> String {
        self.chosen_terms
            .iter()
            .map(|t| t.as_deref().unwrap_or(MISSING_TERM))
            .collect::<Vec<_>>()
            .join(JOIN_SEPARATOR)
    }

    pub fn joined_labels(&self) -> String {
        self.labels
            .iter()
            .map(|l| label_or_marker(*l))
            .collect::<Vec<_>>()
            .join(JOIN_SEPARATOR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub super_group_label: &'static str,
    pub count: u64,
}

/// Drug table, trial table and label frequencies for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusReport {
    pub drugs: Vec<DrugRow>,
    pub trials: Vec<TrialRow>,
    pub frequencies: Vec<LabelCount>,
}

impl CorpusReport {
    /// Assemble from drugs and their outcomes, which must be index-aligned.
    pub fn build(drugs: &[DrugEvidence], outcomes: Vec<DrugOutcome>) -> Self {
        let rows: Vec<DrugRow> = drugs
            .iter()
            .zip(outcomes)
            .map(|(drug, outcome)| DrugRow {
                drug_id: drug.drug_id.clone(),
                trial_id: drug.trial_id.clone(),
                chosen_term: outcome.mechanism.chosen_term,
                primary_locator: outcome.mechanism.primary_locator,
                label: outcome.label,
                status: outcome.status,
            })
            .collect();

        let mut by_trial: BTreeMap<&str, TrialRow> = BTreeMap::new();
        for row in &rows {
            let trial = by_trial
                .entry(row.trial_id.as_str())
                .or_insert_with(|| TrialRow {
                    trial_id: row.trial_id.clone(),
                    drug_ids: Vec::new(),
                    chosen_terms: Vec::new(),
                    labels: Vec::new(),
                });
            trial.drug_ids.push(row.drug_id.clone());
            trial.chosen_terms.push(row.chosen_term.clone());
            trial.labels.push(row.label);
        }
        let trials = by_trial.into_values().collect();

        let mut counts: HashMap<&'static str, u64> = HashMap::new();
        for row in &rows {
            *counts.entry(row.label_str()).or_default() += 1;
        }
        let frequencies = SuperGroupLabel::ALL
            .iter()
            .map(SuperGroupLabel::as_str)
            .chain(std::iter::once(NO_MECHANISM))
            .map(|label| LabelCount {
                super_group_label: label,
                count: counts.get(label).copied().unwrap_or(0),
            })
            .collect();

        Self {
            drugs: rows,
            trials,
            frequencies,
        }
    }

    /// Count for a label name or the `no_mechanism` marker.
    pub fn count(&self, label: &str) -> u64 {
        self.frequencies
            .iter()
            .find(|f| f.super_group_label == label)
            .map_or(0, |f| f.count)
    }
}

/// Bookkeeping for one run. Not part of the report, so warm and cold runs
/// produce identical reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub cached: usize,
    pub computed: usize,
    /// Entries found but discarded (fingerprint mismatch, unreadable or
    /// inconsistent).
    pub stale: usize,
    pub resolved: usize,
    pub unclassified: usize,
    pub hallucinated: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The classification core bound to a vocabulary and a config.
pub struct Pipeline<'v> {
    index: &'v VocabularyIndex,
    priority: BranchPriority,
    classifier: Classifier,
    config_bytes: Vec<u8>,
}

impl<'v> Pipeline<'v> {
    pub fn new(index: &'v VocabularyIndex, config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            index,
            priority: BranchPriority::new(config.branch_priority.clone())?,
            classifier: Classifier::new(RuleTable::from_config(config)?),
            config_bytes: config.canonical_bytes(),
        })
    }

    pub fn index(&self) -> &'v VocabularyIndex {
        self.index
    }

    pub fn priority(&self) -> &BranchPriority {
        &self.priority
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Cache fingerprint: blake3 over the drug id, its candidate set, the
    /// selector's [`fingerprint_input`](MechanismSelector::fingerprint_input)
    /// and the config.
    pub fn fingerprint(
        &self,
        drug_id: &str,
        candidates: &CandidateSet,
        selector: &dyn MechanismSelector,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(drug_id.as_bytes());
        hasher.update(&[0]);
        for term in candidates.iter() {
            hasher.update(term.as_bytes());
            hasher.update(&[0]);
        }
        let selector_input = selector.fingerprint_input(drug_id);
        hasher.update(&[1]);
        hasher.update(&(selector_input.len() as u64).to_le_bytes());
        hasher.update(&selector_input);
        hasher.update(&[2]);
        hasher.update(&self.config_bytes);
        hasher.finalize().to_hex().to_string()
    }

    /// Resolve, select primary and classify a single drug.
    pub fn process(
        &self,
        drug_id: &str,
        candidates: CandidateSet,
        selector: &dyn MechanismSelector,
    ) -> DrugOutcome {
        let Resolution {
            mut mechanism,
            status,
            record,
        } = resolve(self.index, drug_id, candidates, selector);

        let label = match record {
            Some(record) => {
                mechanism.primary_locator = select_primary(record, &self.priority);
                let term = mechanism.chosen_term.as_deref().unwrap_or(record.term.as_str());
                Some(
                    self.classifier
                        .classify(term, mechanism.primary_locator.as_deref()),
                )
            }
            None => None,
        };

        tracing::debug!(
            drug_id,
            status = status.as_str(),
            primary_locator = mechanism.primary_locator.as_deref().unwrap_or(""),
            label = label_or_marker(label),
            "processed drug"
        );
        DrugOutcome {
            mechanism,
            status,
            label,
        }
    }

    /// Classify a corpus of drugs.
    ///
    /// Drug ids must be unique. Drugs with a cached outcome for the same
    /// fingerprint are not recomputed; everything else is computed in
    /// parallel and written back to the cache.
    pub fn run(
        &self,
        drugs: &[DrugEvidence],
        selector: &dyn MechanismSelector,
        cache: &mut dyn ResultCache,
    ) -> Result<(CorpusReport, RunStats), PipelineError> {
        let start = Instant::now();
        check_drug_ids(drugs)?;

        let candidate_sets: Vec<CandidateSet> =
            drugs.iter().map(DrugEvidence::candidate_set).collect();
        let fingerprints: Vec<String> = drugs
            .iter()
            .zip(&candidate_sets)
            .map(|(drug, candidates)| self.fingerprint(&drug.drug_id, candidates, selector))
            .collect();

        let mut stats = RunStats {
            total: drugs.len(),
            ..RunStats::default()
        };
        let mut outcomes: Vec<Option<DrugOutcome>> = Vec::with_capacity(drugs.len());
        for (drug, fingerprint) in drugs.iter().zip(&fingerprints) {
            let reused = match cache.get(&drug.drug_id, fingerprint)? {
                CacheLookup::Hit(outcome)
                    if outcome.mechanism.drug_id == drug.drug_id && outcome.is_consistent() =>
                {
                    Some(outcome)
                }
                CacheLookup::Hit(_) => {
                    tracing::warn!(drug_id = %drug.drug_id, "discarding inconsistent cache entry");
                    stats.stale += 1;
                    None
                }
                CacheLookup::Stale => {
                    stats.stale += 1;
                    None
                }
                CacheLookup::Miss => None,
            };
            outcomes.push(reused);
        }
        stats.cached = outcomes.iter().filter(|o| o.is_some()).count();

        let pending: Vec<usize> = (0..drugs.len()).filter(|&i| outcomes[i].is_none()).collect();
        let computed: Vec<(usize, DrugOutcome)> = pending
            .par_iter()
            .map(|&i| {
                let outcome = self.process(&drugs[i].drug_id, candidate_sets[i].clone(), selector);
                (i, outcome)
            })
            .collect();
        stats.computed = computed.len();

        for (i, outcome) in computed {
            cache.put(CacheEntry {
                drug_id: drugs[i].drug_id.clone(),
                fingerprint: fingerprints[i].clone(),
                outcome: outcome.clone(),
            })?;
            outcomes[i] = Some(outcome);
        }

        let outcomes: Vec<DrugOutcome> = outcomes.into_iter().flatten().collect();
        for outcome in &outcomes {
            if outcome.status.is_resolved() {
                stats.resolved += 1;
            }
            if outcome.label == Some(SuperGroupLabel::Unclassified) {
                stats.unclassified += 1;
            }
            if outcome.status == ResolutionStatus::HallucinatedTerm {
                stats.hallucinated += 1;
            }
        }

        let report = CorpusReport::build(drugs, outcomes);
        tracing::info!(
            drugs = stats.total,
            cached = stats.cached,
            computed = stats.computed,
            stale = stats.stale,
            resolved = stats.resolved,
            unclassified = stats.unclassified,
            hallucinated = stats.hallucinated,
            trials = report.trials.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline run complete"
        );
        Ok((report, stats))
    }
}

fn check_drug_ids(drugs: &[DrugEvidence]) -> Result<(), PipelineError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(drugs.len());
    for (row, drug) in drugs.iter().enumerate() {
        if drug.drug_id.trim().is_empty() {
            return Err(PipelineError::MissingDrugId(row));
        }
        if !seen.insert(drug.drug_id.as_str()) {
            return Err(PipelineError::DuplicateDrug(drug.drug_id.clone()));
        }
    }
    Ok(())
}
