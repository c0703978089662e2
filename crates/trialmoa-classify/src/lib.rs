//! Classification core: resolve each drug to one vocabulary term, pick its
//! primary tree locator, and map it onto a mechanism super-group.

pub mod classifier;
mod error;
pub mod pipeline;
pub mod primary;
pub mod resolver;
pub mod rules;

pub use classifier::{Classification, Classifier, classify};
pub use error::{CacheError, PipelineError, ValidationError};
pub use pipeline::{
    CacheEntry, CacheLookup, CorpusReport, DrugOutcome, DrugRow, LabelCount, MemoryCache,
    Pipeline, ResultCache, RunStats, TrialRow,
};
pub use primary::{BranchPriority, select_primary};
pub use resolver::{
    MechanismSelector, PrecomputedSelector, Resolution, VocabularySelector, resolve,
    validate_selection,
};
pub use rules::{Rule, RuleTable};
