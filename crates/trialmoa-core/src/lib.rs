pub mod config;
pub mod defaults;
pub mod label;
pub mod locator;
pub mod normalize;
pub mod schema;
pub mod types;

pub use config::{ConfigError, PipelineConfig, Predicate, RuleSpec};
pub use label::{NO_MECHANISM, ResolutionStatus, SuperGroupLabel, label_or_marker};
pub use normalize::normalize_term;
pub use schema::report;
pub use types::{
    CandidateSet, CandidateSource, DrugEvidence, MechanismCandidate, RecordKind,
    ResolvedMechanism, VocabularyRecord,
};
