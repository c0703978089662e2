use thiserror::Error;
use trialmoa_core::ConfigError;

/// The selection capability returned something outside the candidate set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("selection '{term}' for drug {drug_id} is not one of its candidates")]
    HallucinatedTerm { drug_id: String, term: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("drug id '{0}' appears more than once in the input")]
    DuplicateDrug(String),

    #[error("drug input has an empty drug id (row {0})")]
    MissingDrugId(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
