//! Pipeline configuration: branch priority and the ordered rule table.
//!
//! Both tables are plain data loaded at startup (JSON) or taken from
//! [`crate::defaults`]. They are passed explicitly to the selector and the
//! classifier; nothing reads them from global state.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::label::SuperGroupLabel;
use crate::locator;
use crate::normalize::normalize_term;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("branch priority list is empty")]
    EmptyBranchPriority,

    #[error("branch priority entry {index} ('{code}') is not a valid locator prefix")]
    InvalidBranch { index: usize, code: String },

    #[error("branch '{0}' appears more than once in the priority list")]
    DuplicateBranch(String),

    #[error("rule table is empty")]
    EmptyRuleTable,

    #[error("rule {index} targets 'unclassified'; that label is reserved for no match")]
    UnclassifiedTarget { index: usize },

    #[error("rule {index} has an empty predicate")]
    EmptyPredicate { index: usize },
}

/// A test applied to a `(term, primary_locator)` pair.
///
/// Serialised externally tagged, e.g.
/// `{"any": [{"keyword": ["pd-1"]}, {"locator_prefix": ["D12.776.543"]}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Case-insensitive substring match of any keyword against the term.
    Keyword(Vec<String>),
    /// Primary locator equals or descends from any of these prefixes.
    LocatorPrefix(Vec<String>),
    /// At least one nested predicate holds.
    Any(Vec<Predicate>),
    /// Every nested predicate holds.
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn keywords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keyword(words.into_iter().map(Into::into).collect())
    }

    pub fn locator_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::LocatorPrefix(prefixes.into_iter().map(Into::into).collect())
    }

    /// True when this predicate, or any nested one, has nothing to test.
    /// A keyword that normalizes to nothing counts as empty.
    pub fn has_empty_list(&self) -> bool {
        match self {
            Self::Keyword(v) => v.is_empty() || v.iter().any(|k| normalize_term(k).is_empty()),
            Self::LocatorPrefix(v) => v.is_empty() || v.iter().any(|p| p.is_empty()),
            Self::Any(v) | Self::All(v) => v.is_empty() || v.iter().any(Self::has_empty_list),
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub label: SuperGroupLabel,
    pub when: Predicate,
    /// Free-text note shown by `trialmoa rules`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything the classification core needs besides the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Branch codes (or deeper locator prefixes), highest priority first.
    pub branch_priority: Vec<String>,
    /// Rules in evaluation order. Order is significant.
    pub rule_table: Vec<RuleSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            branch_priority: crate::defaults::branch_priority(),
            rule_table: crate::defaults::rule_table(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            branches = config.branch_priority.len(),
            rules = config.rule_table.len(),
            "loaded pipeline config"
        );
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks. Failing any of these is fatal to a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_branch_priority(&self.branch_priority)?;
        validate_rule_table(&self.rule_table)
    }

    /// Canonical bytes for fingerprinting cached results.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Struct and Vec serialisation is order-preserving, so this is stable.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Shared by [`PipelineConfig::validate`] and the selector's constructor.
pub fn validate_branch_priority(codes: &[String]) -> Result<(), ConfigError> {
    if codes.is_empty() {
        return Err(ConfigError::EmptyBranchPriority);
    }
    for (index, code) in codes.iter().enumerate() {
        if !locator::is_well_formed(code) {
            return Err(ConfigError::InvalidBranch {
                index,
                code: code.clone(),
            });
        }
        if codes[..index].contains(code) {
            return Err(ConfigError::DuplicateBranch(code.clone()));
        }
    }
    Ok(())
}

/// Shared by [`PipelineConfig::validate`] and the rule-table compiler.
pub fn validate_rule_table(rules: &[RuleSpec]) -> Result<(), ConfigError> {
    if rules.is_empty() {
        return Err(ConfigError::EmptyRuleTable);
    }
    for (index, rule) in rules.iter().enumerate() {
        if !rule.label.is_classified() {
            return Err(ConfigError::UnclassifiedTarget { index });
        }
        if rule.when.has_empty_list() {
            return Err(ConfigError::EmptyPredicate { index });
        }
    }
    Ok(())
}
