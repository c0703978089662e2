//! Rule-based super-group classification.
//!
//! Maps a resolved `(term, primary_locator)` pair onto one of the fixed
//! super-group labels by walking the [`RuleTable`]. A pair no rule matches
//! is `unclassified`, which is a valid outcome and distinct from a drug that
//! never resolved to a term at all.

use trialmoa_core::SuperGroupLabel;

use crate::rules::RuleTable;

/// Classifier over an ordered rule table.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleTable,
}

/// Label plus the index of the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: SuperGroupLabel,
    /// `None` when no rule matched.
    pub rule_index: Option<usize>,
}

impl Classifier {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn classify(&self, term: &str, primary_locator: Option<&str>) -> SuperGroupLabel {
        self.explain(term, primary_locator).label
    }

    /// Like [`classify`](Self::classify), also reporting which rule fired.
    pub fn explain(&self, term: &str, primary_locator: Option<&str>) -> Classification {
        match self.rules.first_match(term, primary_locator) {
            Some((index, rule)) => Classification {
                label: rule.label,
                rule_index: Some(index),
            },
            None => Classification {
                label: SuperGroupLabel::Unclassified,
                rule_index: None,
            },
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

/// One-shot classification against an explicit table.
pub fn classify(term: &str, primary_locator: Option<&str>, rules: &RuleTable) -> SuperGroupLabel {
    rules
        .first_match(term, primary_locator)
        .map(|(_, rule)| rule.label)
        .unwrap_or(SuperGroupLabel::Unclassified)
}
