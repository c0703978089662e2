//! Compiled rule table.
//!
//! Rules are evaluated in declaration order and the first match wins, so
//! order is part of the table's meaning: a specific rule placed after a
//! general one it overlaps with can never fire.
//!
//! Keywords and terms both go through [`normalize_term`], the same key
//! function the vocabulary index uses, so "PD-1", "pd 1" and "PD 1" are one
//! keyword. Keywords are normalized once at compile time.

use trialmoa_core::config::validate_rule_table;
use trialmoa_core::{
    ConfigError, PipelineConfig, Predicate, RuleSpec, SuperGroupLabel, locator, normalize_term,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Keyword(Vec<String>),
    LocatorPrefix(Vec<String>),
    Any(Vec<Matcher>),
    All(Vec<Matcher>),
}

impl Matcher {
    fn compile(predicate: &Predicate) -> Self {
        match predicate {
            Predicate::Keyword(words) => {
                Self::Keyword(words.iter().map(|w| normalize_term(w)).collect())
            }
            Predicate::LocatorPrefix(prefixes) => Self::LocatorPrefix(prefixes.clone()),
            Predicate::Any(inner) => Self::Any(inner.iter().map(Self::compile).collect()),
            Predicate::All(inner) => Self::All(inner.iter().map(Self::compile).collect()),
        }
    }

    /// `term` must already be normalized.
    fn matches(&self, term: &str, primary_locator: Option<&str>) -> bool {
        match self {
            Self::Keyword(words) => words.iter().any(|w| term.contains(w.as_str())),
            Self::LocatorPrefix(prefixes) => primary_locator
                .is_some_and(|loc| prefixes.iter().any(|p| locator::is_within(loc, p))),
            Self::Any(inner) => inner.iter().any(|m| m.matches(term, primary_locator)),
            Self::All(inner) => inner.iter().all(|m| m.matches(term, primary_locator)),
        }
    }
}

/// One compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub label: SuperGroupLabel,
    pub predicate: Predicate,
    pub note: Option<String>,
    matcher: Matcher,
}

impl Rule {
    pub fn matches(&self, term: &str, primary_locator: Option<&str>) -> bool {
        self.matcher.matches(&normalize_term(term), primary_locator)
    }
}

/// Ordered, validated rules. See the module docs for the ordering contract.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, ConfigError> {
        validate_rule_table(specs)?;
        let rules = specs
            .iter()
            .map(|spec| Rule {
                label: spec.label,
                predicate: spec.when.clone(),
                note: spec.note.clone(),
                matcher: Matcher::compile(&spec.when),
            })
            .collect();
        Ok(Self { rules })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Self::compile(&config.rule_table)
    }

    /// Index and rule of the first match.
    pub fn first_match(&self, term: &str, primary_locator: Option<&str>) -> Option<(usize, &Rule)> {
        let key = normalize_term(term);
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matcher.matches(&key, primary_locator))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(label: SuperGroupLabel, when: Predicate) -> RuleSpec {
        RuleSpec {
            label,
            when,
            note: None,
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let table = RuleTable::compile(&[spec(
            SuperGroupLabel::AntiInfective,
            Predicate::keywords(["AntiViral"]),
        )])
        .unwrap();
        assert!(table.first_match("Antiviral Agents", None).is_some());
        assert!(table.first_match("ANTIVIRAL", None).is_some());
        assert!(table.first_match("Antibacterial", None).is_none());
    }

    #[test]
    fn punctuation_does_not_split_keywords_from_terms() {
        let table = RuleTable::compile(&[spec(
            SuperGroupLabel::ImmuneCheckpointImmuneModulation,
            Predicate::keywords(["PD-1", "ctla-4"]),
        )])
        .unwrap();
        assert!(table.first_match("PD 1 Receptor", None).is_some());
        assert!(table.first_match("pd-1 receptor", None).is_some());
        assert!(table.first_match("CTLA 4 Antigen", None).is_some());
        assert!(table.first_match("PD1 Receptor", None).is_none());
    }

    #[test]
    fn default_table_matches_spelling_variants() {
        let table = RuleTable::from_config(&PipelineConfig::default()).unwrap();
        for term in ["PD 1 Receptor", "CTLA4 antigen", "B7-H1 Antigen", "Lag 3 protein"] {
            let (_, rule) = table.first_match(term, None).unwrap();
            assert_eq!(
                rule.label,
                SuperGroupLabel::ImmuneCheckpointImmuneModulation,
                "{term}"
            );
        }
    }

    #[test]
    fn locator_predicates_need_a_locator() {
        let table = RuleTable::compile(&[spec(
            SuperGroupLabel::HormonalEndocrine,
            Predicate::locator_prefixes(["D06.472"]),
        )])
        .unwrap();
        assert!(table.first_match("x", Some("D06.472.040")).is_some());
        assert!(table.first_match("x", Some("D06.4721")).is_none());
        assert!(table.first_match("x", None).is_none());
    }

    #[test]
    fn all_and_any_compose() {
        let when = Predicate::All(vec![
            Predicate::keywords(["inhibitor"]),
            Predicate::Any(vec![
                Predicate::locator_prefixes(["D08"]),
                Predicate::keywords(["kinase"]),
            ]),
        ]);
        let table =
            RuleTable::compile(&[spec(SuperGroupLabel::TargetedPathwayInhibition, when)]).unwrap();
        assert!(table.first_match("Kinase Inhibitor", None).is_some());
        assert!(table.first_match("Enzyme Inhibitor", Some("D08.1")).is_some());
        assert!(table.first_match("Enzyme Inhibitor", Some("D12.1")).is_none());
        assert!(table.first_match("Kinase", Some("D08.1")).is_none());
    }

    #[test]
    fn first_match_wins() {
        let table = RuleTable::compile(&[
            spec(SuperGroupLabel::ImmuneCheckpointImmuneModulation, Predicate::keywords(["pd-1"])),
            spec(SuperGroupLabel::TargetedPathwayInhibition, Predicate::keywords(["inhibitor"])),
        ])
        .unwrap();
        let (i, rule) = table.first_match("PD-1 Inhibitor", None).unwrap();
        assert_eq!(i, 0);
        assert_eq!(rule.label, SuperGroupLabel::ImmuneCheckpointImmuneModulation);
        let (i, _) = table.first_match("MEK Inhibitor", None).unwrap();
        assert_eq!(i, 1);
    }

    #[test]
    fn compile_validates() {
        assert!(matches!(RuleTable::compile(&[]), Err(ConfigError::EmptyRuleTable)));
        assert!(matches!(
            RuleTable::compile(&[spec(SuperGroupLabel::AntiInfective, Predicate::Any(vec![]))]),
            Err(ConfigError::EmptyPredicate { index: 0 })
        ));
    }

    #[test]
    fn default_table_compiles() {
        let table = RuleTable::from_config(&PipelineConfig::default()).unwrap();
        assert_eq!(table.len(), PipelineConfig::default().rule_table.len());
    }
}
