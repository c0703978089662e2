//! Built-in branch priority and rule table.
//!
//! Used when no config file is supplied. Rule order is significant: the
//! checkpoint rule must precede the targeted-pathway rule because checkpoint
//! receptor terms can also name a kinase or signalling target, and the
//! cell/gene therapy and vaccine rules precede the broad immune-modulation
//! rule.
//!
//! No rule keys on the bare word "inhibitor". Most MeSH pharmacologic
//! classes are named "... Inhibitors" ("Cholinesterase Inhibitors",
//! "HIV Protease Inhibitors"), so the word says nothing about the bucket.

use crate::config::{Predicate, RuleSpec};
use crate::label::SuperGroupLabel;

/// Pharmacologic branches, highest relevance first:
/// D12 (amino acids, peptides, proteins: receptors and ligands),
/// D08 (enzymes and coenzymes), D27 (chemical actions and uses).
pub const BRANCH_PRIORITY: &[&str] = &["D12", "D08", "D27"];

pub fn branch_priority() -> Vec<String> {
    BRANCH_PRIORITY.iter().map(|s| s.to_string()).collect()
}

fn rule(label: SuperGroupLabel, when: Predicate, note: &str) -> RuleSpec {
    RuleSpec {
        label,
        when,
        note: Some(note.to_string()),
    }
}

pub fn rule_table() -> Vec<RuleSpec> {
    use SuperGroupLabel::*;

    vec![
        rule(
            ImmuneCheckpointImmuneModulation,
            Predicate::keywords([
                "programmed cell death 1",
                "pd-1",
                "pd-l1",
                "b7-h1",
                "cd274",
                "ctla-4",
                "ctla4",
                "lag-3",
                "tim-3",
                "tigit",
                "immune checkpoint",
            ]),
            "checkpoint receptors and ligands; before pathway inhibitors",
        ),
        rule(
            CellAndGeneTherapy,
            Predicate::keywords([
                "chimeric antigen receptor",
                "car-t",
                "car t",
                "gene therapy",
                "genetic therapy",
                "adoptive",
                "oncolytic",
                "stem cell transplant",
            ]),
            "engineered cells and gene transfer",
        ),
        rule(
            VaccineImmunization,
            Predicate::Any(vec![
                Predicate::keywords(["vaccin", "immunization", "toxoid"]),
                Predicate::locator_prefixes(["D20.215.894"]),
            ]),
            "vaccines branch or vaccine wording",
        ),
        rule(
            HormonalEndocrine,
            Predicate::Any(vec![
                Predicate::keywords([
                    "estrogen",
                    "androgen",
                    "aromatase",
                    "gonadotropin",
                    "progest",
                    "glucocorticoid",
                    "somatostatin",
                    "thyroid",
                    "hormone",
                ]),
                Predicate::locator_prefixes(["D06.472"]),
            ]),
            "hormones, antagonists and receptors",
        ),
        rule(
            CytotoxicChemotherapy,
            Predicate::keywords([
                "alkylating",
                "antimetabolite",
                "topoisomerase",
                "tubulin",
                "microtubule",
                "antimitotic",
                "anthracycline",
                "platinum",
                "dna synthesis",
                "folic acid antagonist",
            ]),
            "classical cytotoxics",
        ),
        rule(
            TargetedPathwayInhibition,
            Predicate::Any(vec![
                Predicate::keywords([
                    "kinase",
                    "egfr",
                    "erbb",
                    "her2",
                    "vegf",
                    "mtor",
                    "parp",
                    "braf",
                    "mek",
                    "jak",
                    "cdk",
                    "bcl-2",
                    "proteasome",
                    "histone deacetylase",
                    "signal transduction",
                ]),
                Predicate::locator_prefixes(["D08.811.913.696.620.682"]),
            ]),
            "generic targeted agents; must stay after the checkpoint rule",
        ),
        rule(
            AntiInfective,
            Predicate::Any(vec![
                Predicate::keywords([
                    "antibacterial",
                    "antiviral",
                    "antifungal",
                    "anti-infective",
                    "antibiotic",
                    "antiretroviral",
                    "antiparasitic",
                    "hiv",
                    "reverse transcriptase",
                    "neuraminidase",
                    "beta-lactamase",
                ]),
                Predicate::locator_prefixes(["D27.505.954.122"]),
            ]),
            "anti-infective agents",
        ),
        rule(
            NeuroPsychiatric,
            Predicate::Any(vec![
                Predicate::keywords([
                    "neurotransmitter",
                    "dopamine",
                    "serotonin",
                    "gaba",
                    "opioid",
                    "cholinergic",
                    "cholinesterase",
                    "adrenergic",
                    "cannabinoid",
                    "glutamate",
                    "analgesic",
                ]),
                Predicate::locator_prefixes(["D27.505.954.427"]),
            ]),
            "central nervous system agents and receptors",
        ),
        rule(
            MetabolicCardiovascular,
            Predicate::Any(vec![
                Predicate::keywords([
                    "insulin",
                    "glucagon",
                    "incretin",
                    "lipid",
                    "cholesterol",
                    "hmg-coa",
                    "hydroxymethylglutaryl",
                    "angiotensin",
                    "diuretic",
                    "anticoagulant",
                    "platelet aggregation",
                    "sodium-glucose",
                ]),
                Predicate::locator_prefixes(["D27.505.954.411"]),
            ]),
            "metabolic and cardiovascular agents",
        ),
        rule(
            ImmuneCheckpointImmuneModulation,
            Predicate::keywords([
                "interleukin",
                "interferon",
                "tumor necrosis factor",
                "immunomodulat",
                "immunosuppress",
                "cytokine",
                "toll-like receptor",
            ]),
            "broad immune modulation; last so specific classes win",
        ),
    ]
}
