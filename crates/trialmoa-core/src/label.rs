//! Super-group labels and resolution status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Report marker for a drug that never reached classification.
pub const NO_MECHANISM: &str = "no_mechanism";

/// Coarse pharmacologic category assigned to a resolved mechanism.
///
/// Nine classified categories plus [`Unclassified`](Self::Unclassified),
/// which is a valid outcome for a resolved term that no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperGroupLabel {
    ImmuneCheckpointImmuneModulation,
    TargetedPathwayInhibition,
    CytotoxicChemotherapy,
    HormonalEndocrine,
    CellAndGeneTherapy,
    VaccineImmunization,
    AntiInfective,
    NeuroPsychiatric,
    MetabolicCardiovascular,
    Unclassified,
}

impl SuperGroupLabel {
    /// Every label in report order.
    pub const ALL: [SuperGroupLabel; 10] = [
        Self::ImmuneCheckpointImmuneModulation,
        Self::TargetedPathwayInhibition,
        Self::CytotoxicChemotherapy,
        Self::HormonalEndocrine,
        Self::CellAndGeneTherapy,
        Self::VaccineImmunization,
        Self::AntiInfective,
        Self::NeuroPsychiatric,
        Self::MetabolicCardiovascular,
        Self::Unclassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmuneCheckpointImmuneModulation => "immune_checkpoint_immune_modulation",
            Self::TargetedPathwayInhibition => "targeted_pathway_inhibition",
            Self::CytotoxicChemotherapy => "cytotoxic_chemotherapy",
            Self::HormonalEndocrine => "hormonal_endocrine",
            Self::CellAndGeneTherapy => "cell_and_gene_therapy",
            Self::VaccineImmunization => "vaccine_immunization",
            Self::AntiInfective => "anti_infective",
            Self::NeuroPsychiatric => "neuro_psychiatric",
            Self::MetabolicCardiovascular => "metabolic_cardiovascular",
            Self::Unclassified => "unclassified",
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for SuperGroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuperGroupLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|l| l.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown super-group label '{s}'"))
    }
}

/// Report string for an optional label: `None` means the drug was unresolved.
pub fn label_or_marker(label: Option<SuperGroupLabel>) -> &'static str {
    label.map(|l| l.as_str()).unwrap_or(NO_MECHANISM)
}

/// Why a drug did or did not end up with a chosen term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// A candidate was chosen and found in the vocabulary.
    Resolved,
    /// No candidate strings were supplied.
    EmptyCandidates,
    /// The selector reported that no candidate is a suitable mechanism.
    NoSuitableTerm,
    /// The selector returned a string outside the candidate set.
    HallucinatedTerm,
    /// The chosen candidate has no vocabulary entry.
    NotInVocabulary,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::EmptyCandidates => "empty_candidates",
            Self::NoSuitableTerm => "no_suitable_term",
            Self::HallucinatedTerm => "hallucinated_term",
            Self::NotInVocabulary => "not_in_vocabulary",
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
