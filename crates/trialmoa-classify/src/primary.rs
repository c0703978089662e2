//! Primary locator selection.
//!
//! A record can sit at several places in the hierarchy. The primary locator
//! is the one used for classification: the deepest locator under the
//! highest-priority branch the record appears in. Branch rank strictly
//! dominates depth, and there is no fallback to branches outside the
//! priority list.

use trialmoa_core::config::validate_branch_priority;
use trialmoa_core::{ConfigError, VocabularyRecord, locator};

/// Ordered branch codes (or deeper prefixes), highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPriority(Vec<String>);

impl BranchPriority {
    pub fn new(codes: Vec<String>) -> Result<Self, ConfigError> {
        validate_branch_priority(&codes)?;
        Ok(Self(codes))
    }

    /// Rank of the first entry containing `locator`, if any.
    pub fn rank_of(&self, locator: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|code| locator::is_within(locator, code))
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }
}

/// Primary locator of `record`, or `None` when none of its locators lies
/// in a prioritised branch.
pub fn select_primary(record: &VocabularyRecord, priority: &BranchPriority) -> Option<String> {
    select_from(record.tree_locators.iter().map(String::as_str), priority).map(str::to_string)
}

/// Ranking key of the winning locator: `(rank, depth)`.
pub(crate) fn primary_key(
    record: &VocabularyRecord,
    priority: &BranchPriority,
) -> Option<(usize, usize)> {
    let best = select_from(record.tree_locators.iter().map(String::as_str), priority)?;
    Some((priority.rank_of(best)?, locator::depth(best)))
}

/// Selection over any set of locators.
///
/// Lower rank wins; within a rank the deeper locator wins; equal depth
/// falls back to the lexicographically smallest string.
pub fn select_from<'a, I>(locators: I, priority: &BranchPriority) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, usize, &'a str)> = None;
    for loc in locators {
        let Some(rank) = priority.rank_of(loc) else {
            continue;
        };
        let depth = locator::depth(loc);
        let better = match best {
            None => true,
            Some((r, d, l)) => {
                rank < r || (rank == r && (depth > d || (depth == d && loc < l)))
            }
        };
        if better {
            best = Some((rank, depth, loc));
        }
    }
    best.map(|(_, _, l)| l)
}
