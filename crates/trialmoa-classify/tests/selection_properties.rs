use proptest::prelude::*;
use trialmoa_classify::{BranchPriority, resolve, select_primary};
use trialmoa_core::{CandidateSet, RecordKind, ResolutionStatus, VocabularyRecord, locator};
use trialmoa_vocab::{RawRecord, SourceBatch, VocabularyIndex};

fn priority() -> BranchPriority {
    BranchPriority::new(vec!["D12".into(), "D08".into(), "D27".into()]).unwrap()
}

fn arb_locator() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["D12", "D08", "D27", "C04", "D26"]),
        prop::collection::vec(0u16..1000, 0..5),
    )
        .prop_map(|(branch, segments)| {
            let mut loc = branch.to_string();
            for s in segments {
                loc.push_str(&format!(".{s:03}"));
            }
            loc
        })
}

fn index_of(terms: &[String]) -> VocabularyIndex {
    let records = terms
        .iter()
        .enumerate()
        .map(|(i, t)| RawRecord {
            record_id: format!("D{i:06}"),
            preferred_term: t.clone(),
            tree_locators: vec![format!("D12.{i:03}")],
            ..Default::default()
        })
        .collect();
    let batch = SourceBatch {
        name: "generated".into(),
        kind: RecordKind::Descriptor,
        records,
        malformed: 0,
    };
    VocabularyIndex::build([batch]).unwrap().0
}

proptest! {
    #[test]
    fn chosen_term_is_always_a_candidate(
        terms in prop::collection::btree_set("[a-z]{3,10}", 1..6),
        pick in any::<prop::sample::Index>(),
        garbage in "[a-z]{3,10}",
        honest in any::<bool>(),
    ) {
        let terms: Vec<String> = terms.into_iter().collect();
        let index = index_of(&terms);
        let candidates: CandidateSet = terms.iter().cloned().collect();
        let answer = if honest { pick.get(&terms).clone() } else { garbage.clone() };
        let selector = move |_: &str, _: &CandidateSet| Some(answer.clone());

        let r = resolve(&index, "drug", candidates.clone(), &selector);

        if let Some(chosen) = &r.mechanism.chosen_term {
            prop_assert!(candidates.contains(chosen));
            prop_assert_eq!(r.status, ResolutionStatus::Resolved);
        } else if !honest && !candidates.contains(&garbage) {
            prop_assert_eq!(r.status, ResolutionStatus::HallucinatedTerm);
        }
        prop_assert!(r.mechanism.is_consistent());
    }

    #[test]
    fn primary_locator_respects_branch_dominance(
        locators in prop::collection::vec(arb_locator(), 0..8),
    ) {
        let p = priority();
        let record = VocabularyRecord::new("D1", "Test", RecordKind::Descriptor)
            .with_locators(locators.iter().cloned());
        let chosen = select_primary(&record, &p);

        let best_rank = locators.iter().filter_map(|l| p.rank_of(l)).min();
        match (chosen, best_rank) {
            (None, None) => {}
            (Some(loc), Some(rank)) => {
                prop_assert!(record.tree_locators.contains(&loc));
                prop_assert_eq!(p.rank_of(&loc), Some(rank));
                let deepest = locators
                    .iter()
                    .filter(|l| p.rank_of(l) == Some(rank))
                    .map(|l| locator::depth(l))
                    .max();
                prop_assert_eq!(Some(locator::depth(&loc)), deepest);
            }
            (chosen, rank) => prop_assert!(false, "chosen {:?} with best rank {:?}", chosen, rank),
        }
    }

    #[test]
    fn primary_selection_is_order_independent(
        locators in prop::collection::vec(arb_locator(), 0..8),
    ) {
        let p = priority();
        let mut locators = locators;
        let forward = VocabularyRecord::new("D1", "Test", RecordKind::Descriptor)
            .with_locators(locators.iter().cloned());
        locators.reverse();
        let backward = VocabularyRecord::new("D1", "Test", RecordKind::Descriptor)
            .with_locators(locators.iter().cloned());
        prop_assert_eq!(select_primary(&forward, &p), select_primary(&backward, &p));
    }
}

#[test]
fn deeper_locator_breaks_tie_within_branch() {
    let record = VocabularyRecord::new("D1", "Test", RecordKind::Descriptor)
        .with_locators(["D12.644", "D12.644.276"]);
    assert_eq!(
        select_primary(&record, &priority()).as_deref(),
        Some("D12.644.276")
    );
}
