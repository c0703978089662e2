use proptest::prelude::*;
use trialmoa_core::{RecordKind, normalize_term};
use trialmoa_vocab::{RawRecord, SourceBatch, VocabularyIndex};

fn arb_records() -> impl Strategy<Value = Vec<RawRecord>> {
    prop::collection::vec(
        (
            "[A-Za-z][A-Za-z ,-]{0,12}",
            prop::collection::vec("[A-Za-z][A-Za-z -]{0,8}", 0..3),
            prop::collection::vec("D[0-9]{2}(\\.[0-9]{3}){0,3}", 0..3),
        ),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (term, synonyms, locators))| RawRecord {
                record_id: format!("D{i:06}"),
                preferred_term: term,
                synonym_terms: synonyms,
                tree_locators: locators,
                ..Default::default()
            })
            .collect()
    })
}

fn source(records: &[RawRecord]) -> SourceBatch {
    SourceBatch {
        name: "generated".into(),
        kind: RecordKind::Descriptor,
        records: records.to_vec(),
        malformed: 0,
    }
}

proptest! {
    #[test]
    fn building_twice_gives_identical_lookups(records in arb_records()) {
        let first = VocabularyIndex::build([source(&records)]);
        let second = VocabularyIndex::build([source(&records)]);

        match (first, second) {
            (Ok((a, _)), Ok((b, _))) => {
                prop_assert_eq!(a.len(), b.len());
                prop_assert_eq!(a.term_count(), b.term_count());
                for raw in &records {
                    for term in std::iter::once(&raw.preferred_term).chain(&raw.synonym_terms) {
                        prop_assert_eq!(a.lookup(term), b.lookup(term));
                    }
                }
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "builds disagreed on success"),
        }
    }

    #[test]
    fn every_committed_term_resolves_to_its_record(records in arb_records()) {
        if let Ok((index, _)) = VocabularyIndex::build([source(&records)]) {
            for record in index.records() {
                for term in record.all_terms() {
                    let hit = index.lookup(term);
                    prop_assert!(hit.is_some());
                    prop_assert_eq!(&hit.unwrap().record_id, &record.record_id);
                }
                prop_assert_eq!(&record.normalized_term, &normalize_term(&record.term));
            }
        }
    }
}
