use std::path::Path;

use trialmoa_classify::{Pipeline, PrecomputedSelector};
use trialmoa_core::{PipelineConfig, RecordKind};
use trialmoa_store::{FileCache, ReportFormat, load_drugs, write_report};
use trialmoa_vocab::{RawRecord, SourceBatch, VocabularyIndex};

const DRUGS: &str = r#"[
  { "drug_id": "pembrolizumab", "trial_id": "NCT04000002",
    "candidates": [
      { "raw_text": "Programmed Cell Death 1 Receptor", "source": "MechanismField" },
      { "raw_text": "Antibodies, Monoclonal", "source": "TargetField" }
    ],
    "selection": "Programmed Cell Death 1 Receptor" },
  { "drug_id": "erlotinib", "trial_id": "NCT04000001",
    "candidates": [ { "raw_text": "Protein Kinase Inhibitors", "source": "MechanismField" } ],
    "selection": "Protein Kinase Inhibitors" },
  { "drug_id": "saline", "trial_id": "NCT04000002", "candidates": [] }
]"#;

fn vocabulary() -> VocabularyIndex {
    let raw = |id: &str, term: &str, locators: &[&str]| RawRecord {
        record_id: id.into(),
        preferred_term: term.into(),
        tree_locators: locators.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    let batch = SourceBatch {
        name: "desc.jsonl".into(),
        kind: RecordKind::Descriptor,
        records: vec![
            raw("D061026", "Programmed Cell Death 1 Receptor", &["D12.776.543"]),
            raw("D000911", "Antibodies, Monoclonal", &["D12.776.124.486"]),
            raw("D047428", "Protein Kinase Inhibitors", &["D27.505.519.389"]),
        ],
        malformed: 0,
    };
    VocabularyIndex::build([batch]).unwrap().0
}

fn run_once(root: &Path, out: &str) -> (String, usize) {
    let drugs = load_drugs(&root.join("drugs.json")).unwrap();
    let index = vocabulary();
    let pipeline = Pipeline::new(&index, &PipelineConfig::default()).unwrap();
    let selector = PrecomputedSelector::from_evidence(&drugs);
    let mut cache = FileCache::open(root.join("cache")).unwrap();

    let (report, stats) = pipeline.run(&drugs, &selector, &mut cache).unwrap();
    let paths = write_report(&report, &root.join(out), ReportFormat::Csv).unwrap();
    let csv = std::fs::read_to_string(paths.drugs).unwrap()
        + &std::fs::read_to_string(paths.trials).unwrap()
        + &std::fs::read_to_string(paths.frequencies).unwrap();
    (csv, stats.computed)
}

#[test]
fn second_run_reads_cache_and_writes_identical_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("drugs.json"), DRUGS).unwrap();

    let (cold, computed_cold) = run_once(dir.path(), "cold");
    let (warm, computed_warm) = run_once(dir.path(), "warm");

    assert_eq!(computed_cold, 3);
    assert_eq!(computed_warm, 0);
    assert_eq!(cold, warm);
    assert!(cold.contains("pembrolizumab,NCT04000002,Programmed Cell Death 1 Receptor,D12.776.543,immune_checkpoint_immune_modulation,resolved"));
    assert!(cold.contains("NCT04000002,pembrolizumab; saline"));
}

#[test]
fn edited_selection_is_recomputed_from_file_cache() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("drugs.json"), DRUGS).unwrap();
    let (cold, _) = run_once(dir.path(), "cold");
    assert!(cold.contains("pembrolizumab,NCT04000002,Programmed Cell Death 1 Receptor,"));

    let edited = DRUGS.replace(
        r#""selection": "Programmed Cell Death 1 Receptor""#,
        r#""selection": "Antibodies, Monoclonal""#,
    );
    std::fs::write(dir.path().join("drugs.json"), edited).unwrap();
    let (warm, computed_warm) = run_once(dir.path(), "warm");

    assert_eq!(computed_warm, 1);
    assert!(warm.contains(r#"pembrolizumab,NCT04000002,"Antibodies, Monoclonal",D12.776.124.486,"#));
}
