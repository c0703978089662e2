//! Drug evidence input.
//!
//! A JSON array of
//! `{"drug_id", "trial_id", "candidates": [{"raw_text", "source"}], "selection"}`
//! where `selection` is the answer of the external selection service, if
//! one was obtained.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use trialmoa_core::DrugEvidence;

use crate::StoreError;

pub fn load_drugs(path: &Path) -> Result<Vec<DrugEvidence>, StoreError> {
    if !path.exists() {
        return Err(StoreError::InputNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let drugs: Vec<DrugEvidence> =
        serde_json::from_reader(reader).map_err(|source| StoreError::InvalidInput {
            path: path.to_path_buf(),
            source,
        })?;

    let with_selection = drugs.iter().filter(|d| d.selection.is_some()).count();
    tracing::info!(
        path = %path.display(),
        drugs = drugs.len(),
        with_selection,
        "loaded drug input"
    );
    Ok(drugs)
}
