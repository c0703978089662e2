//! Corpus report output.
//!
//! The report's three tables are converted to Arrow `RecordBatch`es
//! (schemas from `trialmoa_core::schema::report`) and written as CSV or
//! Parquet. The frequency table is also written as pretty JSON. Row order
//! comes straight from the report, so identical reports produce identical
//! files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use trialmoa_classify::{CorpusReport, DrugRow, TrialRow};
use trialmoa_core::report;

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Parquet,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Paths of the files written by [`write_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub drugs: PathBuf,
    pub trials: PathBuf,
    pub frequencies: PathBuf,
    pub frequencies_json: PathBuf,
}

pub fn drug_batch(report: &CorpusReport) -> Result<RecordBatch, StoreError> {
    let rows = &report.drugs;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.drug_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.trial_id.as_str()),
        )),
        Arc::new(
            rows.iter()
                .map(|r| r.chosen_term.as_deref())
                .collect::<StringArray>(),
        ),
        Arc::new(
            rows.iter()
                .map(|r| r.primary_locator.as_deref())
                .collect::<StringArray>(),
        ),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(DrugRow::label_str),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.status.as_str()),
        )),
    ];
    Ok(RecordBatch::try_new(
        Arc::new(report::drug_schema()),
        columns,
    )?)
}

pub fn trial_batch(report: &CorpusReport) -> Result<RecordBatch, StoreError> {
    let rows = &report.trials;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.trial_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(TrialRow::joined_drug_ids),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(TrialRow::joined_terms),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(TrialRow::joined_labels),
        )),
    ];
    Ok(RecordBatch::try_new(
        Arc::new(report::trial_schema()),
        columns,
    )?)
}

pub fn frequency_batch(report: &CorpusReport) -> Result<RecordBatch, StoreError> {
    let labels = StringArray::from_iter_values(
        report.frequencies.iter().map(|f| f.super_group_label),
    );
    let counts = UInt64Array::from_iter_values(report.frequencies.iter().map(|f| f.count));
    Ok(RecordBatch::try_new(
        Arc::new(report::frequency_schema()),
        vec![Arc::new(labels), Arc::new(counts)],
    )?)
}

/// Write one batch to `path` in the given format.
pub fn write_batch(batch: &RecordBatch, path: &Path, format: ReportFormat) -> Result<(), StoreError> {
    let file = File::create(path)?;
    match format {
        ReportFormat::Csv => {
            let mut writer = arrow::csv::WriterBuilder::new()
                .with_header(true)
                .build(BufWriter::new(file));
            writer.write(batch)?;
            writer.into_inner().flush()?;
        }
        ReportFormat::Parquet => {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
            writer.write(batch)?;
            writer.close()?;
        }
    }
    Ok(())
}

/// Write the drug, trial and frequency tables plus `frequencies.json`
/// into `out_dir`, creating it if needed.
pub fn write_report(
    report: &CorpusReport,
    out_dir: &Path,
    format: ReportFormat,
) -> Result<ReportPaths, StoreError> {
    std::fs::create_dir_all(out_dir)?;
    let ext = format.extension();
    let paths = ReportPaths {
        drugs: out_dir.join(format!("drugs.{ext}")),
        trials: out_dir.join(format!("trials.{ext}")),
        frequencies: out_dir.join(format!("frequencies.{ext}")),
        frequencies_json: out_dir.join("frequencies.json"),
    };

    write_batch(&drug_batch(report)?, &paths.drugs, format)?;
    write_batch(&trial_batch(report)?, &paths.trials, format)?;
    write_batch(&frequency_batch(report)?, &paths.frequencies, format)?;

    let mut json = BufWriter::new(File::create(&paths.frequencies_json)?);
    serde_json::to_writer_pretty(&mut json, &report.frequencies)?;
    json.write_all(b"\n")?;
    json.flush()?;

    tracing::info!(
        dir = %out_dir.display(),
        format = ext,
        drugs = report.drugs.len(),
        trials = report.trials.len(),
        "wrote corpus report"
    );
    Ok(paths)
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}
