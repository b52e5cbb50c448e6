//! Batch driver: per-file extraction into canonical records.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ErrorKind;
use crate::models::config::ExtractionConfig;
use crate::models::record::{CanonicalRecord, ErrorLog, FailedFile, ResultSet};
use crate::ocr::PageRecognizer;
use crate::pdf::{TableSource, TextSource};
use crate::table::Table;

use super::{HeaderExtractor, HeaderFields, Result, TableStitcher};

/// Observer of batch progress.
pub trait ProgressSink {
    /// Called after every file with the 1-based count of files done.
    fn on_progress(&mut self, current: usize, total: usize);

    /// Called when a file fails, before its progress update, with the
    /// reason recorded in the error log.
    fn on_error(&mut self, _file: &Path, _reason: &str) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _current: usize, _total: usize) {}
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Every line item of the file, in table order.
    Extracted {
        file: PathBuf,
        records: Vec<CanonicalRecord>,
    },
    /// The file produced no records.
    Failed {
        file: PathBuf,
        kind: ErrorKind,
        reason: String,
    },
}

/// Records of all successful files and the log of failed ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub results: ResultSet,
    pub errors: ErrorLog,
}

impl BatchOutcome {
    /// Add one file's outcome.
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Extracted { file, records } => self.results.append(&file, records),
            FileOutcome::Failed { file, kind, reason } => {
                self.errors.push(FailedFile { file, kind, reason })
            }
        }
    }

    /// Number of files that contributed records.
    pub fn succeeded(&self) -> usize {
        self.results.files().len()
    }

    /// Number of files attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded() + self.errors.len()
    }
}

/// Broadcast header fields onto a stitched table.
///
/// The first invoice number and the invoice date go on the first row only;
/// everything else fills every row. `CODE 1` and `CODE 2` are left blank
/// for manual classification.
pub fn merge_header(table: &mut Table, fields: &HeaderFields) -> Result<()> {
    table.insert_front("CODE 2", "", true)?;
    table.insert_front("CODE 1", "", true)?;
    table.insert_front("FOR MONTH (YYYY MM)", fields.for_month.as_str(), true)?;
    table.insert_front("ZONE", fields.zone.as_str(), true)?;
    table.insert_front("SUBCON", fields.subcon.as_str(), true)?;
    table.insert_front("LOCATION", fields.location.as_str(), true)?;
    table.insert_front("ORDER REF.", fields.order_ref.as_str(), true)?;
    table.insert_front("INVOICE DATE", fields.invoice_date.as_str(), false)?;
    table.insert_front("INVOICE NO. 2", fields.invoice_no.as_str(), true)?;
    table.insert_front("INVOICE NO. 1", fields.invoice_no.as_str(), false)?;
    Ok(())
}

/// Sequential batch driver over invoice files.
pub struct BatchProcessor {
    tables: Box<dyn TableSource>,
    text: Box<dyn TextSource>,
    recognizer: Box<dyn PageRecognizer>,
    stitcher: TableStitcher,
    header: HeaderExtractor,
}

impl BatchProcessor {
    pub fn new(
        tables: Box<dyn TableSource>,
        text: Box<dyn TextSource>,
        recognizer: Box<dyn PageRecognizer>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            tables,
            text,
            recognizer,
            stitcher: TableStitcher::from_config(config),
            header: HeaderExtractor::from_config(config),
        }
    }

    /// Extract the canonical records of one file.
    pub fn extract_file(&self, path: &Path) -> crate::Result<Vec<CanonicalRecord>> {
        let mut table = self
            .stitcher
            .stitch(path, self.tables.as_ref(), self.recognizer.as_ref())?;

        let first_page = self.text.page_text(path, 0)?;
        let fields = self.header.extract_from_text(&first_page)?;
        debug!("{}: header fields {:?}", path.display(), fields);

        merge_header(&mut table, &fields)?;
        Ok(CanonicalRecord::from_table(&table))
    }

    /// Process one file, converting any error into a failed outcome.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        match self.extract_file(path) {
            Ok(records) => FileOutcome::Extracted {
                file: path.to_path_buf(),
                records,
            },
            Err(e) => FileOutcome::Failed {
                file: path.to_path_buf(),
                kind: e.kind(),
                reason: e.to_string(),
            },
        }
    }

    /// Process files in order without progress reporting.
    pub fn process(&self, files: &[PathBuf]) -> BatchOutcome {
        self.process_with_progress(files, &mut NoProgress)
    }

    /// Process files in order, reporting to `sink` after each one.
    ///
    /// A failing file is logged and skipped; it never stops the batch.
    pub fn process_with_progress(&self, files: &[PathBuf], sink: &mut dyn ProgressSink) -> BatchOutcome {
        let start = Instant::now();
        let total = files.len();
        let mut outcome = BatchOutcome::default();

        for (index, path) in files.iter().enumerate() {
            info!("Processing {} ({}/{})", path.display(), index + 1, total);

            let file_outcome = self.process_file(path);
            match &file_outcome {
                FileOutcome::Extracted { records, .. } => {
                    info!("{}: {} records", path.display(), records.len());
                }
                FileOutcome::Failed { reason, .. } => {
                    warn!("Error processing file {}: {}", path.display(), reason);
                    sink.on_error(path, reason);
                }
            }
            outcome.record(file_outcome);

            sink.on_progress(index + 1, total);
        }

        info!(
            "Batch complete: {}/{} files, {} records in {:?}",
            outcome.succeeded(),
            total,
            outcome.results.len(),
            start.elapsed()
        );
        outcome
    }
}
