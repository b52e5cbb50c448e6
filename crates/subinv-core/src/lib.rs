//! Core library for subcontractor invoice extraction.
//!
//! This crate provides:
//! - A tagged cell/table model with explicit coercions
//! - Multi-page line-item table stitching with totals-block detection
//! - Header field extraction (invoice number, date, order reference, month)
//! - Batch assembly into the 19-column canonical record schema
//! - Adapters for the PDF table, PDF text and page OCR collaborators

pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod table;

pub use error::{ErrorKind, Result, SubinvError};
pub use invoice::{
    BatchOutcome, BatchProcessor, FileOutcome, HeaderExtractor, HeaderFields, NoProgress,
    ProgressSink, TableStitcher,
};
pub use models::config::SubinvConfig;
pub use models::record::{CanonicalRecord, ErrorLog, FailedFile, ResultSet, CANONICAL_COLUMNS};
pub use ocr::PageRecognizer;
pub use pdf::{PageCursor, PageTables, TableSource, TextSource};
pub use table::{Cell, Table};

#[cfg(feature = "native")]
pub use ocr::{PdfPageRecognizer, PopplerRasterizer, PureOcrEngine};
pub use pdf::{PdfTextExtractor, TabulaTableSource};
