//! Error types for the subinv-core library.

use thiserror::Error;

/// Main error type for the subinv library.
#[derive(Error, Debug)]
pub enum SubinvError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SubinvError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubinvError::Extraction(e) => e.kind(),
            SubinvError::Config(_) => ErrorKind::Config,
            _ => ErrorKind::Collaborator,
        }
    }
}

/// Coarse error classes. Every class aborts the current file only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Table layout did not match: column count, totals block, page boundary.
    Structural,
    /// A header or totals field was missing or unparseable.
    FieldDerivation,
    /// A cell could not be coerced to its column type.
    Coercion,
    /// A PDF, OCR, or I/O collaborator failed.
    Collaborator,
    /// Invalid configuration.
    Config,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract tables from PDF.
    #[error("failed to extract tables: {0}")]
    TableExtraction(String),

    /// An external tool could not be run or exited with failure.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Page rasterization failed.
    #[error("rasterization failed: {0}")]
    Rasterize(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// A cell value that could not be converted to the requested type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot coerce {value:?} to {target}")]
pub struct CoercionError {
    /// Text form of the offending cell.
    pub value: String,
    /// Target type name.
    pub target: &'static str,
}

/// Errors related to invoice table and field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Required header field is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Failed to parse a field value.
    #[error("failed to parse {field}: {value:?}")]
    Parse { field: String, value: String },

    /// A required column is absent from the table.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A column with this name already exists.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// Operation needs at least one row.
    #[error("table has no rows")]
    EmptyTable,

    /// A page yielded a fragment count the layout never produces.
    #[error("page {page}: expected 1 or 2 tables, found {found}")]
    UnexpectedFragments { page: u32, found: usize },

    /// Pages ran out before the totals block was seen.
    #[error("totals block not found after {pages} pages")]
    BoundaryNotFound { pages: u32 },

    /// The totals block does not carry a single usable total column.
    #[error("totals column {marker:?}: {reason}")]
    TotalsColumn { marker: String, reason: String },

    /// Cell coercion failed.
    #[error("column {column:?} row {row}: {source}")]
    Coercion {
        column: String,
        row: usize,
        #[source]
        source: CoercionError,
    },
}

impl ExtractionError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::MissingField(_)
            | ExtractionError::Parse { .. }
            | ExtractionError::TotalsColumn { .. } => ErrorKind::FieldDerivation,
            ExtractionError::Coercion { .. } => ErrorKind::Coercion,
            ExtractionError::MissingColumn(_)
            | ExtractionError::DuplicateColumn(_)
            | ExtractionError::EmptyTable
            | ExtractionError::UnexpectedFragments { .. }
            | ExtractionError::BoundaryNotFound { .. } => ErrorKind::Structural,
        }
    }
}

/// Result type for the subinv library.
pub type Result<T> = std::result::Result<T, SubinvError>;
