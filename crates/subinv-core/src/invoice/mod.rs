//! Invoice extraction: table stitching, header fields and batch assembly.

mod assembler;
mod header;
pub mod rules;
pub mod stitcher;

pub use assembler::{merge_header, BatchOutcome, BatchProcessor, FileOutcome, NoProgress, ProgressSink};
pub use header::{HeaderExtractor, HeaderFields};
pub use stitcher::{Boundary, LocatedTable, TableStitcher};

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
