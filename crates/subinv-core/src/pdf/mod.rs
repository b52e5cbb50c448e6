//! PDF collaborators: per-page table fragments and per-page text.

mod tabula;
mod text;

pub use tabula::{table_from_rows, TabulaTableSource};
pub use text::PdfTextExtractor;

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::PdfError;
use crate::table::Table;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Table fragments found on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTables {
    /// Page number (1-indexed).
    pub page: u32,
    /// Fragments in page order.
    pub tables: Vec<Table>,
}

impl PageTables {
    pub fn new(page: u32, tables: Vec<Table>) -> Self {
        Self { page, tables }
    }
}

/// PDF→rows service.
pub trait TableSource {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Table fragments on a page (1-indexed).
    fn page_tables(&self, path: &Path, page: u32) -> Result<Vec<Table>>;
}

/// PDF→text service.
pub trait TextSource {
    /// Plain text of a page (0-indexed), newline-delimited.
    fn page_text(&self, path: &Path, page_index: u32) -> Result<String>;
}

/// Lazy page-by-page walk over a document's tables.
///
/// Each page is requested from the [`TableSource`] only when the iterator
/// is advanced. The cursor cannot be rewound.
pub struct PageCursor<'a> {
    source: &'a dyn TableSource,
    path: PathBuf,
    next_page: u32,
    last_page: Option<u32>,
    limit: u32,
}

impl<'a> PageCursor<'a> {
    /// Create a cursor starting at page 1.
    ///
    /// `limit` caps the number of pages visited; 0 means the whole document.
    pub fn new(source: &'a dyn TableSource, path: &Path, limit: u32) -> Self {
        Self {
            source,
            path: path.to_path_buf(),
            next_page: 1,
            last_page: None,
            limit,
        }
    }

    fn last_page(&mut self) -> Result<u32> {
        if let Some(last) = self.last_page {
            return Ok(last);
        }
        let count = self.source.page_count(&self.path)?;
        let last = if self.limit > 0 { count.min(self.limit) } else { count };
        self.last_page = Some(last);
        Ok(last)
    }
}

impl Iterator for PageCursor<'_> {
    type Item = Result<PageTables>;

    fn next(&mut self) -> Option<Self::Item> {
        let last = match self.last_page() {
            Ok(last) => last,
            Err(e) => {
                // Report once, then stop.
                self.last_page = Some(0);
                return Some(Err(e));
            }
        };

        if self.next_page > last {
            return None;
        }

        let page = self.next_page;
        self.next_page += 1;
        trace!("Reading tables from page {} of {}", page, self.path.display());

        Some(
            self.source
                .page_tables(&self.path, page)
                .map(|tables| PageTables::new(page, tables)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct CountingSource {
        pages: u32,
        requested: RefCell<Vec<u32>>,
    }

    impl TableSource for CountingSource {
        fn page_count(&self, _path: &Path) -> Result<u32> {
            Ok(self.pages)
        }

        fn page_tables(&self, _path: &Path, page: u32) -> Result<Vec<Table>> {
            self.requested.borrow_mut().push(page);
            Ok(vec![Table::new(["A"])])
        }
    }

    #[test]
    fn test_cursor_is_lazy() {
        let source = CountingSource { pages: 5, requested: RefCell::new(Vec::new()) };
        let mut cursor = PageCursor::new(&source, Path::new("a.pdf"), 0);

        let first = cursor.next().unwrap().unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(*source.requested.borrow(), vec![1]);
    }

    #[test]
    fn test_cursor_ends_at_last_page() {
        let source = CountingSource { pages: 3, requested: RefCell::new(Vec::new()) };
        let pages: Vec<u32> = PageCursor::new(&source, Path::new("a.pdf"), 0)
            .map(|p| p.unwrap().page)
            .collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_cursor_limit() {
        let source = CountingSource { pages: 10, requested: RefCell::new(Vec::new()) };
        assert_eq!(PageCursor::new(&source, Path::new("a.pdf"), 2).count(), 2);
    }

    #[test]
    fn test_cursor_page_count_error() {
        struct Broken;
        impl TableSource for Broken {
            fn page_count(&self, _path: &Path) -> Result<u32> {
                Err(PdfError::NoPages)
            }
            fn page_tables(&self, _path: &Path, _page: u32) -> Result<Vec<Table>> {
                unreachable!()
            }
        }

        let mut cursor = PageCursor::new(&Broken, Path::new("a.pdf"), 0);
        assert!(matches!(cursor.next(), Some(Err(PdfError::NoPages))));
        assert!(cursor.next().is_none());
    }
}
