//! Multi-page line-item table stitching.
//!
//! The line-item table of this layout spans pages with a constant column
//! count. The page where the count changes, or where a second table shows
//! up, carries the totals block and ends the walk.

use std::path::Path;

use tracing::debug;

use crate::error::{ExtractionError, SubinvError};
use crate::models::config::ExtractionConfig;
use crate::ocr::PageRecognizer;
use crate::pdf::{self, PageCursor, PageTables, TableSource};
use crate::table::Table;

use super::Result;

pub const DATE_REQ_COLUMN: &str = "DATE REQ.";
pub const TOTAL_AMT_COLUMN: &str = "TOTAL AMT";
pub const SUBTOTAL_COLUMN: &str = "PDF SUBTOTAL";
pub const DO_NO_COLUMN: &str = "DO/NO";
pub const QTY_COLUMN: &str = "QTY";

/// Decimal places kept for quantities.
const QTY_DECIMALS: u32 = 6;

/// Outcome of examining one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// A full-width line-item fragment; the table continues on the next page.
    Continue(Table),
    /// The totals block was found on this page.
    End {
        /// Final line-item fragment, when the page carries one.
        last_items: Option<Table>,
        totals: Table,
    },
}

/// Apply the page-boundary rule to one page.
///
/// Two fragments end the table with the first as line items and the second
/// as totals. A single fragment continues the table when it is exactly
/// `line_item_columns` wide and is the totals block otherwise.
pub fn classify_page(page: PageTables, line_item_columns: usize) -> Result<Boundary> {
    let found = page.tables.len();
    let mut tables = page.tables.into_iter();

    match (tables.next(), tables.next(), found) {
        (Some(items), Some(totals), 2) => Ok(Boundary::End {
            last_items: Some(items),
            totals,
        }),
        (Some(only), None, 1) if only.width() == line_item_columns => Ok(Boundary::Continue(only)),
        (Some(only), None, 1) => Ok(Boundary::End {
            last_items: None,
            totals: only,
        }),
        _ => Err(ExtractionError::UnexpectedFragments {
            page: page.page,
            found,
        }),
    }
}

/// Line items and totals located in a document, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedTable {
    /// Concatenated line-item fragments.
    pub items: Table,
    /// Totals block.
    pub totals: Table,
    /// Page (1-indexed) where the totals block was found.
    pub stop_page: u32,
}

/// Recover the required date from OCR lines.
///
/// Takes the first line containing `label` (case-insensitive) and returns
/// the window of 2 characters before and 8 after its first `/`. This
/// matches a `DD/MM/YYYY` value printed right after the label and nothing
/// else.
pub fn date_required(lines: &[&str], label: &str) -> Option<String> {
    let label = label.to_uppercase();
    let line = lines.iter().find(|l| l.to_uppercase().contains(&label))?;

    let chars: Vec<char> = line.chars().collect();
    let slash = chars.iter().position(|c| *c == '/')?;
    let start = slash.saturating_sub(2);
    let end = (slash + 8).min(chars.len());

    Some(chars[start..end].iter().collect::<String>().trim().to_string())
}

/// Total amount from the totals block: the header to the right of the one
/// containing `marker`.
pub fn total_amount(totals: &Table, marker: &str) -> Result<String> {
    let fail = |reason: &str| ExtractionError::TotalsColumn {
        marker: marker.to_string(),
        reason: reason.to_string(),
    };

    let marker_upper = marker.to_uppercase();
    let matches: Vec<usize> = totals
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_uppercase().contains(&marker_upper))
        .map(|(i, _)| i)
        .collect();

    let idx = match matches.as_slice() {
        [idx] => *idx,
        [] => return Err(fail("no matching column")),
        _ => return Err(fail("more than one matching column")),
    };

    let value = totals
        .columns()
        .get(idx + 1)
        .ok_or_else(|| fail("no column to its right"))?;

    if value.starts_with("Unnamed:") {
        return Err(fail("column to its right is blank"));
    }
    Ok(value.trim().to_string())
}

/// Stitches and normalizes the line-item table of one invoice.
#[derive(Debug, Clone)]
pub struct TableStitcher {
    config: ExtractionConfig,
}

impl TableStitcher {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Walk pages until the totals block, accumulating line items.
    pub fn locate<I>(&self, pages: I) -> crate::Result<LocatedTable>
    where
        I: IntoIterator<Item = pdf::Result<PageTables>>,
    {
        let mut items = Table::default();
        let mut visited = 0;

        for page in pages {
            let page = page?;
            let number = page.page;
            visited += 1;

            match classify_page(page, self.config.line_item_columns)? {
                Boundary::Continue(fragment) => {
                    debug!("Page {}: {} line-item rows, continuing", number, fragment.len());
                    items.concat(fragment);
                }
                Boundary::End { last_items, totals } => {
                    if let Some(fragment) = last_items {
                        debug!("Page {}: {} line-item rows and totals block", number, fragment.len());
                        items.concat(fragment);
                    } else {
                        debug!("Page {}: totals block ({} columns)", number, totals.width());
                    }
                    return Ok(LocatedTable {
                        items,
                        totals,
                        stop_page: number,
                    });
                }
            }
        }

        Err(ExtractionError::BoundaryNotFound { pages: visited }.into())
    }

    /// Normalize located line items into the stitched table.
    ///
    /// `ocr_text` is the recognized text of the page the required date is
    /// read from.
    pub fn finish(&self, located: LocatedTable, ocr_text: &str) -> Result<Table> {
        let LocatedTable { mut items, totals, .. } = located;

        items.drop_columns(self.config.drop_columns.as_slice());

        let lines: Vec<&str> = ocr_text.lines().collect();
        let date_req = date_required(&lines, &self.config.date_required_label)
            .ok_or_else(|| ExtractionError::MissingField("date_required".to_string()))?;
        items.insert_front(DATE_REQ_COLUMN, date_req, true)?;

        let total = total_amount(&totals, &self.config.totals_marker)?;
        items.insert_front(TOTAL_AMT_COLUMN, total, false)?;

        items.replace_carriage_returns();
        items.strip_thousands_separators();

        let subtotal = self
            .config
            .subtotal_headers
            .iter()
            .find(|h| items.has_column(h))
            .cloned()
            .ok_or_else(|| ExtractionError::MissingColumn(SUBTOTAL_COLUMN.to_string()))?;
        items.rename_column(&subtotal, SUBTOTAL_COLUMN)?;

        items.forward_fill(DO_NO_COLUMN)?;
        items.coerce_integer(DO_NO_COLUMN)?;
        items.round_decimal(QTY_COLUMN, QTY_DECIMALS)?;

        Ok(items)
    }

    /// Stitch the line-item table of a document.
    ///
    /// The required date is recognized on the page index equal to the
    /// 1-indexed stop page, i.e. the page after the totals block.
    pub fn stitch(
        &self,
        path: &Path,
        tables: &dyn TableSource,
        recognizer: &dyn PageRecognizer,
    ) -> crate::Result<Table> {
        let located = self.locate(PageCursor::new(tables, path, self.config.max_pages))?;
        debug!(
            "{}: {} line items, totals on page {}",
            path.display(),
            located.items.len(),
            located.stop_page
        );

        let ocr_text = recognizer
            .recognize_page(path, located.stop_page)
            .map_err(SubinvError::from)?;

        Ok(self.finish(located, &ocr_text)?)
    }
}

impl Default for TableStitcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::table::Cell;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const ITEM_COLUMNS: [&str; 9] = [
        "IT", "DO/NO", "DESCRIPTION", "QTY", "UNIT", "UNIT PRICE", "PER", "DISC.", "$ AMOUNT",
    ];

    fn items(rows: &[[&str; 9]]) -> Table {
        let mut table = Table::new(ITEM_COLUMNS);
        for row in rows {
            table.push_row(row.iter().map(|v| Cell::from(*v)).collect());
        }
        table
    }

    fn totals() -> Table {
        Table::new(["SUB TOTAL", "TOTAL SGD", "1,250.00"])
    }

    fn narrow() -> Table {
        Table::new(["A", "B", "C"]).with_row(vec!["x".into(), "y".into(), "z".into()])
    }

    fn page(n: u32, tables: Vec<Table>) -> pdf::Result<PageTables> {
        Ok(PageTables::new(n, tables))
    }

    const OCR_PAGE: &str = "DELIVERY ORDER\nDATE REQUIRED: 14/03/2024 08:00\nREMARKS";

    #[test]
    fn test_classify_two_fragments() {
        let boundary = classify_page(PageTables::new(3, vec![narrow(), totals()]), 9).unwrap();
        assert_eq!(
            boundary,
            Boundary::End {
                last_items: Some(narrow()),
                totals: totals()
            }
        );
    }

    #[test]
    fn test_classify_single_fragment() {
        let full = items(&[["1", "5", "Rebar", "1", "kg", "2", "1", "", "2"]]);
        assert_eq!(
            classify_page(PageTables::new(1, vec![full.clone()]), 9).unwrap(),
            Boundary::Continue(full)
        );
        assert_eq!(
            classify_page(PageTables::new(2, vec![narrow()]), 9).unwrap(),
            Boundary::End {
                last_items: None,
                totals: narrow()
            }
        );
    }

    #[test]
    fn test_classify_unexpected_fragment_count() {
        let err = classify_page(PageTables::new(4, vec![]), 9).unwrap_err();
        assert!(matches!(err, ExtractionError::UnexpectedFragments { page: 4, found: 0 }));

        let err = classify_page(PageTables::new(4, vec![narrow(), narrow(), narrow()]), 9).unwrap_err();
        assert!(matches!(err, ExtractionError::UnexpectedFragments { found: 3, .. }));
    }

    #[test]
    fn test_locate_stops_on_two_fragments() {
        let page1 = items(&[["1", "5", "a", "1", "", "", "", "", "1"]]);
        let page2 = items(&[["2", "", "b", "2", "", "", "", "", "2"]]);
        let tail = narrow();

        let located = TableStitcher::new()
            .locate(vec![
                page(1, vec![page1]),
                page(2, vec![page2]),
                page(3, vec![tail, totals()]),
                page(4, vec![narrow()]),
            ])
            .unwrap();

        assert_eq!(located.stop_page, 3);
        assert_eq!(located.totals, totals());
        // Page 3's first fragment is appended, aligned by column name.
        assert_eq!(located.items.len(), 3);
        assert_eq!(located.items.get(2, "A"), Some(&Cell::from("x")));
    }

    #[test]
    fn test_locate_narrow_page_is_totals_not_items() {
        let page1 = items(&[["1", "5", "a", "1", "", "", "", "", "1"]]);
        let page2 = items(&[["2", "", "b", "2", "", "", "", "", "2"]]);

        let located = TableStitcher::new()
            .locate(vec![
                page(1, vec![page1]),
                page(2, vec![page2]),
                page(3, vec![narrow()]),
            ])
            .unwrap();

        assert_eq!(located.stop_page, 3);
        assert_eq!(located.items.len(), 2);
        assert_eq!(located.items.columns(), &ITEM_COLUMNS);
        assert_eq!(located.totals, narrow());
    }

    #[test]
    fn test_locate_full_width_page_continues() {
        let row = ["1", "5", "a", "1", "", "", "", "", "1"];
        let located = TableStitcher::new()
            .locate(vec![
                page(1, vec![items(&[row])]),
                page(2, vec![items(&[row])]),
                page(3, vec![items(&[row])]),
                page(4, vec![items(&[row]), totals()]),
            ])
            .unwrap();

        assert_eq!(located.stop_page, 4);
        assert_eq!(located.items.len(), 4);
    }

    #[test]
    fn test_locate_is_lazy() {
        let row = ["1", "5", "a", "1", "", "", "", "", "1"];
        let mut pages = vec![
            page(1, vec![items(&[row]), totals()]),
            Err(PdfError::InvalidPage(2)),
        ]
        .into_iter();

        assert!(TableStitcher::new().locate(&mut pages).is_ok());
        assert!(pages.next().is_some());
    }

    #[test]
    fn test_locate_exhausted_pages() {
        let row = ["1", "5", "a", "1", "", "", "", "", "1"];
        let err = TableStitcher::new()
            .locate(vec![page(1, vec![items(&[row])]), page(2, vec![items(&[row])])])
            .unwrap_err();

        assert!(matches!(
            err,
            SubinvError::Extraction(ExtractionError::BoundaryNotFound { pages: 2 })
        ));
    }

    #[test]
    fn test_locate_propagates_source_error() {
        let err = TableStitcher::new()
            .locate(vec![Err(PdfError::TableExtraction("boom".to_string()))])
            .unwrap_err();
        assert!(matches!(err, SubinvError::Pdf(PdfError::TableExtraction(_))));
    }

    #[test]
    fn test_date_required_window() {
        assert_eq!(
            date_required(&["DATE REQUIRED: 14/03/2024 08:00"], "DATE REQUIRED"),
            Some("14/03/2024".to_string())
        );
        assert_eq!(
            date_required(&["x", "date required 4/3/2024 AM"], "DATE REQUIRED"),
            Some("4/3/2024".to_string())
        );
        assert_eq!(date_required(&["DATE REQUIRED: TBC"], "DATE REQUIRED"), None);
        assert_eq!(date_required(&["01/02/2024"], "DATE REQUIRED"), None);
    }

    #[test]
    fn test_total_amount() {
        assert_eq!(total_amount(&totals(), "SGD").unwrap(), "1,250.00");

        let none = Table::new(["TOTAL", "100"]);
        assert!(matches!(
            total_amount(&none, "SGD"),
            Err(ExtractionError::TotalsColumn { .. })
        ));

        let last = Table::new(["TOTAL", "TOTAL SGD"]);
        assert!(total_amount(&last, "SGD").is_err());

        let blank = Table::new(["TOTAL SGD", "Unnamed: 1"]);
        assert!(total_amount(&blank, "SGD").is_err());
    }

    fn located(rows: &[[&str; 9]]) -> LocatedTable {
        LocatedTable {
            items: items(rows),
            totals: totals(),
            stop_page: 2,
        }
    }

    #[test]
    fn test_finish_normalizes_table() {
        let table = TableStitcher::new()
            .finish(
                located(&[
                    ["1", "5", "STEEL\rBAR", "12.3456789", "kg", "2.00", "1", "", "1,024.69"],
                    ["", "", "cont.", "", "", "", "", "", ""],
                    ["2", "7", "MESH", "3", "pc", "75.00", "1", "", "225.31"],
                ]),
                OCR_PAGE,
            )
            .unwrap();

        assert_eq!(
            table.columns(),
            &["TOTAL AMT", "DATE REQ.", "DO/NO", "DESCRIPTION", "QTY", "PDF SUBTOTAL"]
        );
        assert_eq!(
            table.column("TOTAL AMT").unwrap(),
            vec![&Cell::from("1250.00"), &Cell::Empty, &Cell::Empty]
        );
        assert_eq!(table.column("DATE REQ.").unwrap(), vec![&Cell::from("14/03/2024"); 3]);
        assert_eq!(
            table.column("DO/NO").unwrap(),
            vec![&Cell::Integer(5), &Cell::Integer(5), &Cell::Integer(7)]
        );
        assert_eq!(table.get(0, "DESCRIPTION"), Some(&Cell::from("STEEL BAR")));
        assert_eq!(
            table.get(0, "QTY"),
            Some(&Cell::Decimal(Decimal::from_str("12.345679").unwrap()))
        );
        assert_eq!(table.get(1, "QTY"), Some(&Cell::Empty));
        assert_eq!(table.get(0, "PDF SUBTOTAL"), Some(&Cell::from("1024.69")));
    }

    #[test]
    fn test_finish_subtotal_fallback_header() {
        let mut loc = located(&[["1", "5", "a", "1", "", "", "", "", "10"]]);
        loc.items.rename_column("$ AMOUNT", "AMOUNT IN SGD").unwrap();

        let table = TableStitcher::new().finish(loc, OCR_PAGE).unwrap();
        assert!(table.has_column("PDF SUBTOTAL"));
    }

    #[test]
    fn test_finish_missing_subtotal() {
        let mut loc = located(&[["1", "5", "a", "1", "", "", "", "", "10"]]);
        loc.items.rename_column("$ AMOUNT", "AMT").unwrap();

        let err = TableStitcher::new().finish(loc, OCR_PAGE).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingColumn(c) if c == "PDF SUBTOTAL"));
    }

    #[test]
    fn test_finish_bad_do_no() {
        let err = TableStitcher::new()
            .finish(located(&[["1", "D-5", "a", "1", "", "", "", "", "10"]]), OCR_PAGE)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Coercion);
    }

    #[test]
    fn test_finish_bad_qty() {
        let err = TableStitcher::new()
            .finish(located(&[["1", "5", "a", "lot", "", "", "", "", "10"]]), OCR_PAGE)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Coercion { column, .. } if column == "QTY"));
    }

    #[test]
    fn test_finish_missing_date_required() {
        let err = TableStitcher::new()
            .finish(located(&[["1", "5", "a", "1", "", "", "", "", "10"]]), "nothing here")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField(f) if f == "date_required"));
    }

    #[test]
    fn test_finish_empty_table() {
        let err = TableStitcher::new().finish(located(&[]), OCR_PAGE).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyTable));
    }
}
