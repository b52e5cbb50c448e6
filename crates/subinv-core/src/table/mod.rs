//! Tabular cell model shared by the stitcher and the record assembler.
//!
//! Cells arrive from the table extractor as text and stay text until a
//! column is explicitly coerced with [`Table::coerce_integer`] or
//! [`Table::round_decimal`].

mod cell;
mod normalize;

pub use cell::Cell;

use crate::error::ExtractionError;

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// An ordered set of named columns and rows of cells.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with empty cells or truncating to the table width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Builder form of [`Table::push_row`].
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.push_row(row);
        self
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column that must exist.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ExtractionError::MissingColumn(name.to_string()))
    }

    /// Cell at a row for a named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of a named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Append the rows of `other`, aligning cells by column name.
    ///
    /// Columns unknown to `self` are added at the end; cells missing on
    /// either side are empty.
    pub fn concat(&mut self, other: Table) {
        for name in &other.columns {
            if !self.has_column(name) {
                self.columns.push(name.clone());
                for row in &mut self.rows {
                    row.push(Cell::Empty);
                }
            }
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        for row in other.rows {
            let mut aligned = vec![Cell::Empty; self.columns.len()];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Reorder into exactly `columns`, filling absent ones with empty cells.
    pub fn project(&self, columns: &[&str]) -> Table {
        let sources: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| src.map(|i| row[i].clone()).unwrap_or_default())
                    .collect()
            })
            .collect();

        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Consume the table into its rows.
    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<String> {
        &mut self.columns
    }
}
