//! Column insertion, fill and coercion helpers.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::{Cell, Result, Table};
use crate::error::ExtractionError;

lazy_static! {
    /// Numbers written with comma thousands separators: 1,234 or -12,345.60
    static ref THOUSANDS_NUMBER: Regex = Regex::new(
        r"^[-+]?\d{1,3}(?:,\d{3})+(?:\.\d+)?$"
    ).unwrap();
}

impl Table {
    /// Insert a column at the front.
    ///
    /// With `fill` every row receives `value`; without it only the first row
    /// does and the rest are blank, which requires at least one row.
    pub fn insert_front(&mut self, name: &str, value: impl Into<Cell>, fill: bool) -> Result<()> {
        if self.has_column(name) {
            return Err(ExtractionError::DuplicateColumn(name.to_string()));
        }
        if !fill && self.is_empty() {
            return Err(ExtractionError::EmptyTable);
        }

        let value = value.into();
        self.columns_mut().insert(0, name.to_string());
        for (i, row) in self.rows_mut().iter_mut().enumerate() {
            let cell = if fill || i == 0 { value.clone() } else { Cell::Empty };
            row.insert(0, cell);
        }
        Ok(())
    }

    /// Remove the named columns that are present; absent names are ignored.
    pub fn drop_columns(&mut self, names: &[impl AsRef<str>]) {
        let keep: Vec<bool> = self
            .columns()
            .iter()
            .map(|c| !names.iter().any(|n| n.as_ref() == c))
            .collect();

        let mut flags = keep.iter();
        self.columns_mut().retain(|_| *flags.next().unwrap_or(&true));
        for row in self.rows_mut() {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Rename a column that must exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.require_column(from)?;
        if from != to && self.has_column(to) {
            return Err(ExtractionError::DuplicateColumn(to.to_string()));
        }
        self.columns_mut()[idx] = to.to_string();
        Ok(())
    }

    /// Replace each blank cell with the nearest non-blank cell above it.
    ///
    /// Leading blanks stay blank.
    pub fn forward_fill(&mut self, column: &str) -> Result<()> {
        let idx = self.require_column(column)?;
        let mut last: Option<Cell> = None;
        for row in self.rows_mut() {
            if row[idx].is_blank() {
                if let Some(prev) = &last {
                    row[idx] = prev.clone();
                }
            } else {
                last = Some(row[idx].clone());
            }
        }
        Ok(())
    }

    /// Coerce every cell of a column to an integer. Blank cells fail.
    pub fn coerce_integer(&mut self, column: &str) -> Result<()> {
        let idx = self.require_column(column)?;
        for (i, row) in self.rows_mut().iter_mut().enumerate() {
            let value = row[idx].to_integer().map_err(|source| ExtractionError::Coercion {
                column: column.to_string(),
                row: i,
                source,
            })?;
            row[idx] = Cell::Integer(value);
        }
        Ok(())
    }

    /// Coerce non-blank cells of a column to decimals rounded to `dp` places.
    ///
    /// Blank cells stay blank.
    pub fn round_decimal(&mut self, column: &str, dp: u32) -> Result<()> {
        let idx = self.require_column(column)?;
        for (i, row) in self.rows_mut().iter_mut().enumerate() {
            if row[idx].is_blank() {
                continue;
            }
            let value: Decimal = row[idx].to_decimal().map_err(|source| ExtractionError::Coercion {
                column: column.to_string(),
                row: i,
                source,
            })?;
            row[idx] = Cell::Decimal(value.round_dp(dp).normalize());
        }
        Ok(())
    }

    /// Replace carriage returns in text cells with a single space.
    pub fn replace_carriage_returns(&mut self) {
        self.map_text(|s| if s.contains('\r') { Some(s.replace('\r', " ")) } else { None });
    }

    /// Strip thousands separators from text that reads as a number.
    pub fn strip_thousands_separators(&mut self) {
        self.map_text(|s| {
            let trimmed = s.trim();
            THOUSANDS_NUMBER
                .is_match(trimmed)
                .then(|| trimmed.replace(',', ""))
        });
    }

    fn map_text<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for row in self.rows_mut() {
            for cell in row.iter_mut() {
                if let Cell::Text(s) = cell {
                    if let Some(replaced) = f(s) {
                        *cell = Cell::from_text(replaced);
                    }
                }
            }
        }
    }
}
