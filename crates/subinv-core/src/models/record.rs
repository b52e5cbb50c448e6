//! Canonical output records and the batch result set.

use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ErrorKind;
use crate::table::{Cell, Table};

/// Canonical column order of every output record.
pub const CANONICAL_COLUMNS: [&str; 19] = [
    "INVOICE NO. 1",
    "INVOICE DATE",
    "TOTAL AMT",
    "INVOICE NO. 2",
    "FOR MONTH (YYYY MM)",
    "ZONE",
    "LOCATION",
    "SUBCON",
    "ORDER REF.",
    "DATE REQ.",
    "DO/NO",
    "DESCRIPTION",
    "CODE 1",
    "CODE 2",
    "QTY",
    "UNIT",
    "VENDOR INVOICE UNIT PRICE (S$)",
    "PER",
    "PDF SUBTOTAL",
];

/// One line item in canonical column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    values: Vec<Cell>,
}

impl CanonicalRecord {
    /// Build records from a table, projecting onto the canonical columns.
    pub fn from_table(table: &Table) -> Vec<CanonicalRecord> {
        table
            .project(&CANONICAL_COLUMNS)
            .into_rows()
            .into_iter()
            .map(|values| CanonicalRecord { values })
            .collect()
    }

    /// Value of a canonical column.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        CANONICAL_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| &self.values[i])
    }

    /// Values in canonical order.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// `(column, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Cell)> {
        CANONICAL_COLUMNS.iter().copied().zip(self.values.iter())
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CANONICAL_COLUMNS.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Records of all successfully processed files, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<CanonicalRecord>,
    files: Vec<(PathBuf, usize)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the records of one file.
    pub fn append(&mut self, file: &Path, records: Vec<CanonicalRecord>) {
        self.files.push((file.to_path_buf(), records.len()));
        self.records.extend(records);
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Contributing files with their row counts.
    pub fn files(&self) -> &[(PathBuf, usize)] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedFile {
    pub file: PathBuf,
    pub kind: ErrorKind,
    pub reason: String,
}

impl FailedFile {
    /// File name for display, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

/// Files that failed, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLog {
    entries: Vec<FailedFile>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FailedFile) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[FailedFile] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.entries.iter().any(|e| e.file == file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_table_projects_canonical_order() {
        let table = Table::new(["PDF SUBTOTAL", "DESCRIPTION", "EXTRA"])
            .with_row(vec!["10.00".into(), "Rebar".into(), "x".into()]);

        let records = CanonicalRecord::from_table(&table);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values().len(), 19);
        assert_eq!(records[0].get("DESCRIPTION"), Some(&Cell::from("Rebar")));
        assert_eq!(records[0].get("PDF SUBTOTAL"), Some(&Cell::from("10.00")));
        assert_eq!(records[0].get("ZONE"), Some(&Cell::Empty));
        assert_eq!(records[0].get("EXTRA"), None);
    }

    #[test]
    fn test_serialize_keeps_column_order() {
        let table = Table::new(["DESCRIPTION", "DO/NO"]).with_row(vec!["Rebar".into(), Cell::Integer(5)]);
        let record = &CanonicalRecord::from_table(&table)[0];

        let json = serde_json::to_string(record).unwrap();
        let first = json.find("\"INVOICE NO. 1\"").unwrap();
        let last = json.find("\"PDF SUBTOTAL\"").unwrap();
        assert!(first < last);
        assert!(json.contains("\"DO/NO\":5"));
        assert!(json.contains("\"ZONE\":null"));
    }

    #[test]
    fn test_result_set_tracks_files() {
        let table = Table::new(["DESCRIPTION"])
            .with_row(vec!["a".into()])
            .with_row(vec!["b".into()]);

        let mut set = ResultSet::new();
        set.append(Path::new("a.pdf"), CanonicalRecord::from_table(&table));

        assert_eq!(set.len(), 2);
        assert_eq!(set.files(), &[(PathBuf::from("a.pdf"), 2)]);
    }

    #[test]
    fn test_failed_file_name() {
        let entry = FailedFile {
            file: PathBuf::from("/uploads/inv-7.pdf"),
            kind: ErrorKind::Structural,
            reason: "boom".to_string(),
        };
        assert_eq!(entry.file_name(), "inv-7.pdf");
    }
}
