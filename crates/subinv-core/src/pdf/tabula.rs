//! Table extraction by running tabula-java.

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

use lopdf::Document;
use serde::Deserialize;
use tracing::debug;

use super::{Result, TableSource};
use crate::error::PdfError;
use crate::models::config::ToolConfig;
use crate::table::{Cell, Table};

/// One table in tabula's JSON output.
#[derive(Debug, Deserialize)]
struct TabulaTable {
    data: Vec<Vec<TabulaCell>>,
}

#[derive(Debug, Deserialize)]
struct TabulaCell {
    #[serde(default)]
    text: String,
}

/// [`TableSource`] backed by the tabula-java command line.
#[derive(Debug, Clone)]
pub struct TabulaTableSource {
    tools: ToolConfig,
}

impl TabulaTableSource {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }

    fn run(&self, path: &Path, page: u32) -> Result<String> {
        let output = Command::new(&self.tools.java_path)
            .arg("-jar")
            .arg(&self.tools.tabula_jar)
            .args(["--guess", "--format", "JSON", "--pages"])
            .arg(page.to_string())
            .arg(path)
            .output()
            .map_err(|e| PdfError::Tool {
                tool: "tabula".to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::Tool {
                tool: "tabula".to_string(),
                message: format!(
                    "exit {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TableSource for TabulaTableSource {
    fn page_count(&self, path: &Path) -> Result<u32> {
        let doc = Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        let count = doc.get_pages().len() as u32;
        if count == 0 {
            return Err(PdfError::NoPages);
        }
        Ok(count)
    }

    fn page_tables(&self, path: &Path, page: u32) -> Result<Vec<Table>> {
        let json = self.run(path, page)?;
        let tables = parse_tabula_json(&json)?;
        debug!("tabula found {} table(s) on page {} of {}", tables.len(), page, path.display());
        Ok(tables)
    }
}

/// Parse tabula's JSON output into tables, first row as header.
pub(crate) fn parse_tabula_json(json: &str) -> Result<Vec<Table>> {
    let raw: Vec<TabulaTable> =
        serde_json::from_str(json).map_err(|e| PdfError::TableExtraction(e.to_string()))?;

    Ok(raw
        .into_iter()
        .map(|t| {
            let rows = t
                .data
                .into_iter()
                .map(|row| row.into_iter().map(|c| c.text).collect())
                .collect();
            table_from_rows(rows)
        })
        .collect())
}

/// Build a table from raw text rows; the first row names the columns.
///
/// Blank header cells are named `Unnamed: {index}`. A repeated name gets
/// the first free `.N` suffix (`AMOUNT`, `AMOUNT.1`, `AMOUNT.2`) so that
/// every column stays addressable.
pub fn table_from_rows(rows: Vec<Vec<String>>) -> Table {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Table::default();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for (i, name) in header.into_iter().enumerate() {
        let name = name.trim();
        let base = if name.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name.to_string()
        };

        let mut unique = base.clone();
        let mut suffix = 1;
        while seen.contains(&unique) {
            unique = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        if unique != base {
            debug!("Renamed duplicate column {:?} to {:?}", base, unique);
        }
        seen.insert(unique.clone());
        columns.push(unique);
    }

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.into_iter().map(Cell::from_text).collect());
    }
    table
}
