//! Run command - extract line items from a batch of invoice PDFs.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use subinv_core::{
    BatchOutcome, BatchProcessor, Cell, ErrorLog, PdfPageRecognizer, PdfTextExtractor, ProgressSink,
    ResultSet, TabulaTableSource, CANONICAL_COLUMNS,
};

use super::load_config;

const XLSX_SHEET: &str = "Records";

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Input PDF files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Write the list of failed files as CSV
    #[arg(long)]
    errors: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV with the canonical header row
    Csv,
    /// JSON array of records
    Json,
    /// Excel workbook with typed cells (requires --output)
    Xlsx,
}

/// Progress bar adapter for the batch driver.
struct BarSink {
    bar: ProgressBar,
}

impl ProgressSink for BarSink {
    fn on_progress(&mut self, current: usize, total: usize) {
        let percent = if total == 0 { 100 } else { current * 100 / total };
        self.bar.set_position(current as u64);
        self.bar.set_message(format!("{}% complete", percent));
    }

    fn on_error(&mut self, file: &Path, reason: &str) {
        self.bar.println(format!(
            "{} Error processing file {}: {}",
            style("✗").red(),
            file.display(),
            reason
        ));
    }
}

pub fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = collect_files(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found for: {}", args.inputs.join(" "));
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let recognizer = PdfPageRecognizer::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))?;

    let processor = BatchProcessor::new(
        Box::new(TabulaTableSource::new(config.tools.clone())),
        Box::new(PdfTextExtractor::new()),
        Box::new(recognizer),
        &config.extraction,
    );

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut sink = BarSink { bar };
    let outcome = processor.process_with_progress(&files, &mut sink);
    sink.bar.finish_with_message("Complete");

    write_results(&outcome.results, args.format, args.output.as_deref())?;

    if let Some(path) = &args.errors {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_error_log(&outcome.errors, file)?;
        debug!("Wrote error log to {}", path.display());
    }

    print_summary(&outcome, start);
    Ok(())
}

/// Expand inputs into a sorted, de-duplicated list of PDF paths.
///
/// Inputs without glob matches are taken as literal paths.
fn collect_files(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let matches: Vec<PathBuf> = glob(input)
            .with_context(|| format!("Invalid glob pattern: {}", input))?
            .filter_map(|r| r.ok())
            .collect();

        if matches.is_empty() {
            let path = PathBuf::from(input);
            if path.is_file() {
                files.push(path);
            }
        } else {
            files.extend(matches);
        }
    }

    files.retain(|p| {
        p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    });
    files.sort();
    files.dedup();
    Ok(files)
}

fn write_results(results: &ResultSet, format: OutputFormat, output: Option<&Path>) -> anyhow::Result<()> {
    if let OutputFormat::Xlsx = format {
        let Some(path) = output else {
            anyhow::bail!("--format xlsx needs an output file (-o)");
        };
        return write_xlsx(results, path);
    }

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Csv => write_csv(results, writer),
        OutputFormat::Json => write_json(results, writer),
        OutputFormat::Xlsx => unreachable!("xlsx is written to a file above"),
    }
}

/// Write records as CSV with the canonical header.
fn write_csv<W: Write>(results: &ResultSet, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(CANONICAL_COLUMNS)?;
    for record in results.records() {
        wtr.write_record(record.values().iter().map(|v| v.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_json<W: Write>(results: &ResultSet, mut writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, results.records())?;
    writeln!(writer)?;
    Ok(())
}

/// Write records to a single-sheet workbook with typed cells.
fn write_xlsx(results: &ResultSet, path: &Path) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(XLSX_SHEET)?;

    let header_format = Format::new().set_bold();
    for (col, name) in CANONICAL_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (i, record) in results.records().iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, cell) in record.values().iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Integer(n) => {
                    worksheet.write_number(row, col, *n as f64)?;
                }
                Cell::Decimal(d) => match d.to_f64() {
                    Some(n) => {
                        worksheet.write_number(row, col, n)?;
                    }
                    None => {
                        worksheet.write_string(row, col, d.to_string())?;
                    }
                },
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {} records to {}", results.len(), path.display());
    Ok(())
}

fn write_error_log<W: Write>(errors: &ErrorLog, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["file", "error"])?;
    for entry in errors.entries() {
        wtr.write_record([entry.file.display().to_string(), entry.reason.clone()])?;
    }

    wtr.flush()?;
    Ok(())
}

fn print_summary(outcome: &BatchOutcome, start: Instant) {
    eprintln!();
    eprintln!(
        "{} {}/{} files processed successfully ({} records) in {:?}",
        style("✓").green(),
        style(outcome.succeeded()).green(),
        outcome.attempted(),
        outcome.results.len(),
        start.elapsed()
    );

    if !outcome.errors.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for entry in outcome.errors.entries() {
            eprintln!("  - {}", entry.file_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use calamine::{open_workbook_auto, Data, Reader};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use subinv_core::{CanonicalRecord, ErrorKind, FailedFile, Table};

    fn results() -> ResultSet {
        let table = Table::new(["DESCRIPTION", "DO/NO"])
            .with_row(vec!["REBAR, T10".into(), 5i64.into()])
            .with_row(vec!["MESH".into(), 7i64.into()]);
        let mut set = ResultSet::new();
        set.append(Path::new("a.pdf"), CanonicalRecord::from_table(&table));
        set
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv(&results(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("INVOICE NO. 1,INVOICE DATE,TOTAL AMT"));
        assert!(lines[0].ends_with("PER,PDF SUBTOTAL"));
        assert!(lines[1].contains(",5,\"REBAR, T10\","));
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&results(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["DO/NO"], 7);
        assert_eq!(value[1]["DESCRIPTION"], "MESH");
    }

    #[test]
    fn test_write_xlsx_typed_cells() {
        let table = Table::new(["DESCRIPTION", "DO/NO", "QTY"])
            .with_row(vec![
                "REBAR, T10".into(),
                5i64.into(),
                Decimal::from_str("2.5").unwrap().into(),
            ])
            .with_row(vec!["MESH".into(), 7i64.into(), Cell::Empty]);
        let mut set = ResultSet::new();
        set.append(Path::new("a.pdf"), CanonicalRecord::from_table(&table));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_xlsx(&set, &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range(XLSX_SHEET).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 3);

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, CANONICAL_COLUMNS.to_vec());

        let col = |name: &str| CANONICAL_COLUMNS.iter().position(|c| *c == name).unwrap();
        assert_eq!(rows[1][col("DO/NO")], Data::Float(5.0));
        assert_eq!(rows[1][col("QTY")], Data::Float(2.5));
        assert_eq!(rows[1][col("DESCRIPTION")], Data::String("REBAR, T10".to_string()));
        assert_eq!(rows[2][col("DO/NO")], Data::Float(7.0));
        assert_eq!(rows[2][col("QTY")], Data::Empty);
        assert_eq!(rows[2][col("INVOICE NO. 1")], Data::Empty);
    }

    #[test]
    fn test_xlsx_needs_output_file() {
        let err = write_results(&results(), OutputFormat::Xlsx, None).unwrap_err();
        assert!(err.to_string().contains("-o"));
    }

    #[test]
    fn test_write_error_log() {
        let mut errors = ErrorLog::new();
        errors.push(FailedFile {
            file: PathBuf::from("in/b.pdf"),
            kind: ErrorKind::Structural,
            reason: "totals block not found after 3 pages".to_string(),
        });

        let mut out = Vec::new();
        write_error_log(&errors, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "file,error\nin/b.pdf,totals block not found after 3 pages\n"
        );
    }

    #[test]
    fn test_collect_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let pattern = dir.path().join("*").display().to_string();
        let literal = dir.path().join("b.pdf").display().to_string();
        let files = collect_files(&[pattern, literal]).unwrap();

        assert_eq!(files, vec![dir.path().join("a.PDF"), dir.path().join("b.pdf")]);
    }
}
