//! Tokenizes CSV input into a [`Dataset`] and writes cleaned datasets back
//! out. This is the external collaborator the pipeline expects upstream of
//! itself: header-row handling, raw field tokenization, and automatic
//! primitive coercion of numeric-looking fields all happen here, never in
//! the pipeline.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};

use crate::data::{Cell, Dataset, Value};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Tokens treated as absent values on ingest, compared case-insensitively.
const PLACEHOLDER_TOKENS: &[&str] = &["na", "n/a", "null", "nan", "-"];

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Reads a CSV file into a dataset. The header row becomes the attribute
/// names; every field is tokenized into a number, text, or null cell.
pub fn read_dataset(path: &Path, delimiter: u8) -> Result<Dataset> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("Reading CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let row: Vec<Cell> = record.iter().map(tokenize_field).collect();
        rows.push(row);
    }

    Dataset::new(headers, rows).with_context(|| format!("Validating rows from {path:?}"))
}

/// Writes a dataset as CSV, to the given path or stdout for `-`/`None`.
/// Null cells become empty fields.
pub fn write_dataset(path: Option<&Path>, delimiter: u8, data: &Dataset) -> Result<()> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer
        .write_record(data.headers())
        .context("Writing header row")?;
    for (idx, row) in data.rows().iter().enumerate() {
        let fields = row
            .iter()
            .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default());
        csv_writer
            .write_record(fields)
            .with_context(|| format!("Writing row {}", idx + 2))?;
    }
    csv_writer.flush().context("Flushing CSV output")?;
    Ok(())
}

/// One raw CSV field to one cell: empty and placeholder tokens are null,
/// finite numeric tokens become numbers, everything else stays text with
/// its original (untrimmed) content.
fn tokenize_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if PLACEHOLDER_TOKENS.contains(&lowered.as_str()) {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return Some(Value::Number(n));
    }
    Some(Value::Text(field.to_string()))
}
