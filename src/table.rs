use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::error::Result;

/// One row of case data. Cells line up with the owning table's headers;
/// rows shorter than the schema read back as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub cells: Vec<String>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    /// Writes `value` at `idx`, padding the row out if needed.
    pub fn set_cell(&mut self, idx: usize, value: String) {
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, String::new());
        }
        self.cells[idx] = value;
    }
}

/// An ordered sequence of records sharing one header schema. Insertion
/// order is the on-disk row order until an explicit sort stage reorders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
}

impl RecordTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Reads a CSV file with a header row. Every cell stays text; zip codes
    /// and case numbers are never reinterpreted as numbers.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(Record::new(record.iter().map(|c| c.to_string()).collect()));
        }
        Ok(Self { headers, rows })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.write(WriterBuilder::new().from_path(path)?)
    }

    /// Saves with every field quoted, so text-formatted columns survive a
    /// round trip through spreadsheet imports.
    pub fn save_quoted(&self, path: &Path) -> Result<()> {
        self.write(
            WriterBuilder::new()
                .quote_style(csv::QuoteStyle::Always)
                .from_path(path)?,
        )
    }

    fn write(&self, mut writer: csv::Writer<File>) -> Result<()> {
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            // every line is written at the full schema width
            let mut cells = row.cells.clone();
            cells.resize(self.headers.len(), String::new());
            writer.write_record(&cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Case-insensitive, trimmed header lookup used for field access.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Exact header lookup, used when matching against the canonical
    /// column names.
    pub fn column_index_exact(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Lenient capture-date parsing; unparsable values become `None` and drop
/// out of date-dependent stages.
pub fn parse_capture_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive())
}
