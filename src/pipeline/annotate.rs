use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{COL_CAPTURE_DATE, COL_ZIP};
use crate::error::Result;
use crate::table::{parse_capture_date, RecordTable};

/// A styling instruction addressed by position against the persisted
/// table. Indexes are zero-based over data rows and columns; the header
/// row is never annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    /// Treat every data cell in this column as text
    TextColumn { column: usize },
    /// Highlight an entire data row
    HighlightRow { row: usize },
}

/// Sink for positional annotations, so styling can be tested and persisted
/// independently of the value transforms.
pub trait AnnotationSink {
    fn apply(&mut self, annotation: Annotation);
}

/// Outcome of one annotation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotateOutcome {
    pub zip_column: Option<usize>,
    pub capture_date_column: Option<usize>,
    pub rows_highlighted: usize,
}

/// Walks the persisted table and emits zip text-format marks plus same-day
/// highlight marks into the sink. Absent columns make the corresponding
/// pass a no-op; unparsable date cells are skipped without error.
pub fn annotate_table(
    table: &RecordTable,
    today: NaiveDate,
    sink: &mut dyn AnnotationSink,
) -> AnnotateOutcome {
    let mut outcome = AnnotateOutcome::default();

    if let Some(zip_idx) = table.column_index(COL_ZIP) {
        outcome.zip_column = Some(zip_idx);
        sink.apply(Annotation::TextColumn { column: zip_idx });
    }

    match table.column_index(COL_CAPTURE_DATE) {
        Some(date_idx) => {
            outcome.capture_date_column = Some(date_idx);
            for (i, row) in table.rows.iter().enumerate() {
                if parse_capture_date(row.cell(date_idx)) == Some(today) {
                    sink.apply(Annotation::HighlightRow { row: i });
                    outcome.rows_highlighted += 1;
                }
            }
        }
        None => {
            warn!("No '{}' column, skipping highlighting", COL_CAPTURE_DATE);
        }
    }

    outcome
}

/// Styling marks persisted beside the CSV, since CSV itself cannot carry
/// cell formatting. A spreadsheet front end re-applies these on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub text_columns: Vec<usize>,
    pub highlighted_rows: Vec<usize>,
}

impl AnnotationSink for StyleSheet {
    fn apply(&mut self, annotation: Annotation) {
        match annotation {
            Annotation::TextColumn { column } => {
                if !self.text_columns.contains(&column) {
                    self.text_columns.push(column);
                }
            }
            Annotation::HighlightRow { row } => {
                if !self.highlighted_rows.contains(&row) {
                    self.highlighted_rows.push(row);
                }
            }
        }
    }
}

impl StyleSheet {
    /// Sidecar path for a table file: `<file>.style.json`.
    pub fn sidecar_path(table_path: &Path) -> PathBuf {
        let mut name = table_path.as_os_str().to_owned();
        name.push(".style.json");
        PathBuf::from(name)
    }

    pub fn save(&self, table_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::sidecar_path(table_path), json)?;
        Ok(())
    }

    pub fn load(table_path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(Self::sidecar_path(table_path))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Re-opens the persisted file, applies annotations, and saves both the
/// re-quoted CSV and the style sidecar.
pub fn annotate_file(path: &Path, today: NaiveDate) -> Result<AnnotateOutcome> {
    let table = RecordTable::load(path)?;
    let mut style = StyleSheet::default();
    let outcome = annotate_table(&table, today, &mut style);

    if !style.text_columns.is_empty() {
        // quoted rewrite keeps text columns textual through reimport
        table.save_quoted(path)?;
    }
    style.save(path)?;

    info!(
        "Annotated {}: {} highlighted row(s)",
        path.display(),
        outcome.rows_highlighted
    );
    Ok(outcome)
}
