use chrono::{Local, NaiveDate};
use metrics::{counter, histogram};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

use crate::constants::{COL_ADDRESS_1, COL_NAME, COL_RACE};
use crate::error::Result;
use crate::pipeline::annotate;
use crate::pipeline::dedupe;
use crate::pipeline::filter::{self, FilterMode};
use crate::pipeline::normalize;
use crate::pipeline::organize;
use crate::table::RecordTable;

/// Per-file counters for one cleaning run. Emitted once when the file
/// finishes, never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct CleanStats {
    pub file: String,
    pub start_rows: usize,
    pub removed_disposed: usize,
    pub removed_kentucky_ave: usize,
    pub removed_central_ave: usize,
    pub removed_general_delivery: usize,
    pub duplicates_removed: usize,
    pub rows_highlighted_today: usize,
    pub end_rows: usize,
    pub ok: bool,
    pub error: Option<String>,
}

impl CleanStats {
    fn new(path: &Path) -> Self {
        Self {
            file: path.display().to_string(),
            start_rows: 0,
            removed_disposed: 0,
            removed_kentucky_ave: 0,
            removed_central_ave: 0,
            removed_general_delivery: 0,
            duplicates_removed: 0,
            rows_highlighted_today: 0,
            end_rows: 0,
            ok: false,
            error: None,
        }
    }
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub ok: usize,
    pub failed: usize,
    pub stats: Vec<CleanStats>,
}

/// Runs the full cleaning pipeline for one file, in place. Errors land in
/// the returned stats instead of propagating, so one bad file never stops
/// a batch.
#[instrument(skip_all, fields(file = %path.display()))]
pub fn clean_file(path: &Path, today: NaiveDate) -> CleanStats {
    let mut stats = CleanStats::new(path);
    counter!("scrub_clean_runs_total").increment(1);
    let t_run = std::time::Instant::now();

    match run_stages(path, today, &mut stats) {
        Ok(()) => {
            stats.ok = true;
            info!("File cleaned and saved");
            println!("🎉 File cleaned and saved: {}", path.display());
        }
        Err(e) => {
            error!("Processing failed: {}", e);
            println!("❌ Error processing file: {e}");
            counter!("scrub_clean_failures_total").increment(1);
            stats.error = Some(e.to_string());
        }
    }

    histogram!("scrub_clean_duration_seconds").record(t_run.elapsed().as_secs_f64());
    stats
}

fn run_stages(path: &Path, today: NaiveDate, stats: &mut CleanStats) -> Result<()> {
    let mut table = RecordTable::load(path)?;
    stats.start_rows = table.rows.len();

    normalize_fields(&mut table);

    let counts = filter::apply_filters(&mut table, FilterMode::Cleaning);
    stats.removed_disposed = counts.disposed;
    stats.removed_kentucky_ave = counts.kentucky_ave;
    stats.removed_central_ave = counts.central_ave;
    stats.removed_general_delivery = counts.general_delivery;
    counter!("scrub_rows_removed_total").increment(counts.total_removed() as u64);
    if counts.disposed > 0 {
        println!("🗑️ Removed {} row(s) with Status 'Disposed'", counts.disposed);
    }
    if counts.kentucky_ave > 0 {
        println!(
            "🏠 Removed {} row(s) with '814 North Kentucky Avenue'",
            counts.kentucky_ave
        );
    }
    if counts.central_ave > 0 {
        println!(
            "🏢 Removed {} row(s) with '180 East Central Avenue'",
            counts.central_ave
        );
    }
    if counts.general_delivery > 0 {
        println!(
            "📦 Removed {} row(s) with 'General Delivery'",
            counts.general_delivery
        );
    }

    stats.duplicates_removed = dedupe::dedupe_by_address(&mut table);
    counter!("scrub_duplicates_removed_total").increment(stats.duplicates_removed as u64);
    if stats.duplicates_removed > 0 {
        println!(
            "🔁 Removed {} duplicate address row(s), kept oldest by Capture Date",
            stats.duplicates_removed
        );
    }

    organize::reorder_columns(&mut table);
    println!("📑 Reordered columns");
    organize::sort_by_capture_date(&mut table);
    println!("📅 Sorted rows by 'Capture Date' (oldest to newest)");

    stats.end_rows = table.rows.len();
    table.save(path)?;
    println!("💾 Saved cleaned data");

    // styling happens against the persisted file so it survives on its own
    let outcome = annotate::annotate_file(path, today)?;
    stats.rows_highlighted_today = outcome.rows_highlighted;
    if outcome.zip_column.is_some() {
        println!("🏷️ Formatted 'Zip' column as text");
    }
    match outcome.capture_date_column {
        Some(_) => println!(
            "✅ Highlighted {} row(s) with today's Capture Date",
            outcome.rows_highlighted
        ),
        None => println!("⚠️ 'Capture Date' column not found, skipping highlighting"),
    }

    Ok(())
}

fn normalize_fields(table: &mut RecordTable) {
    if let Some(name_idx) = table.column_index(COL_NAME) {
        for row in &mut table.rows {
            let value = row.cell(name_idx).to_string();
            if !value.trim().is_empty() {
                row.set_cell(name_idx, normalize::normalize_name(&value));
            }
        }
        println!("🧼 Cleaned 'Name' column");
    }
    if let Some(race_idx) = table.column_index(COL_RACE) {
        for row in &mut table.rows {
            let value = row.cell(race_idx).to_string();
            if !value.trim().is_empty() {
                row.set_cell(race_idx, normalize::normalize_race(&value));
            }
        }
        println!("🧬 Standardized 'Race' column");
    }
    if let Some(addr_idx) = table.column_index(COL_ADDRESS_1) {
        for row in &mut table.rows {
            let value = row.cell(addr_idx).to_string();
            if !value.trim().is_empty() {
                row.set_cell(addr_idx, normalize::abbreviate_address(&value));
            }
        }
        println!("📫 Standardized keywords in 'Address 1'");
    }
}

/// Cleans every file in order, printing per-file summaries and an overall
/// banner, then writes the JSON batch report when a report directory is
/// given. Failures stay isolated to their file.
pub fn clean_batch(paths: &[PathBuf], today: NaiveDate, report_dir: Option<&Path>) -> BatchSummary {
    let mut all_stats = Vec::with_capacity(paths.len());
    for path in paths {
        banner(&format!("📄 Processing: {}", path.display()));
        let stats = clean_file(path, today);
        print_file_summary(&stats);
        all_stats.push(stats);
    }

    let ok = all_stats.iter().filter(|s| s.ok).count();
    let failed = all_stats.len() - ok;
    banner("📊 Overall Summary");
    println!("Files processed: {} (ok: {}, failed: {})", all_stats.len(), ok, failed);

    let summary = BatchSummary {
        processed: all_stats.len(),
        ok,
        failed,
        stats: all_stats,
    };

    if let Some(dir) = report_dir {
        match write_report(&summary, dir) {
            Ok(report_path) => {
                info!("Batch report written to {}", report_path.display());
                println!("🧾 Batch report: {}", report_path.display());
            }
            Err(e) => warn!("Failed to write batch report: {}", e),
        }
    }

    summary
}

fn print_file_summary(stats: &CleanStats) {
    println!("-- Summary --");
    if stats.ok {
        println!("Start rows: {}", stats.start_rows);
        println!("Removed Disposed: {}", stats.removed_disposed);
        println!(
            "Removed '814 North Kentucky Avenue': {}",
            stats.removed_kentucky_ave
        );
        println!(
            "Removed '180 East Central Avenue': {}",
            stats.removed_central_ave
        );
        println!(
            "Removed 'General Delivery': {}",
            stats.removed_general_delivery
        );
        println!("Duplicate addresses removed: {}", stats.duplicates_removed);
        println!("Rows highlighted today: {}", stats.rows_highlighted_today);
        println!("End rows: {}", stats.end_rows);
    } else {
        println!(
            "FAILED: {}",
            stats.error.as_deref().unwrap_or("Unknown error")
        );
    }
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(72));
    println!("{title}");
    println!("{}", "=".repeat(72));
}

/// Persists the batch stats as a timestamped JSON report.
fn write_report(summary: &BatchSummary, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let report_path = dir.join(format!("clean_{timestamp}.json"));
    fs::write(&report_path, serde_json::to_string_pretty(summary)?)?;
    Ok(report_path)
}
