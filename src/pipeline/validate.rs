use metrics::counter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::constants::{
    COL_ADDRESS_1, COL_ADDRESS_2, COL_CITY, COL_STATE, COL_ZIP, VALIDATION_HEADERS,
    VALIDATION_HEADER_OFFSET, VALIDATION_MIN_COLUMNS,
};
use crate::error::{Result, ScrubError};
use crate::geocode::AddressValidator;
use crate::pipeline::dedupe;
use crate::pipeline::filter::{self, FilterMode};
use crate::table::RecordTable;

/// Counters for one validation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    pub file: String,
    pub start_rows: usize,
    pub removed_disallowed: usize,
    pub lookup_errors: usize,
    pub duplicates_removed: usize,
    pub end_rows: usize,
    pub output_file: String,
}

/// Derives `<stem>_validated<ext>` beside the input file.
pub fn validated_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match input.extension() {
        Some(ext) => input.with_file_name(format!("{stem}_validated.{}", ext.to_string_lossy())),
        None => input.with_file_name(format!("{stem}_validated")),
    }
}

/// Pads the schema out and forces the expected headers onto columns C-K.
/// The source export sometimes arrives with those headers shifted or
/// missing, so validation repairs them before filtering.
pub fn ensure_validation_headers(table: &mut RecordTable) {
    while table.headers.len() < VALIDATION_MIN_COLUMNS {
        table.headers.push(format!("Unnamed {}", table.headers.len() + 1));
    }
    for (i, header) in VALIDATION_HEADERS.iter().enumerate() {
        table.headers[VALIDATION_HEADER_OFFSET + i] = header.to_string();
    }
}

/// Validation pipeline for one file: repair headers, drop undeliverable
/// addresses, enrich every remaining row through the geocoder, dedupe on
/// the identity tuple, and persist next to the input.
#[instrument(skip(validator), fields(file = %input.display()))]
pub async fn validate_file(
    input: &Path,
    validator: &AddressValidator,
) -> Result<ValidationStats> {
    let mut stats = ValidationStats {
        file: input.display().to_string(),
        ..ValidationStats::default()
    };
    counter!("scrub_validate_runs_total").increment(1);

    let mut table = RecordTable::load(input)?;
    ensure_validation_headers(&mut table);
    stats.start_rows = table.rows.len();

    stats.removed_disallowed =
        filter::remove_disallowed_addresses(&mut table, FilterMode::Validation);
    if stats.removed_disallowed > 0 {
        println!(
            "📦 Removed {} undeliverable address row(s)",
            stats.removed_disallowed
        );
    }

    let addr1_idx = table
        .column_index(COL_ADDRESS_1)
        .ok_or_else(|| ScrubError::Config(format!("'{COL_ADDRESS_1}' column missing")))?;
    let addr2_idx = table.column_index(COL_ADDRESS_2);
    let city_idx = table
        .column_index(COL_CITY)
        .ok_or_else(|| ScrubError::Config(format!("'{COL_CITY}' column missing")))?;
    let state_idx = table
        .column_index(COL_STATE)
        .ok_or_else(|| ScrubError::Config(format!("'{COL_STATE}' column missing")))?;
    let zip_idx = table
        .column_index(COL_ZIP)
        .ok_or_else(|| ScrubError::Config(format!("'{COL_ZIP}' column missing")))?;

    let total = table.rows.len();
    for (i, row) in table.rows.iter_mut().enumerate() {
        let full_address = AddressValidator::compose_address(&[
            row.cell(addr1_idx),
            addr2_idx.map(|idx| row.cell(idx)).unwrap_or(""),
            row.cell(city_idx),
            row.cell(state_idx),
            row.cell(zip_idx),
        ]);
        println!("[{}/{}] Validating: {}", i + 1, total, full_address);

        let validated = validator.validate(&full_address).await;
        if validated.is_error() {
            stats.lookup_errors += 1;
            counter!("scrub_geocode_errors_total").increment(1);
        }
        row.set_cell(addr1_idx, validated.address1);
        row.set_cell(city_idx, validated.city);
        row.set_cell(state_idx, validated.state);
        row.set_cell(zip_idx, validated.zip);
    }

    stats.duplicates_removed = dedupe::dedupe_by_identity(&mut table);
    println!("\n🧹 Removed {} duplicate row(s).", stats.duplicates_removed);
    stats.end_rows = table.rows.len();

    let output = validated_output_path(input);
    table.save(&output)?;
    stats.output_file = output.display().to_string();
    info!("Validated table saved to {}", output.display());
    println!("✅ Validation complete. Output saved to: {}", output.display());

    if stats.lookup_errors > 0 {
        println!(
            "⚠️ {} lookup(s) failed and were tagged with ERROR markers",
            stats.lookup_errors
        );
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_output_path_keeps_extension() {
        assert_eq!(
            validated_output_path(Path::new("/tmp/cases.csv")),
            PathBuf::from("/tmp/cases_validated.csv")
        );
        assert_eq!(
            validated_output_path(Path::new("cases")),
            PathBuf::from("cases_validated")
        );
    }

    #[test]
    fn test_ensure_validation_headers_pads_and_renames() {
        let mut table = RecordTable::new(vec![
            "Case Number".to_string(),
            "Status".to_string(),
            "A".to_string(),
            "B".to_string(),
        ]);
        ensure_validation_headers(&mut table);
        assert_eq!(table.headers.len(), VALIDATION_MIN_COLUMNS);
        assert_eq!(table.headers[0], "Case Number");
        assert_eq!(table.headers[2], "Name");
        assert_eq!(table.headers[3], "Address 1");
        assert_eq!(table.headers[10], "Capture Date");
    }
}
