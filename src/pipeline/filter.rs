use serde::Serialize;
use tracing::debug;

use crate::constants::{
    BLACKLIST_CENTRAL_AVE, BLACKLIST_KENTUCKY_AVE, COL_ADDRESS_1, COL_STATUS, GENERAL_DELIVERY,
    HOMELESS, STATUS_DISPOSED,
};
use crate::table::{Record, RecordTable};

/// Which pipeline is asking; validation mode widens the generic-delivery
/// rule to homeless markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Cleaning,
    Validation,
}

/// Row-removal counts per rule. The sum of these plus the surviving row
/// count always equals the starting row count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCounts {
    pub disposed: usize,
    pub kentucky_ave: usize,
    pub central_ave: usize,
    pub general_delivery: usize,
}

impl FilterCounts {
    pub fn total_removed(&self) -> usize {
        self.disposed + self.kentucky_ave + self.central_ave + self.general_delivery
    }
}

/// Runs the exclusion rules in order, counting each separately. A rule
/// whose target column is absent is skipped, not an error.
pub fn apply_filters(table: &mut RecordTable, mode: FilterMode) -> FilterCounts {
    let mut counts = FilterCounts::default();

    if let Some(status_idx) = table.column_index(COL_STATUS) {
        counts.disposed = remove_rows(table, |row| {
            row.cell(status_idx).trim().eq_ignore_ascii_case(STATUS_DISPOSED)
        });
    } else {
        debug!("No '{}' column, skipping disposed filter", COL_STATUS);
    }

    if let Some(addr_idx) = table.column_index(COL_ADDRESS_1) {
        counts.kentucky_ave = remove_rows(table, |row| {
            row.cell(addr_idx).trim().to_lowercase() == BLACKLIST_KENTUCKY_AVE
        });
        counts.central_ave = remove_rows(table, |row| {
            row.cell(addr_idx).trim().to_lowercase() == BLACKLIST_CENTRAL_AVE
        });
    } else {
        debug!("No '{}' column, skipping address blacklist", COL_ADDRESS_1);
    }

    counts.general_delivery = remove_disallowed_addresses(table, mode);
    counts
}

/// The generic-delivery rule on its own; validation mode runs only this
/// one before enrichment.
pub fn remove_disallowed_addresses(table: &mut RecordTable, mode: FilterMode) -> usize {
    let Some(addr_idx) = table.column_index(COL_ADDRESS_1) else {
        debug!("No '{}' column, skipping disallowed addresses", COL_ADDRESS_1);
        return 0;
    };
    remove_rows(table, |row| {
        let value = row.cell(addr_idx).to_lowercase();
        value.contains(GENERAL_DELIVERY)
            || (mode == FilterMode::Validation && value.contains(HOMELESS))
    })
}

fn remove_rows<F>(table: &mut RecordTable, predicate: F) -> usize
where
    F: Fn(&Record) -> bool,
{
    let before = table.rows.len();
    table.rows.retain(|row| !predicate(row));
    before - table.rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RecordTable {
        let mut t = RecordTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            t.rows.push(Record::new(row.iter().map(|c| c.to_string()).collect()));
        }
        t
    }

    #[test]
    fn test_disposed_rows_are_removed_case_insensitively() {
        let mut t = table(
            &["Name", "Status"],
            &[
                &["A", "Open"],
                &["B", " DISPOSED "],
                &["C", "disposed"],
                &["D", "Pending"],
            ],
        );
        let counts = apply_filters(&mut t, FilterMode::Cleaning);
        assert_eq!(counts.disposed, 2);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn test_blacklisted_addresses_are_removed() {
        let mut t = table(
            &["Address 1"],
            &[
                &["814 North Kentucky Avenue"],
                &["  814 north KENTUCKY avenue  "],
                &["180 East Central Avenue"],
                &["99 Elm St"],
            ],
        );
        let counts = apply_filters(&mut t, FilterMode::Cleaning);
        assert_eq!(counts.kentucky_ave, 2);
        assert_eq!(counts.central_ave, 1);
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].cell(0), "99 Elm St");
    }

    #[test]
    fn test_general_delivery_is_a_substring_match() {
        let mut t = table(
            &["Address 1"],
            &[&["c/o General Delivery"], &["123 Main St"]],
        );
        let counts = apply_filters(&mut t, FilterMode::Cleaning);
        assert_eq!(counts.general_delivery, 1);
        assert_eq!(t.rows.len(), 1);
    }

    #[test]
    fn test_homeless_only_matches_in_validation_mode() {
        let rows: &[&[&str]] = &[&["Homeless"], &["123 Main St"]];
        let mut cleaning = table(&["Address 1"], rows);
        assert_eq!(apply_filters(&mut cleaning, FilterMode::Cleaning).general_delivery, 0);
        assert_eq!(cleaning.rows.len(), 2);

        let mut validation = table(&["Address 1"], rows);
        assert_eq!(
            remove_disallowed_addresses(&mut validation, FilterMode::Validation),
            1
        );
        assert_eq!(validation.rows.len(), 1);
    }

    #[test]
    fn test_absent_columns_are_skipped() {
        let mut t = table(&["Name"], &[&["A"], &["B"]]);
        let counts = apply_filters(&mut t, FilterMode::Cleaning);
        assert_eq!(counts, FilterCounts::default());
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn test_removal_counts_balance_row_totals() {
        let mut t = table(
            &["Address 1", "Status"],
            &[
                &["123 Main St", "Disposed"],
                &["814 North Kentucky Avenue", "Open"],
                &["180 East Central Avenue", "Open"],
                &["General Delivery", "Open"],
                &["55 Oak Ave", "Open"],
            ],
        );
        let start = t.rows.len();
        let counts = apply_filters(&mut t, FilterMode::Cleaning);
        assert_eq!(counts.total_removed() + t.rows.len(), start);
    }
}
