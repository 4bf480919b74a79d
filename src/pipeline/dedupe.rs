use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::constants::{COL_ADDRESS_1, COL_CAPTURE_DATE, COL_CITY, COL_NAME, COL_STATE, COL_ZIP};
use crate::table::{parse_capture_date, RecordTable};

/// Drops later duplicates of the same street address, keeping the earliest
/// captured row in each group. Returns the number of rows removed.
///
/// The key is the trimmed, lowercased Address 1 string. Within a group the
/// minimum non-null Capture Date wins; rows without a parsable date lose to
/// any dated row, and an all-undated group keeps its first row.
pub fn dedupe_by_address(table: &mut RecordTable) -> usize {
    let (Some(addr_idx), Some(date_idx)) = (
        table.column_index(COL_ADDRESS_1),
        table.column_index(COL_CAPTURE_DATE),
    ) else {
        debug!("Address or Capture Date column absent, skipping dedup");
        return 0;
    };

    let mut winners: HashMap<String, usize> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate() {
        let key = row.cell(addr_idx).trim().to_lowercase();
        let date = parse_capture_date(row.cell(date_idx));
        match winners.entry(key) {
            Entry::Occupied(mut entry) => {
                let current = *entry.get();
                let current_date = parse_capture_date(table.rows[current].cell(date_idx));
                let replace = match (date, current_date) {
                    (Some(d), Some(c)) => d < c,
                    (Some(_), None) => true,
                    _ => false,
                };
                if replace {
                    entry.insert(i);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(i);
            }
        }
    }

    let keep: HashSet<usize> = winners.into_values().collect();
    let before = table.rows.len();
    let mut idx = 0;
    table.rows.retain(|_| {
        let kept = keep.contains(&idx);
        idx += 1;
        kept
    });
    before - table.rows.len()
}

/// First-occurrence-wins dedup on the exact identity tuple validation mode
/// uses after enrichment. No date tiebreak.
pub fn dedupe_by_identity(table: &mut RecordTable) -> usize {
    let columns: Vec<Option<usize>> = [COL_NAME, COL_ADDRESS_1, COL_CITY, COL_STATE, COL_ZIP]
        .iter()
        .map(|name| table.column_index(name))
        .collect();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let before = table.rows.len();
    table.rows.retain(|row| {
        let key: Vec<String> = columns
            .iter()
            .map(|col| col.map(|i| row.cell(i).to_string()).unwrap_or_default())
            .collect();
        seen.insert(key)
    });
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
    fn test_earliest_capture_date_survives() {
        let mut t = table(
            &["Address 1", "Capture Date"],
            &[
                &["123 Main St", "2024-01-05"],
                &["123 Main St", "2024-01-02"],
                &["123 Main St", "2024-01-09"],
            ],
        );
        let removed = dedupe_by_address(&mut t);
        assert_eq!(removed, 2);
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].cell(1), "2024-01-02");
    }

    #[test]
    fn test_key_is_case_insensitive_and_trimmed() {
        let mut t = table(
            &["Address 1", "Capture Date"],
            &[
                &["123 Main St", "2024-01-05"],
                &["  123 MAIN ST ", "2024-01-02"],
            ],
        );
        assert_eq!(dedupe_by_address(&mut t), 1);
        assert_eq!(t.rows[0].cell(1), "2024-01-02");
    }

    #[test]
    fn test_undated_rows_lose_to_dated_rows() {
        let mut t = table(
            &["Address 1", "Capture Date"],
            &[
                &["123 Main St", "not a date"],
                &["123 Main St", "2024-06-01"],
            ],
        );
        assert_eq!(dedupe_by_address(&mut t), 1);
        assert_eq!(t.rows[0].cell(1), "2024-06-01");
    }

    #[test]
    fn test_all_undated_group_keeps_first_row() {
        let mut t = table(
            &["Address 1", "Capture Date", "Name"],
            &[
                &["123 Main St", "", "first"],
                &["123 Main St", "", "second"],
            ],
        );
        assert_eq!(dedupe_by_address(&mut t), 1);
        assert_eq!(t.rows[0].cell(2), "first");
    }

    #[test]
    fn test_distinct_addresses_are_untouched() {
        let mut t = table(
            &["Address 1", "Capture Date"],
            &[
                &["123 Main St", "2024-01-05"],
                &["456 Oak Ave", "2024-01-02"],
            ],
        );
        assert_eq!(dedupe_by_address(&mut t), 0);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn test_missing_columns_skip_dedup() {
        let mut t = table(&["Address 1"], &[&["123 Main St"], &["123 Main St"]]);
        assert_eq!(dedupe_by_address(&mut t), 0);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn test_identity_dedup_is_first_occurrence_wins() {
        let mut t = table(
            &["Name", "Address 1", "City", "State", "Zip", "Capture Date"],
            &[
                &["John Doe", "123 Main St", "Lakeland", "FL", "33801", "2024-05-05"],
                &["John Doe", "123 Main St", "Lakeland", "FL", "33801", "2024-01-01"],
                &["Jane Doe", "123 Main St", "Lakeland", "FL", "33801", "2024-01-01"],
            ],
        );
        let removed = dedupe_by_identity(&mut t);
        assert_eq!(removed, 1);
        assert_eq!(t.rows.len(), 2);
        // the later-dated first occurrence is the one kept
        assert_eq!(t.rows[0].cell(5), "2024-05-05");
    }

    #[test]
    fn test_identity_dedup_key_is_exact() {
        let mut t = table(
            &["Name", "Address 1", "City", "State", "Zip"],
            &[
                &["John Doe", "123 Main St", "Lakeland", "FL", "33801"],
                &["JOHN DOE", "123 Main St", "Lakeland", "FL", "33801"],
            ],
        );
        assert_eq!(dedupe_by_identity(&mut t), 0);
        assert_eq!(t.rows.len(), 2);
    }
}
