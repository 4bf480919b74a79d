use chrono::NaiveDate;

use crate::constants::{CANONICAL_COLUMN_ORDER, COL_CAPTURE_DATE};
use crate::table::{parse_capture_date, RecordTable};

/// Reorders present columns into the canonical order, then appends the
/// remaining columns in their original relative order. Canonical names are
/// matched exactly; no column is ever dropped.
pub fn reorder_columns(table: &mut RecordTable) {
    let mut order: Vec<usize> = Vec::with_capacity(table.headers.len());
    for name in CANONICAL_COLUMN_ORDER {
        if let Some(idx) = table.column_index_exact(name) {
            order.push(idx);
        }
    }
    for idx in 0..table.headers.len() {
        if !order.contains(&idx) {
            order.push(idx);
        }
    }

    let reordered: Vec<String> = order.iter().map(|&i| table.headers[i].clone()).collect();
    table.headers = reordered;
    for row in &mut table.rows {
        let cells: Vec<String> = order.iter().map(|&i| row.cell(i).to_string()).collect();
        row.cells = cells;
    }
}

/// Final ascending Capture-Date sort. Rows without a parsable date sink to
/// the end; the sort is stable, so ties keep their relative order.
pub fn sort_by_capture_date(table: &mut RecordTable) {
    let Some(date_idx) = table.column_index(COL_CAPTURE_DATE) else {
        return;
    };
    table.rows.sort_by_key(|row| match parse_capture_date(row.cell(date_idx)) {
        Some(date) => (0u8, date),
        None => (1u8, NaiveDate::MAX),
    });
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
    fn test_reorder_puts_canonical_columns_first() {
        let mut t = table(
            &["Zip", "Extra A", "Name", "Extra B", "Address 1"],
            &[&["33801", "a", "John Doe", "b", "123 Main St"]],
        );
        reorder_columns(&mut t);
        assert_eq!(t.headers, vec!["Name", "Address 1", "Zip", "Extra A", "Extra B"]);
        assert_eq!(
            t.rows[0].cells,
            vec!["John Doe", "123 Main St", "33801", "a", "b"]
        );
    }

    #[test]
    fn test_reorder_keeps_passthrough_relative_order() {
        let mut t = table(&["Z Col", "A Col", "Name"], &[&["z", "a", "n"]]);
        reorder_columns(&mut t);
        assert_eq!(t.headers, vec!["Name", "Z Col", "A Col"]);
    }

    #[test]
    fn test_reorder_never_drops_columns() {
        let mut t = table(&["Phone", "Name", "Mystery"], &[&["555", "n", "?"]]);
        reorder_columns(&mut t);
        assert_eq!(t.headers.len(), 3);
        assert!(t.headers.contains(&"Mystery".to_string()));
    }

    #[test]
    fn test_sort_is_ascending_with_undated_rows_last() {
        let mut t = table(
            &["Name", "Capture Date"],
            &[
                &["C", "2024-03-01"],
                &["A", ""],
                &["B", "2024-01-15"],
                &["D", "garbage"],
            ],
        );
        sort_by_capture_date(&mut t);
        let names: Vec<&str> = t.rows.iter().map(|r| r.cell(0)).collect();
        assert_eq!(names, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_sort_without_capture_date_column_is_a_noop() {
        let mut t = table(&["Name"], &[&["B"], &["A"]]);
        sort_by_capture_date(&mut t);
        let names: Vec<&str> = t.rows.iter().map(|r| r.cell(0)).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
