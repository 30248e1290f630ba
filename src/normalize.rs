// Post-extraction cleanup of typed columns.
//
// Unparseable values are soft failures: capacity falls back to 0 and
// unparseable dates become `None`. Neither is ever an error.
use crate::sheet::Cell;
use crate::util::{excel_serial_to_datetime, parse_date_safe, parse_f64_safe};
use chrono::NaiveDate;

/// Numeric reading of a raw capacity cell, or `None` when it is missing or
/// not a number. Signs are preserved here.
pub fn parse_capacity(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_f64_safe(Some(s.as_str())),
        _ => None,
    }
}

/// Capacity as used for aggregation: missing becomes 0 and the sign is
/// dropped, since retired or reduced capacity is encoded as `-100` or
/// `(100)` in the source.
pub fn normalize_capacity(cell: &Cell) -> f64 {
    parse_capacity(cell).unwrap_or(0.0).abs()
}

/// Coerce column `col` of every row in place to a non-negative number.
pub fn normalize_capacity_column(rows: &mut [Vec<Cell>], col: usize) {
    for row in rows.iter_mut() {
        if let Some(cell) = row.get_mut(col) {
            *cell = Cell::Number(normalize_capacity(cell));
        }
    }
}

/// Completion date of a cell: native date cells, Excel serial numbers, and
/// the text layouts in `util::parse_date_safe`.
pub fn parse_cell_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(dt) => Some(dt.date()),
        Cell::Number(n) => excel_serial_to_datetime(*n).map(|dt| dt.date()),
        Cell::Text(s) => parse_date_safe(Some(s.as_str())),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

/// Canonical text of a cell for equality checks between snapshots.
///
/// Blank cells have no value; anything date-like is rendered `YYYY-MM-DD`
/// so `03/15/2025` and a native date cell for the same day compare equal.
pub fn comparable_value(cell: &Cell) -> Option<String> {
    if cell.is_blank() {
        return None;
    }
    match cell {
        Cell::Date(dt) => Some(dt.date().format("%Y-%m-%d").to_string()),
        Cell::Text(s) => {
            let t = s.trim();
            Some(match parse_date_safe(Some(t)) {
                Some(d) => d.format("%Y-%m-%d").to_string(),
                None => t.to_string(),
            })
        }
        other => other.text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn capacity_is_always_finite_and_non_negative() {
        let cases = [
            (Cell::Number(100.0), 100.0),
            (text("-100"), 100.0),
            (text("(100)"), 100.0),
            (text("abc"), 0.0),
            (text("1e3"), 1000.0),
            (text("(1.5e2)"), 150.0),
            (text("nan"), 0.0),
            (text(""), 0.0),
            (Cell::Empty, 0.0),
            (Cell::Number(f64::NAN), 0.0),
            (Cell::Number(-42.5), 42.5),
            (Cell::Bool(true), 0.0),
        ];
        for (cell, expected) in cases {
            let v = normalize_capacity(&cell);
            assert!(v.is_finite() && v >= 0.0, "{cell:?} -> {v}");
            assert_eq!(v, expected, "{cell:?}");
        }
    }

    #[test]
    fn mixed_capacity_column_sums_to_150() {
        let mut rows = vec![
            vec![Cell::Number(100.0)],
            vec![text("(50)")],
            vec![text("abc")],
            vec![Cell::Empty],
        ];
        normalize_capacity_column(&mut rows, 0);
        let values: Vec<f64> = rows
            .iter()
            .map(|r| match r[0] {
                Cell::Number(n) => n,
                _ => f64::NAN,
            })
            .collect();
        assert_eq!(values, vec![100.0, 50.0, 0.0, 0.0]);
        assert_eq!(values.iter().sum::<f64>(), 150.0);
    }

    #[test]
    fn dates_come_from_cells_serials_and_text() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(parse_cell_date(&Cell::Date(day.and_hms_opt(0, 0, 0).unwrap())), Some(day));
        assert_eq!(parse_cell_date(&Cell::Number(45747.0)), Some(day));
        assert_eq!(parse_cell_date(&text("3/31/2025")), Some(day));
        assert_eq!(parse_cell_date(&text("TBD")), None);
        assert_eq!(parse_cell_date(&Cell::Empty), None);
    }

    #[test]
    fn comparable_values_unify_blank_and_dates() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(comparable_value(&text(" nan ")), None);
        assert_eq!(comparable_value(&Cell::Empty), None);
        assert_eq!(
            comparable_value(&text("03/15/2025")),
            comparable_value(&Cell::Date(day.and_hms_opt(0, 0, 0).unwrap()))
        );
        assert_eq!(comparable_value(&text("  Solar ")).as_deref(), Some("Solar"));
        assert_eq!(comparable_value(&Cell::Number(20.0)).as_deref(), Some("20"));
    }
}
