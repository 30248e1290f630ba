// Header reconstruction for the multi-row GIM header block.
//
// The block is `HEADER_ROWS` consecutive rows starting at the header offset.
// Row 0 carries "primary" names (the left-most columns in the known layout);
// rows 1..=4 carry name fragments stacked top-to-bottom for the rest.
use crate::error::{ReportError, Result};
use crate::sheet::{Cell, RawSheet};
use tracing::debug;

pub const HEADER_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct HeaderResolution {
    pub columns: Vec<String>,
    /// Data rows following the header block, each padded to `columns.len()`.
    pub rows: Vec<Vec<Cell>>,
}

/// Resolve the name of column `col` from the header block at `offset`.
///
/// A non-blank primary cell wins outright; otherwise the non-blank stacked
/// fragments are joined with single spaces; otherwise `Column_<col>`.
pub fn resolve_column_name(sheet: &RawSheet, offset: usize, col: usize) -> String {
    if let Some(primary) = sheet.cell(offset, col).text() {
        return primary;
    }
    let parts: Vec<String> = (1..HEADER_ROWS)
        .filter_map(|r| sheet.cell(offset + r, col).text())
        .collect();
    if parts.is_empty() {
        synthetic_name(col)
    } else {
        parts.join(" ")
    }
}

pub fn synthetic_name(col: usize) -> String {
    format!("Column_{}", col)
}

/// Flatten the header block at `offset` into column names and return the
/// data rows that follow it.
///
/// Names are not deduplicated. Fully blank data rows are dropped.
pub fn resolve_header(sheet: &RawSheet, offset: usize) -> Result<HeaderResolution> {
    let malformed = |reason: String| ReportError::MalformedHeader {
        sheet: sheet.name.clone(),
        offset,
        reason,
    };
    if sheet.height() < offset + HEADER_ROWS {
        return Err(malformed(format!(
            "sheet has {} rows, header block needs {}",
            sheet.height(),
            offset + HEADER_ROWS
        )));
    }
    let width = sheet.width();
    if width == 0 {
        return Err(malformed("sheet has no columns".to_string()));
    }

    let columns: Vec<String> = (0..width)
        .map(|col| resolve_column_name(sheet, offset, col))
        .collect();
    if columns
        .iter()
        .enumerate()
        .all(|(i, name)| *name == synthetic_name(i))
    {
        return Err(malformed("header block yields no named columns".to_string()));
    }

    let rows: Vec<Vec<Cell>> = sheet.rows[offset + HEADER_ROWS..]
        .iter()
        .filter(|row| !row.iter().all(Cell::is_blank))
        .map(|row| {
            let mut cells = row.clone();
            cells.resize(width, Cell::Empty);
            cells
        })
        .collect();

    debug!(
        sheet = %sheet.name,
        columns = columns.len(),
        rows = rows.len(),
        "resolved header block"
    );
    Ok(HeaderResolution { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    /// Build a sheet with `offset` filler rows followed by the given rows.
    fn sheet_with(offset: usize, rows: Vec<Vec<Cell>>) -> RawSheet {
        let mut all = vec![vec![text("preamble")]; offset];
        all.extend(rows);
        RawSheet::new("Project Details - Large Gen", all)
    }

    fn primary_row() -> Vec<Cell> {
        let names = [
            "INR",
            "Project Name",
            "GIM Study Phase",
            "Interconnecting Entity",
            "POI Location",
            "County",
            "CDR Reporting Zone",
            "Projected COD",
            "Fuel",
            "Technology",
        ];
        let mut row: Vec<Cell> = names.iter().map(|n| text(n)).collect();
        row.resize(12, Cell::Empty);
        row
    }

    #[test]
    fn stacked_fragments_join_when_primary_is_blank() {
        let mut r1 = vec![Cell::Empty; 12];
        let mut r2 = vec![Cell::Empty; 12];
        r1[11] = text("Fuel");
        r2[11] = text("Type");
        let sheet = sheet_with(
            3,
            vec![
                primary_row(),
                r1,
                r2,
                vec![Cell::Empty; 12],
                vec![Cell::Empty; 12],
                vec![text("INR-1")],
            ],
        );
        let header = resolve_header(&sheet, 3).unwrap();
        assert_eq!(header.columns[0], "INR");
        assert_eq!(header.columns[11], "Fuel Type");
        assert_eq!(header.columns[10], "Column_10");
        assert_eq!(header.rows.len(), 1);
        assert_eq!(header.rows[0].len(), 12);
    }

    #[test]
    fn primary_wins_over_stacked_fragments() {
        let sheet = sheet_with(
            0,
            vec![
                vec![text("  Capacity (MW) ")],
                vec![text("ignored")],
                vec![text("also ignored")],
                vec![Cell::Empty],
                vec![Cell::Empty],
            ],
        );
        assert_eq!(resolve_column_name(&sheet, 0, 0), "Capacity (MW)");
    }

    #[test]
    fn nan_and_whitespace_fragments_are_blank() {
        let sheet = sheet_with(
            0,
            vec![
                vec![text("INR"), text("nan")],
                vec![Cell::Empty, text("   ")],
                vec![Cell::Empty, text("Screening")],
                vec![Cell::Empty, text("nan")],
                vec![Cell::Empty, text("Start")],
            ],
        );
        assert_eq!(resolve_column_name(&sheet, 0, 1), "Screening Start");
    }

    #[test]
    fn all_blank_column_gets_synthetic_name() {
        let sheet = sheet_with(
            0,
            vec![
                vec![text("INR"), Cell::Empty, text("County")],
                vec![Cell::Empty; 3],
                vec![Cell::Empty; 3],
                vec![Cell::Empty; 3],
                vec![Cell::Empty; 3],
            ],
        );
        let header = resolve_header(&sheet, 0).unwrap();
        assert_eq!(header.columns, vec!["INR", "Column_1", "County"]);
    }

    #[test]
    fn duplicate_names_are_kept() {
        let sheet = sheet_with(
            0,
            vec![
                vec![text("Notes"), text("Notes")],
                vec![Cell::Empty; 2],
                vec![Cell::Empty; 2],
                vec![Cell::Empty; 2],
                vec![Cell::Empty; 2],
            ],
        );
        let header = resolve_header(&sheet, 0).unwrap();
        assert_eq!(header.columns, vec!["Notes", "Notes"]);
    }

    #[test]
    fn blank_data_rows_are_dropped() {
        let sheet = sheet_with(
            0,
            vec![
                vec![text("INR")],
                vec![Cell::Empty],
                vec![Cell::Empty],
                vec![Cell::Empty],
                vec![Cell::Empty],
                vec![text("21INR0001")],
                vec![text(" ")],
                vec![],
                vec![text("21INR0002")],
            ],
        );
        let header = resolve_header(&sheet, 0).unwrap();
        assert_eq!(header.rows.len(), 2);
    }

    #[test]
    fn short_sheet_is_malformed() {
        let sheet = sheet_with(2, vec![vec![text("INR")]]);
        let err = resolve_header(&sheet, 2).unwrap_err();
        assert!(matches!(err, ReportError::MalformedHeader { offset: 2, .. }));
    }

    #[test]
    fn header_without_any_names_is_malformed() {
        let sheet = sheet_with(0, vec![vec![Cell::Empty, text("nan")]; 6]);
        let err = resolve_header(&sheet, 0).unwrap_err();
        assert!(matches!(err, ReportError::MalformedHeader { .. }));
    }
}
