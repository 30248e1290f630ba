use crate::error::Result;
use crate::header::{resolve_header, HeaderResolution};
use crate::normalize::{normalize_capacity_column, parse_cell_date};
use crate::record::{Record, RecordSet};
use crate::schema::{FieldRole, Schema};
use crate::sheet::{read_sheet, Cell, RawSheet};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub columns: usize,
    pub undated_rows: usize,
    pub unresolved_roles: Vec<FieldRole>,
}

/// Read `sheet` from the workbook at `path` and turn it into a clean
/// `RecordSet`, with the header block starting at row `offset`.
pub fn load_snapshot(path: &Path, sheet: &str, offset: usize) -> Result<(RecordSet, LoadReport)> {
    let raw = read_sheet(path, sheet)?;
    let (set, report) = extract(&raw, offset)?;
    info!(
        path = %path.display(),
        rows = report.total_rows,
        columns = report.columns,
        undated = report.undated_rows,
        "loaded snapshot"
    );
    Ok((set, report))
}

/// Header resolution and normalization over an in-memory sheet.
pub fn extract(raw: &RawSheet, offset: usize) -> Result<(RecordSet, LoadReport)> {
    let HeaderResolution { columns, rows } = resolve_header(raw, offset)?;
    let set = build_record_set(columns, rows);

    let unresolved_roles = set.schema.missing();
    if !unresolved_roles.is_empty() {
        warn!(
            sheet = %raw.name,
            missing = ?unresolved_roles,
            "some field roles did not match any column"
        );
    }
    let report = LoadReport {
        total_rows: set.len(),
        columns: set.columns.len(),
        undated_rows: set.records.iter().filter(|r| r.projected_cod.is_none()).count(),
        unresolved_roles,
    };
    Ok((set, report))
}

/// Build records from resolved columns and data rows. The capacity column
/// (if any) is coerced in place so `cells` and `capacity_mw` agree.
pub fn build_record_set(columns: Vec<String>, mut rows: Vec<Vec<Cell>>) -> RecordSet {
    let schema = Schema::resolve(&columns);
    if let Some(col) = schema.index(FieldRole::Capacity) {
        normalize_capacity_column(&mut rows, col);
    }

    let records = rows
        .into_iter()
        .map(|mut cells| {
            cells.resize(columns.len(), Cell::Empty);
            let cell = |role: FieldRole| schema.index(role).map(|i| &cells[i]);
            let text = |role: FieldRole| cell(role).and_then(Cell::text);
            Record {
                inr: text(FieldRole::Identifier),
                project_name: text(FieldRole::ProjectName),
                capacity_mw: match cell(FieldRole::Capacity) {
                    Some(Cell::Number(n)) => *n,
                    _ => 0.0,
                },
                fuel: text(FieldRole::Fuel),
                technology: text(FieldRole::Technology),
                county: text(FieldRole::County),
                projected_cod: cell(FieldRole::CompletionDate).and_then(parse_cell_date),
                status: text(FieldRole::Status),
                study_phase: text(FieldRole::StudyPhase),
                change_indicator: text(FieldRole::ChangeIndicator),
                cells,
            }
        })
        .collect();

    RecordSet {
        columns,
        schema,
        records,
    }
}
