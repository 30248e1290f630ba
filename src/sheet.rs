// Raw worksheet access.
//
// A `RawSheet` is the grid exactly as stored in the workbook, in absolute
// sheet coordinates: calamine trims leading empty rows/columns from its
// ranges, so they are padded back here so that header offsets line up with
// the row numbers a user sees in Excel.
use crate::error::{ReportError, Result};
use crate::util::{excel_serial_to_datetime, format_plain};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDateTime, Timelike};
use std::fmt;
use std::path::Path;
use tracing::debug;

pub static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Cell {
    /// Absent, whitespace-only, and the literal text `nan` are all blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => {
                let t = s.trim();
                t.is_empty() || t == "nan"
            }
            Cell::Number(n) => n.is_nan(),
            Cell::Bool(_) | Cell::Date(_) => false,
        }
    }

    /// Trimmed display text, or `None` when the cell is blank.
    pub fn text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => f.write_str(&format_plain(*n)),
            Cell::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
            Cell::Date(dt) => {
                if dt.num_seconds_from_midnight() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(n) => Cell::Number(*n),
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
                Some(d) => Cell::Date(d),
                None => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(format!("{}", e)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        RawSheet {
            name: name.into(),
            rows,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the sheet; shorter rows are implicitly padded with
    /// empty cells.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Read one worksheet into memory.
///
/// Fails with `FileNotFound` before touching the workbook when the path does
/// not exist, and with `SheetNotFound` when the workbook has no tab with the
/// given name.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<RawSheet> {
    if !path.exists() {
        return Err(ReportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut workbook = open_workbook_auto(path).map_err(|source| ReportError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;
    let known = workbook.sheet_names().iter().any(|n| n == sheet);
    let range = workbook.worksheet_range(sheet).map_err(|source| {
        if known {
            ReportError::Workbook {
                path: path.to_path_buf(),
                source,
            }
        } else {
            ReportError::SheetNotFound {
                sheet: sheet.to_string(),
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let (row_start, col_start) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_start];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_start];
        cells.extend(row.iter().map(Cell::from));
        rows.push(cells);
    }
    debug!(
        sheet,
        height = rows.len(),
        width = col_start + range.width(),
        "read worksheet"
    );
    Ok(RawSheet::new(sheet, rows))
}
