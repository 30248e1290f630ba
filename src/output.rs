// Export and console preview of report rows.
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// One CSV row per item, headers taken from the serde field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Markdown table of the first `max_rows` rows, or `None` when there is
/// nothing to show.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}
