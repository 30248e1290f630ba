// Snapshot discovery under the inputs directory.
//
// Layout is `<root>/<YYYY>/<MM>/<file>.xlsx`. Month directories may be
// written with or without a leading zero.
use crate::error::{ReportError, Result};
use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A resolved snapshot file together with the month it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub year: i32,
    pub month: u32,
    pub path: PathBuf,
}

impl Snapshot {
    /// `YYYY-MM`, as used in comparison headers.
    pub fn label(&self) -> String {
        period_label(self.year, self.month)
    }
}

pub fn period_label(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

fn escaped(dir: &Path) -> String {
    Pattern::escape(&dir.display().to_string())
}

/// Workbooks matching `pattern`, in lexical order. Office lock files
/// (`~$name.xlsx`) are skipped.
fn workbooks(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(std::result::Result::ok)
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with("~$"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn dir_number<T: std::str::FromStr>(path: &Path) -> Option<T> {
    let name = path.file_name()?.to_str()?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Years that have at least one snapshot, newest first.
pub fn available_years(root: &Path) -> Result<Vec<i32>> {
    let pattern = format!("{}/*/*/*.xlsx", escaped(root));
    let years: BTreeSet<i32> = workbooks(&pattern)?
        .iter()
        .filter_map(|p| p.parent()?.parent())
        .filter_map(dir_number::<i32>)
        .collect();
    Ok(years.into_iter().rev().collect())
}

/// Months of `year` that have at least one snapshot, in calendar order.
pub fn available_months(root: &Path, year: i32) -> Result<Vec<u32>> {
    let pattern = format!("{}/{}/*/*.xlsx", escaped(root), year);
    let months: BTreeSet<u32> = workbooks(&pattern)?
        .iter()
        .filter_map(|p| p.parent())
        .filter_map(dir_number::<u32>)
        .filter(|m| (1..=12).contains(m))
        .collect();
    Ok(months.into_iter().collect())
}

/// The snapshot for one year/month: the first workbook in lexical order.
pub fn resolve_snapshot(root: &Path, year: i32, month: u32) -> Result<Snapshot> {
    let year_dir = root.join(year.to_string());
    for month_dir in [format!("{:02}", month), month.to_string()] {
        let pattern = format!("{}/*.xlsx", escaped(&year_dir.join(&month_dir)));
        if let Some(path) = workbooks(&pattern)?.into_iter().next() {
            debug!(year, month, path = %path.display(), "resolved snapshot");
            return Ok(Snapshot { year, month, path });
        }
    }
    Err(ReportError::SnapshotNotFound {
        root: root.to_path_buf(),
        year,
        month,
    })
}

/// The most recent snapshot, or `None` when the inputs tree is empty.
pub fn latest_snapshot(root: &Path) -> Result<Option<Snapshot>> {
    for year in available_years(root)? {
        if let Some(&month) = available_months(root, year)?.last() {
            return resolve_snapshot(root, year, month).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn lists_years_descending_and_months_ascending() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "2024/12/gim.xlsx");
        touch(dir.path(), "2025/10/gim.xlsx");
        touch(dir.path(), "2025/09/gim.xlsx");
        touch(dir.path(), "2025/3/gim.xlsx");
        touch(dir.path(), "notes/readme.xlsx");
        fs::create_dir_all(dir.path().join("2026/01")).unwrap();

        assert_eq!(available_years(dir.path()).unwrap(), vec![2025, 2024]);
        assert_eq!(available_months(dir.path(), 2025).unwrap(), vec![3, 9, 10]);
        assert!(available_months(dir.path(), 2023).unwrap().is_empty());
    }

    #[test]
    fn resolves_first_workbook_and_skips_lock_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "2025/09/~$b.xlsx");
        touch(dir.path(), "2025/09/b.xlsx");
        touch(dir.path(), "2025/09/c.xlsx");
        touch(dir.path(), "2025/3/early.xlsx");

        let snap = resolve_snapshot(dir.path(), 2025, 9).unwrap();
        assert!(snap.path.ends_with("2025/09/b.xlsx"));
        assert_eq!(snap.label(), "2025-09");

        let snap = resolve_snapshot(dir.path(), 2025, 3).unwrap();
        assert!(snap.path.ends_with("2025/3/early.xlsx"));
    }

    #[test]
    fn missing_month_is_an_error() {
        let dir = tempdir().unwrap();
        let err = resolve_snapshot(dir.path(), 2025, 1).unwrap_err();
        assert!(matches!(err, ReportError::SnapshotNotFound { year: 2025, month: 1, .. }));
    }

    #[test]
    fn latest_picks_newest_year_then_month() {
        let dir = tempdir().unwrap();
        assert_eq!(latest_snapshot(dir.path()).unwrap(), None);
        touch(dir.path(), "2024/12/old.xlsx");
        touch(dir.path(), "2025/02/a.xlsx");
        touch(dir.path(), "2025/10/z.xlsx");
        let latest = latest_snapshot(dir.path()).unwrap().unwrap();
        assert_eq!((latest.year, latest.month), (2025, 10));
    }
}
