use crate::error::ReportError;
use crate::schema::{FieldRole, Schema};
use crate::sheet::Cell;
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Calendar quarter, rendered as `2025Q1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub quarter: u32,
}

impl Period {
    pub fn new(year: i32, quarter: u32) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Period { year, quarter })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            quarter: date.month0() / 3 + 1,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReportError::InvalidPeriod(s.to_string());
        let upper = s.trim().to_ascii_uppercase();
        let (year, quarter) = upper.split_once('Q').ok_or_else(invalid)?;
        let year: i32 = year.trim().parse().map_err(|_| invalid())?;
        let quarter: u32 = quarter.trim().parse().map_err(|_| invalid())?;
        Period::new(year, quarter).ok_or_else(invalid)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive set of periods a view is restricted to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodFilter {
    periods: BTreeSet<Period>,
}

impl PeriodFilter {
    pub fn new(periods: impl IntoIterator<Item = Period>) -> Self {
        PeriodFilter {
            periods: periods.into_iter().collect(),
        }
    }

    /// Parse labels like `2025Q1`; any invalid label fails the whole filter.
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Result<Self, ReportError> {
        labels
            .iter()
            .map(|l| l.as_ref().parse::<Period>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|periods| PeriodFilter { periods })
    }

    /// Records without a parseable completion date never match.
    pub fn matches(&self, record: &Record) -> bool {
        record
            .period()
            .map(|p| self.periods.contains(&p))
            .unwrap_or(false)
    }

    pub fn labels(&self) -> Vec<String> {
        self.periods.iter().map(Period::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// One project row with its well-known attributes pulled out and typed.
///
/// `cells` keeps the full row (aligned with `RecordSet::columns`) so that
/// snapshot comparison can look at every attribute, including ones with no
/// dedicated field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub inr: Option<String>,
    pub project_name: Option<String>,
    /// Always present and non-negative once normalized.
    pub capacity_mw: f64,
    pub fuel: Option<String>,
    pub technology: Option<String>,
    pub county: Option<String>,
    pub projected_cod: Option<NaiveDate>,
    pub status: Option<String>,
    pub study_phase: Option<String>,
    pub change_indicator: Option<String>,
    pub cells: Vec<Cell>,
}

impl Record {
    pub fn period(&self) -> Option<Period> {
        self.projected_cod.map(Period::from_date)
    }

    /// Display text of the attribute backing `role`, if the record has one.
    pub fn attribute(&self, role: FieldRole) -> Option<String> {
        match role {
            FieldRole::Identifier => self.inr.clone(),
            FieldRole::ProjectName => self.project_name.clone(),
            FieldRole::Capacity => Some(crate::util::format_plain(self.capacity_mw)),
            FieldRole::Fuel => self.fuel.clone(),
            FieldRole::Technology => self.technology.clone(),
            FieldRole::County => self.county.clone(),
            FieldRole::CompletionDate => self
                .projected_cod
                .map(|d| d.format("%Y-%m-%d").to_string()),
            FieldRole::Status => self.status.clone(),
            FieldRole::StudyPhase => self.study_phase.clone(),
            FieldRole::ChangeIndicator => self.change_indicator.clone(),
        }
    }
}

/// All records extracted from one report file, in source order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First column carrying `name`; later duplicates are shadowed.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn total_capacity(&self) -> f64 {
        self.records.iter().map(|r| r.capacity_mw).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(y: i32, m: u32, d: u32) -> Record {
        Record {
            projected_cod: NaiveDate::from_ymd_opt(y, m, d),
            ..Default::default()
        }
    }

    #[test]
    fn quarters_follow_calendar_months() {
        assert_eq!(dated(2025, 1, 1).period().unwrap().to_string(), "2025Q1");
        assert_eq!(dated(2025, 3, 31).period().unwrap().to_string(), "2025Q1");
        assert_eq!(dated(2025, 4, 1).period().unwrap().to_string(), "2025Q2");
        assert_eq!(dated(2026, 12, 31).period().unwrap().to_string(), "2026Q4");
        assert!(Record::default().period().is_none());
    }

    #[test]
    fn period_labels_parse_and_order() {
        let q: Period = "2025q3".parse().unwrap();
        assert_eq!(q, Period::new(2025, 3).unwrap());
        assert!("2025Q5".parse::<Period>().is_err());
        assert!("Q1".parse::<Period>().is_err());
        assert!(Period::new(2024, 4) < Period::new(2025, 1));
    }

    #[test]
    fn filter_is_inclusive_and_skips_undated() {
        let filter = PeriodFilter::parse(&["2025Q1", "2025Q3"]).unwrap();
        assert!(filter.matches(&dated(2025, 2, 10)));
        assert!(filter.matches(&dated(2025, 9, 30)));
        assert!(!filter.matches(&dated(2025, 5, 1)));
        assert!(!filter.matches(&Record::default()));
        assert_eq!(filter.labels(), vec!["2025Q1", "2025Q3"]);
    }

    #[test]
    fn invalid_label_fails_the_filter() {
        let err = PeriodFilter::parse(&["2025Q1", "soon"]).unwrap_err();
        assert!(matches!(err, ReportError::InvalidPeriod(ref s) if s == "soon"));
    }
}
