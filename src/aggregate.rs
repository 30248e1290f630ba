// Grouping and summary statistics over a RecordSet.
//
// All views are computed from scratch on every call. Group keys are unique;
// ordering is applied last and depends on the dimension.
use crate::categories::{categorize, normalize_fuel, normalize_technology, UNKNOWN};
use crate::record::{PeriodFilter, Record};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    County,
    Period,
    Fuel,
    Technology,
    /// Fuel name refined by technology when the fuel is uninformative.
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Descending total capacity, ties by ascending key.
    Ranked,
    /// Ascending key; period labels sort chronologically.
    Chronological,
}

impl Dimension {
    pub fn default_order(self) -> SortOrder {
        match self {
            Dimension::Period => SortOrder::Chronological,
            _ => SortOrder::Ranked,
        }
    }

    /// Group key for a record, or `None` when the record has no place in
    /// this dimension (only undated records under `Period`).
    pub fn key(self, record: &Record) -> Option<String> {
        match self {
            Dimension::County => Some(record.county.clone().unwrap_or_else(|| UNKNOWN.to_string())),
            Dimension::Period => record.period().map(|p| p.to_string()),
            Dimension::Fuel => Some(normalize_fuel(record.fuel.as_deref())),
            Dimension::Technology => Some(normalize_technology(record.technology.as_deref())),
            Dimension::Category => Some(categorize(
                record.fuel.as_deref(),
                record.technology.as_deref(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub total_capacity: f64,
    pub record_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<GroupSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub dimension: Dimension,
    pub groups: Vec<GroupSummary>,
    pub total_capacity: f64,
    pub record_count: usize,
}

impl AggregateView {
    pub fn get(&self, key: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Records that survive the period filter, if one is given.
pub fn apply_filter<'a>(records: &'a [Record], filter: Option<&PeriodFilter>) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| filter.map_or(true, |f| f.matches(r)))
        .collect()
}

/// Group `records` by `dimension` after applying `filter`.
///
/// An empty input (or a filter that matches nothing) gives an empty view
/// with zero totals.
pub fn aggregate(
    records: &[Record],
    dimension: Dimension,
    filter: Option<&PeriodFilter>,
) -> AggregateView {
    let selected = apply_filter(records, filter);
    group(&selected, dimension, dimension.default_order())
}

/// Per-county view where each county carries its own breakdown by refined
/// category.
pub fn county_breakdown(records: &[Record], filter: Option<&PeriodFilter>) -> AggregateView {
    let selected = apply_filter(records, filter);
    let mut view = group(&selected, Dimension::County, SortOrder::Ranked);
    for summary in &mut view.groups {
        let in_county: Vec<&Record> = selected
            .iter()
            .copied()
            .filter(|r| Dimension::County.key(r).as_deref() == Some(summary.key.as_str()))
            .collect();
        summary.breakdown = group(&in_county, Dimension::Category, SortOrder::Ranked).groups;
    }
    view
}

/// Core grouping over an already-filtered selection.
pub fn group(records: &[&Record], dimension: Dimension, order: SortOrder) -> AggregateView {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut total_capacity = 0.0;
    let mut record_count = 0;
    for r in records {
        let Some(key) = dimension.key(r) else {
            continue;
        };
        let e = acc.entry(key).or_insert((0.0, 0));
        e.0 += r.capacity_mw;
        e.1 += 1;
        total_capacity += r.capacity_mw;
        record_count += 1;
    }

    let mut groups: Vec<GroupSummary> = acc
        .into_iter()
        .map(|(key, (total_capacity, record_count))| GroupSummary {
            key,
            total_capacity,
            record_count,
            breakdown: Vec::new(),
        })
        .collect();
    sort_groups(&mut groups, order);

    AggregateView {
        dimension,
        groups,
        total_capacity,
        record_count,
    }
}

pub fn sort_groups(groups: &mut [GroupSummary], order: SortOrder) {
    match order {
        SortOrder::Ranked => groups.sort_by(|a, b| {
            b.total_capacity
                .partial_cmp(&a.total_capacity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        }),
        // `YYYYQn` labels sort chronologically as plain strings.
        SortOrder::Chronological => groups.sort_by(|a, b| a.key.cmp(&b.key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(
        county: Option<&str>,
        fuel: &str,
        tech: &str,
        mw: f64,
        cod: Option<(i32, u32, u32)>,
    ) -> Record {
        Record {
            county: county.map(str::to_string),
            fuel: Some(fuel.to_string()),
            technology: Some(tech.to_string()),
            capacity_mw: mw,
            projected_cod: cod.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            rec(Some("Pecos"), "SOL", "PV", 100.0, Some((2025, 1, 15))),
            rec(Some("Pecos"), "OTH", "BA", 50.0, Some((2025, 2, 1))),
            rec(Some("Nolan"), "WIN", "WT", 120.0, Some((2025, 5, 1))),
            rec(None, "GAS", "GT", 30.0, None),
            rec(Some("Ector"), "SOL", "PV", 150.0, Some((2024, 11, 30))),
        ]
    }

    #[test]
    fn totals_are_conserved_for_every_dimension() {
        let records = sample();
        let full: f64 = records.iter().map(|r| r.capacity_mw).sum();
        for dim in [
            Dimension::County,
            Dimension::Fuel,
            Dimension::Technology,
            Dimension::Category,
        ] {
            let view = aggregate(&records, dim, None);
            let sum: f64 = view.groups.iter().map(|g| g.total_capacity).sum();
            assert!((sum - full).abs() < 1e-9, "{dim:?}");
            assert_eq!(view.record_count, records.len());
        }
        // Period grouping drops the undated record, and nothing else.
        let view = aggregate(&records, Dimension::Period, None);
        let sum: f64 = view.groups.iter().map(|g| g.total_capacity).sum();
        assert!((sum - (full - 30.0)).abs() < 1e-9);
        assert_eq!(view.total_capacity, sum);
    }

    #[test]
    fn ranked_views_sort_by_capacity_then_key() {
        let mut records = sample();
        records.push(rec(Some("Andrews"), "SOL", "PV", 150.0, None));
        let view = aggregate(&records, Dimension::County, None);
        let keys: Vec<&str> = view.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Andrews", "Ector", "Pecos", "Nolan", "Unknown"]);
    }

    #[test]
    fn period_views_are_chronological() {
        let view = aggregate(&sample(), Dimension::Period, None);
        let keys: Vec<&str> = view.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2024Q4", "2025Q1", "2025Q2"]);
        assert_eq!(view.get("2025Q1").unwrap().record_count, 2);
    }

    #[test]
    fn storage_aggregates_under_its_technology() {
        let view = aggregate(&sample(), Dimension::Category, None);
        assert!(view.get("Other").is_none());
        assert_eq!(view.get("Battery Energy Storage").unwrap().total_capacity, 50.0);
    }

    #[test]
    fn period_filter_keeps_only_selected_quarters() {
        let records = vec![
            rec(Some("A"), "SOL", "PV", 10.0, Some((2025, 1, 5))),
            rec(Some("B"), "SOL", "PV", 20.0, Some((2025, 3, 5))),
            rec(Some("C"), "SOL", "PV", 40.0, Some((2025, 4, 5))),
            rec(Some("D"), "SOL", "PV", 80.0, None),
        ];
        let filter = PeriodFilter::parse(&["2025Q1"]).unwrap();
        let view = aggregate(&records, Dimension::Period, Some(&filter));
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].key, "2025Q1");
        assert_eq!(view.groups[0].record_count, 2);
        assert_eq!(view.total_capacity, 30.0);

        let by_county = aggregate(&records, Dimension::County, Some(&filter));
        assert!(by_county.get("C").is_none());
        assert!(by_county.get("D").is_none());
    }

    #[test]
    fn empty_selection_is_a_well_formed_view() {
        let filter = PeriodFilter::parse(&["1999Q1"]).unwrap();
        let view = county_breakdown(&sample(), Some(&filter));
        assert!(view.is_empty());
        assert_eq!(view.total_capacity, 0.0);
        assert_eq!(view.record_count, 0);
    }

    #[test]
    fn county_view_nests_category_breakdown() {
        let view = county_breakdown(&sample(), None);
        let pecos = view.get("Pecos").unwrap();
        assert_eq!(pecos.total_capacity, 150.0);
        let nested: Vec<(&str, f64)> = pecos
            .breakdown
            .iter()
            .map(|g| (g.key.as_str(), g.total_capacity))
            .collect();
        assert_eq!(nested, vec![("Solar", 100.0), ("Battery Energy Storage", 50.0)]);
        let nested_sum: f64 = pecos.breakdown.iter().map(|g| g.total_capacity).sum();
        assert_eq!(nested_sum, pecos.total_capacity);
    }
}
