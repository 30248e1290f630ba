use crate::aggregate::{aggregate, apply_filter, county_breakdown, Dimension, GroupSummary};
use crate::categories::{categorize, category_color, UNKNOWN};
use crate::diff::{cmp_none_last, ComparisonResult};
use crate::record::{PeriodFilter, Record};
use crate::types::{
    AddedRow, CategoryRow, ChangedRow, ChartSeries, ComparisonReport, CountyDetails, CountyEntry,
    CountyMix, CountyRow, CountyTotal, FlaggedRow, ProjectSummary, QuarterRow, QuarterSummary,
};
use crate::util::format_number;
use std::collections::BTreeSet;

const TOP_COUNTIES: usize = 5;

/// "Solar: 300.0 MW, Wind: 120.0 MW" from a category breakdown.
pub fn fuel_mix(breakdown: &[GroupSummary]) -> String {
    breakdown
        .iter()
        .map(|g| format!("{}: {:.1} MW", g.key, g.total_capacity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Total MW by county, largest first, with each county's fuel mix.
pub fn county_report(data: &[Record], filter: Option<&PeriodFilter>) -> Vec<CountyRow> {
    county_breakdown(data, filter)
        .groups
        .into_iter()
        .map(|g| CountyRow {
            fuel_mix: fuel_mix(&g.breakdown),
            county: g.key,
            total_mw: format_number(g.total_capacity, 2),
            projects: g.record_count,
        })
        .collect()
}

/// Project count and MW per COD quarter, oldest first. Undated projects are
/// left out.
pub fn quarterly_report(data: &[Record], filter: Option<&PeriodFilter>) -> Vec<QuarterRow> {
    aggregate(data, Dimension::Period, filter)
        .groups
        .into_iter()
        .map(|g| QuarterRow {
            quarter: g.key,
            projects: g.record_count,
            total_mw: format_number(g.total_capacity, 2),
        })
        .collect()
}

/// Breakdown by fuel, technology, or refined category with each group's
/// share of total MW. The `Unknown` bucket is omitted and does not count
/// toward the shares.
pub fn category_report(
    data: &[Record],
    dimension: Dimension,
    filter: Option<&PeriodFilter>,
) -> Vec<CategoryRow> {
    let view = aggregate(data, dimension, filter);
    let known: Vec<&GroupSummary> = view.groups.iter().filter(|g| g.key != UNKNOWN).collect();
    let total: f64 = known.iter().map(|g| g.total_capacity).sum();
    known
        .into_iter()
        .map(|g| {
            let pct = if total > 0.0 {
                g.total_capacity / total * 100.0
            } else {
                0.0
            };
            CategoryRow {
                category: g.key.clone(),
                projects: g.record_count,
                total_mw: format_number(g.total_capacity, 2),
                share_of_mw: format!("{:.1}%", pct),
            }
        })
        .collect()
}

/// Sorted unique quarter labels present in the data.
pub fn available_quarters(data: &[Record]) -> Vec<String> {
    data.iter()
        .filter_map(Record::period)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|p| p.to_string())
        .collect()
}

/// Dashboard payload for a set of selected quarters.
pub fn quarter_summary(data: &[Record], filter: &PeriodFilter) -> QuarterSummary {
    let counties = county_breakdown(data, Some(filter));
    let categories = aggregate(data, Dimension::Category, Some(filter));

    let mut fuel_chart = ChartSeries::default();
    for g in &categories.groups {
        fuel_chart.labels.push(g.key.clone());
        fuel_chart.data.push(g.total_capacity);
        fuel_chart.colors.push(category_color(&g.key).to_string());
    }

    QuarterSummary {
        quarters: filter.labels(),
        total_mw: counties.total_capacity,
        total_projects: counties.record_count,
        top_counties: counties
            .groups
            .iter()
            .take(TOP_COUNTIES)
            .map(|g| CountyTotal {
                county: g.key.clone(),
                mw: g.total_capacity,
            })
            .collect(),
        fuel_chart,
        county_data: counties
            .groups
            .iter()
            .map(|g| CountyEntry {
                county: g.key.clone(),
                total_mw: g.total_capacity,
                project_count: g.record_count,
                fuel_breakdown: fuel_mix(&g.breakdown),
            })
            .collect(),
    }
}

/// Drill-down for one county (matched case-insensitively) within the
/// selected quarters.
pub fn county_details(
    data: &[Record],
    county: &str,
    filter: Option<&PeriodFilter>,
) -> CountyDetails {
    let wanted = county.trim();
    let mut projects: Vec<ProjectSummary> = apply_filter(data, filter)
        .into_iter()
        .filter(|r| {
            Dimension::County
                .key(r)
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
        })
        .map(|r| ProjectSummary {
            inr: r.inr.clone(),
            project_name: r.project_name.clone(),
            category: categorize(r.fuel.as_deref(), r.technology.as_deref()),
            capacity_mw: r.capacity_mw,
            projected_cod: r.projected_cod,
            period: r.period().map(|p| p.to_string()),
        })
        .collect();
    projects.sort_by(|a, b| cmp_none_last(&a.projected_cod, &b.projected_cod));

    let mut summary = CountyMix::default();
    for p in &projects {
        if p.category.contains("Solar") {
            summary.solar_mw += p.capacity_mw;
        } else if p.category.contains("Wind") {
            summary.wind_mw += p.capacity_mw;
        } else if p.category.contains("Storage") {
            summary.storage_mw += p.capacity_mw;
        }
        summary.total_mw += p.capacity_mw;
        summary.project_count += 1;
    }

    CountyDetails {
        county: wanted.to_string(),
        quarters: filter.map(PeriodFilter::labels).unwrap_or_default(),
        summary,
        projects,
    }
}

fn or_blank(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

pub fn added_rows(result: &ComparisonResult) -> Vec<AddedRow> {
    result
        .added
        .iter()
        .map(|p| AddedRow {
            inr: p.inr.clone(),
            project_name: or_blank(&p.project_name),
            county: or_blank(&p.county),
            mw: format_number(p.capacity_mw, 1),
            fuel_type: p.fuel_type.clone(),
            cod: p
                .projected_cod
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn changed_rows(result: &ComparisonResult) -> Vec<ChangedRow> {
    result
        .changed
        .iter()
        .map(|p| ChangedRow {
            inr: p.inr.clone(),
            project_name: or_blank(&p.project_name),
            county: or_blank(&p.county),
            changes: p.change_count,
            details: p
                .changes
                .iter()
                .map(|c| format!("{}: {} -> {}", c.attribute, c.old_value, c.new_value))
                .collect::<Vec<_>>()
                .join("; "),
        })
        .collect()
}

pub fn flagged_rows(result: &ComparisonResult) -> Vec<FlaggedRow> {
    result
        .flagged
        .iter()
        .map(|p| FlaggedRow {
            inr: or_blank(&p.inr),
            project_name: or_blank(&p.project_name),
            county: or_blank(&p.county),
            change_flag: p.change_flag.clone(),
            new_values: p.new_values.join("; "),
        })
        .collect()
}

pub fn comparison_report(
    base_period: &str,
    target_period: &str,
    result: ComparisonResult,
) -> ComparisonReport {
    ComparisonReport {
        base_period: base_period.to_string(),
        target_period: target_period.to_string(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{AddedProject, AttributeChange, ChangedProject};
    use chrono::NaiveDate;

    fn rec(
        inr: &str,
        county: &str,
        fuel: &str,
        tech: &str,
        mw: f64,
        cod: Option<(i32, u32, u32)>,
    ) -> Record {
        Record {
            inr: Some(inr.to_string()),
            county: Some(county.to_string()),
            fuel: Some(fuel.to_string()),
            technology: Some(tech.to_string()),
            capacity_mw: mw,
            projected_cod: cod.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            rec("1", "Pecos", "SOL", "PV", 300.0, Some((2025, 2, 1))),
            rec("2", "Pecos", "OTH", "BA", 100.0, Some((2025, 3, 1))),
            rec("3", "Pecos", "WIN", "WT", 120.0, Some((2025, 8, 1))),
            rec("4", "Nolan", "WIN", "WT", 200.0, Some((2025, 1, 20))),
            rec("5", "Ector", "", "", 50.0, None),
        ]
    }

    #[test]
    fn county_report_ranks_and_describes_mix() {
        let rows = county_report(&sample(), None);
        assert_eq!(rows[0].county, "Pecos");
        assert_eq!(rows[0].total_mw, "520.00");
        assert_eq!(
            rows[0].fuel_mix,
            "Solar: 300.0 MW, Wind: 120.0 MW, Battery Energy Storage: 100.0 MW"
        );
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn quarterly_report_skips_undated_projects() {
        let rows = quarterly_report(&sample(), None);
        let quarters: Vec<(&str, usize)> = rows
            .iter()
            .map(|r| (r.quarter.as_str(), r.projects))
            .collect();
        assert_eq!(quarters, vec![("2025Q1", 3), ("2025Q3", 1)]);
    }

    #[test]
    fn category_shares_ignore_unknown() {
        let rows = category_report(&sample(), Dimension::Fuel, None);
        assert!(rows.iter().all(|r| r.category != "Unknown"));
        let wind = rows.iter().find(|r| r.category == "Wind").unwrap();
        assert_eq!(wind.projects, 2);
        assert_eq!(wind.share_of_mw, "44.4%");
    }

    #[test]
    fn quarter_summary_restricts_to_selection() {
        let filter = PeriodFilter::parse(&["2025Q1"]).unwrap();
        let summary = quarter_summary(&sample(), &filter);
        assert_eq!(summary.quarters, vec!["2025Q1"]);
        assert_eq!(summary.total_projects, 3);
        assert_eq!(summary.total_mw, 600.0);
        assert_eq!(summary.top_counties[0].county, "Pecos");
        assert_eq!(summary.fuel_chart.labels, vec!["Solar", "Wind", "Battery Energy Storage"]);
        assert_eq!(summary.fuel_chart.colors, vec!["#FDB813", "#4169E1", "#32CD32"]);
        let chart_total: f64 = summary.fuel_chart.data.iter().sum();
        assert_eq!(chart_total, summary.total_mw);
    }

    #[test]
    fn county_details_split_by_technology() {
        let details = county_details(&sample(), "pecos", None);
        assert_eq!(details.summary.solar_mw, 300.0);
        assert_eq!(details.summary.wind_mw, 120.0);
        assert_eq!(details.summary.storage_mw, 100.0);
        assert_eq!(details.summary.total_mw, 520.0);
        let order: Vec<&str> = details.projects.iter().filter_map(|p| p.inr.as_deref()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[test]
    fn available_quarters_are_unique_and_sorted() {
        assert_eq!(available_quarters(&sample()), vec!["2025Q1", "2025Q3"]);
    }

    #[test]
    fn comparison_rows_render_missing_values_blank() {
        let result = ComparisonResult {
            added: vec![AddedProject {
                inr: "B".into(),
                project_name: None,
                county: Some("Nolan".into()),
                capacity_mw: 5.0,
                fuel_type: "Wind".into(),
                projected_cod: None,
            }],
            changed: vec![ChangedProject {
                inr: "A".into(),
                project_name: Some("Alpha".into()),
                county: None,
                change_count: 1,
                changes: vec![AttributeChange {
                    attribute: "Capacity (MW)".into(),
                    old_value: "10".into(),
                    new_value: "20".into(),
                }],
            }],
            flagged: vec![],
        };
        let added = added_rows(&result);
        assert_eq!(added[0].project_name, "");
        assert_eq!(added[0].cod, "");
        assert_eq!(added[0].mw, "5.0");
        let changed = changed_rows(&result);
        assert_eq!(changed[0].details, "Capacity (MW): 10 -> 20");
        assert!(flagged_rows(&result).is_empty());

        let report = comparison_report("2025-09", "2025-10", result);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["base_period"], "2025-09");
        assert_eq!(json["added"][0]["inr"], "B");
    }
}
