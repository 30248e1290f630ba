// Month-over-month comparison of two report snapshots.
//
// Pure functions: two record sets in, added/changed/flagged views out.
// `changed` is computed from the data; `flagged` is read from the target
// report's own change-indicator column. The two are independent and may
// disagree.
use crate::categories::categorize;
use crate::error::Result;
use crate::normalize::{comparable_value, parse_cell_date};
use crate::record::{Record, RecordSet};
use crate::schema::FieldRole;
use crate::sheet::{Cell, EMPTY_CELL};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::info;

pub const EMPTY_VALUE: &str = "(empty)";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffOptions {
    /// Compare the free-text change-indicator column like any other
    /// attribute. Off by default, since it is already reported by `flagged`.
    pub include_change_indicator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedProject {
    pub inr: String,
    pub project_name: Option<String>,
    pub county: Option<String>,
    pub capacity_mw: f64,
    pub fuel_type: String,
    pub projected_cod: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedProject {
    pub inr: String,
    pub project_name: Option<String>,
    pub county: Option<String>,
    pub change_count: usize,
    pub changes: Vec<AttributeChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedProject {
    pub inr: Option<String>,
    pub project_name: Option<String>,
    pub county: Option<String>,
    pub change_flag: String,
    pub new_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub added: Vec<AddedProject>,
    pub changed: Vec<ChangedProject>,
    pub flagged: Vec<FlaggedProject>,
}

/// Indicator substrings (matched case-insensitively against the change
/// flag) and the attribute whose new value they announce.
const INDICATORS: &[(&str, FieldRole, &str)] = &[
    ("cod", FieldRole::CompletionDate, "Projected COD"),
    ("mw", FieldRole::Capacity, "Capacity"),
    ("capacity", FieldRole::Capacity, "Capacity"),
    ("name", FieldRole::ProjectName, "Project Name"),
    ("status", FieldRole::Status, "Status"),
    ("phase", FieldRole::StudyPhase, "GIM Study Phase"),
];

/// Compare `base` (older) against `target` (newer), keyed by INR.
///
/// Fails with `IdentifierColumnMissing` when either side has no INR column.
pub fn compare(
    base: &RecordSet,
    target: &RecordSet,
    options: &DiffOptions,
) -> Result<ComparisonResult> {
    base.schema.require_identifier("base")?;
    target.schema.require_identifier("target")?;

    let result = ComparisonResult {
        added: added_projects(base, target),
        changed: changed_projects(base, target, options),
        flagged: flagged_projects(target),
    };
    info!(
        added = result.added.len(),
        changed = result.changed.len(),
        flagged = result.flagged.len(),
        "compared snapshots"
    );
    Ok(result)
}

/// Target records whose INR never appears in the base. Records without an
/// INR take no part.
pub fn added_projects(base: &RecordSet, target: &RecordSet) -> Vec<AddedProject> {
    let known: HashSet<&str> = base.records.iter().filter_map(|r| r.inr.as_deref()).collect();
    let mut added: Vec<AddedProject> = target
        .records
        .iter()
        .filter_map(|r| {
            let inr = r.inr.as_deref()?;
            (!known.contains(inr)).then(|| AddedProject {
                inr: inr.to_string(),
                project_name: r.project_name.clone(),
                county: r.county.clone(),
                capacity_mw: r.capacity_mw,
                fuel_type: categorize(r.fuel.as_deref(), r.technology.as_deref()),
                projected_cod: r.projected_cod,
            })
        })
        .collect();
    added.sort_by(|a, b| {
        cmp_none_last(&a.projected_cod, &b.projected_cod)
            .then_with(|| cmp_none_last(&a.county, &b.county))
    });
    added
}

/// Attribute-level differences for every INR present on both sides.
pub fn changed_projects(
    base: &RecordSet,
    target: &RecordSet,
    options: &DiffOptions,
) -> Vec<ChangedProject> {
    let attributes = compared_attributes(base, target, options);
    let base_by_inr = index_by_inr(base);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut changed = Vec::new();
    for new in &target.records {
        let Some(inr) = new.inr.as_deref() else {
            continue;
        };
        if !seen.insert(inr) {
            continue;
        }
        let Some(old) = base_by_inr.get(inr) else {
            continue;
        };
        let changes: Vec<AttributeChange> = attributes
            .iter()
            .filter_map(|name| {
                let before = value_of(base, old, name);
                let after = value_of(target, new, name);
                (before != after).then(|| AttributeChange {
                    attribute: name.clone(),
                    old_value: before.unwrap_or_else(|| EMPTY_VALUE.to_string()),
                    new_value: after.unwrap_or_else(|| EMPTY_VALUE.to_string()),
                })
            })
            .collect();
        if !changes.is_empty() {
            changed.push(ChangedProject {
                inr: inr.to_string(),
                project_name: new.project_name.clone(),
                county: new.county.clone(),
                change_count: changes.len(),
                changes,
            });
        }
    }
    changed.sort_by(|a, b| {
        cmp_none_last(&a.county, &b.county).then_with(|| b.change_count.cmp(&a.change_count))
    });
    changed
}

/// Target records whose change-indicator cell is filled in, with a summary
/// line for each recognised indicator.
pub fn flagged_projects(target: &RecordSet) -> Vec<FlaggedProject> {
    let mut flagged: Vec<FlaggedProject> = target
        .records
        .iter()
        .filter_map(|r| {
            let flag = r.change_indicator.clone()?;
            Some(FlaggedProject {
                inr: r.inr.clone(),
                project_name: r.project_name.clone(),
                county: r.county.clone(),
                new_values: describe_flag(&flag, r, target),
                change_flag: flag,
            })
        })
        .collect();
    flagged.sort_by(|a, b| cmp_none_last(&a.county, &b.county));
    flagged
}

/// Human-readable "what changed" lines for one flagged record. Indicators
/// with no matching attribute value are skipped.
pub fn describe_flag(flag: &str, record: &Record, set: &RecordSet) -> Vec<String> {
    let flag = flag.to_lowercase();
    let mut reported: HashSet<FieldRole> = HashSet::new();
    let mut lines = Vec::new();
    for (needle, role, label) in INDICATORS {
        if !flag.contains(needle) || !set.schema.has(*role) || reported.contains(role) {
            continue;
        }
        let Some(value) = record.attribute(*role) else {
            continue;
        };
        reported.insert(*role);
        lines.push(match role {
            FieldRole::Capacity => format!("{}: {} MW", label, value),
            _ => format!("{}: {}", label, value),
        });
    }
    lines
}

/// Column names compared between snapshots: the union of both sides in
/// target-first order, minus the identifier and county (and the change
/// indicator unless configured otherwise).
fn compared_attributes(
    base: &RecordSet,
    target: &RecordSet,
    options: &DiffOptions,
) -> Vec<String> {
    let mut excluded: HashSet<&str> = HashSet::new();
    for set in [base, target] {
        let mut roles = vec![FieldRole::Identifier, FieldRole::County];
        if !options.include_change_indicator {
            roles.push(FieldRole::ChangeIndicator);
        }
        for role in roles {
            if let Some(i) = set.schema.index(role) {
                excluded.insert(set.columns[i].as_str());
            }
        }
    }
    let mut seen: HashSet<&str> = HashSet::new();
    let mut names = Vec::new();
    for c in target.columns.iter().chain(base.columns.iter()) {
        if !excluded.contains(c.as_str()) && seen.insert(c.as_str()) {
            names.push(c.clone());
        }
    }
    names
}

fn index_by_inr(set: &RecordSet) -> HashMap<&str, &Record> {
    let mut map = HashMap::new();
    for r in &set.records {
        if let Some(inr) = r.inr.as_deref() {
            map.entry(inr).or_insert(r);
        }
    }
    map
}

/// Comparable text of `column` for one record. The completion-date column
/// is read the way the loader reads it, so Excel serials and date text for
/// the same day compare equal.
fn value_of(set: &RecordSet, record: &Record, column: &str) -> Option<String> {
    let idx = set.column_index(column)?;
    let cell = record.cells.get(idx).unwrap_or(&EMPTY_CELL);
    if set.schema.index(FieldRole::CompletionDate) == Some(idx) {
        if let Some(date) = parse_cell_date(cell) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    comparable_value(cell)
}

pub(crate) fn cmp_none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
