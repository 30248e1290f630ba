// Fuel and technology code tables from the ERCOT GIM reports.
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const UNKNOWN: &str = "Unknown";
pub const OTHER: &str = "Other";

static FUEL_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("BIO", "Biomass"),
        ("COA", "Coal"),
        ("GAS", "Gas"),
        ("GEO", "Geothermal"),
        ("HYD", "Hydrogen"),
        ("NUC", "Nuclear"),
        ("OIL", "Fuel Oil"),
        ("OTH", "Other"),
        ("PET", "Petcoke"),
        ("SOL", "Solar"),
        ("WAT", "Water"),
        ("WIN", "Wind"),
    ])
});

static TECHNOLOGY_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("BA", "Battery Energy Storage"),
        ("CC", "Combined-Cycle"),
        ("CE", "Compressed Air Energy Storage"),
        ("CP", "Concentrated Solar Power"),
        ("EN", "Energy Storage"),
        ("FC", "Fuel Cell"),
        ("GT", "Combustion (Gas) Turbine"),
        ("HY", "Hydroelectric Turbine"),
        ("IC", "Internal Combustion Engine"),
        ("OT", "Other"),
        ("PV", "Photovoltaic Solar"),
        ("ST", "Steam Turbine"),
        ("WT", "Wind Turbine"),
    ])
});

/// Chart colors keyed by a word appearing in the category name.
const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("Solar", "#FDB813"),
    ("Wind", "#4169E1"),
    ("Storage", "#32CD32"),
    ("Battery", "#32CD32"),
    ("Gas", "#A9A9A9"),
];
const DEFAULT_COLOR: &str = "#808080";

fn lookup(table: &HashMap<&'static str, &'static str>, code: Option<&str>) -> String {
    let code = match code.map(str::trim) {
        Some(c) if !c.is_empty() && c != "nan" => c,
        _ => return UNKNOWN.to_string(),
    };
    match table.get(code.to_ascii_uppercase().as_str()) {
        Some(name) => name.to_string(),
        None => code.to_string(),
    }
}

/// Canonical fuel name. Blank → `Unknown`; unlisted codes pass through.
pub fn normalize_fuel(code: Option<&str>) -> String {
    lookup(&FUEL_TYPES, code)
}

/// Canonical technology name. Blank → `Unknown`; unlisted codes pass
/// through.
pub fn normalize_technology(code: Option<&str>) -> String {
    lookup(&TECHNOLOGY_TYPES, code)
}

/// Category used for grouping: the fuel name, unless it says nothing
/// (`Other`/`Unknown`) and the technology does. Storage is coded as fuel
/// `OTH` with technology `BA`, for example.
pub fn refine_category(fuel_name: &str, technology_name: &str) -> String {
    if (fuel_name == OTHER || fuel_name == UNKNOWN) && technology_name != UNKNOWN {
        technology_name.to_string()
    } else {
        fuel_name.to_string()
    }
}

/// Refined category straight from raw codes.
pub fn categorize(fuel_code: Option<&str>, technology_code: Option<&str>) -> String {
    refine_category(
        &normalize_fuel(fuel_code),
        &normalize_technology(technology_code),
    )
}

pub fn category_color(category: &str) -> &'static str {
    CATEGORY_COLORS
        .iter()
        .find(|(word, _)| category.contains(word))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}
