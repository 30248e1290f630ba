// Presentation rows and JSON payloads built from aggregate views and
// comparison results. Table rows carry pre-formatted strings; JSON payloads
// keep raw numbers.
use crate::diff::ComparisonResult;
use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CountyRow {
    #[serde(rename = "County")]
    #[tabled(rename = "County")]
    pub county: String,
    #[serde(rename = "TotalMW")]
    #[tabled(rename = "TotalMW")]
    pub total_mw: String,
    #[serde(rename = "Projects")]
    #[tabled(rename = "Projects")]
    pub projects: usize,
    #[serde(rename = "FuelMix")]
    #[tabled(rename = "FuelMix")]
    pub fuel_mix: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct QuarterRow {
    #[serde(rename = "Quarter")]
    #[tabled(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "Projects")]
    #[tabled(rename = "Projects")]
    pub projects: usize,
    #[serde(rename = "TotalMW")]
    #[tabled(rename = "TotalMW")]
    pub total_mw: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CategoryRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Projects")]
    #[tabled(rename = "Projects")]
    pub projects: usize,
    #[serde(rename = "TotalMW")]
    #[tabled(rename = "TotalMW")]
    pub total_mw: String,
    #[serde(rename = "ShareOfMW")]
    #[tabled(rename = "ShareOfMW")]
    pub share_of_mw: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AddedRow {
    #[serde(rename = "INR")]
    #[tabled(rename = "INR")]
    pub inr: String,
    #[serde(rename = "ProjectName")]
    #[tabled(rename = "ProjectName")]
    pub project_name: String,
    #[serde(rename = "County")]
    #[tabled(rename = "County")]
    pub county: String,
    #[serde(rename = "MW")]
    #[tabled(rename = "MW")]
    pub mw: String,
    #[serde(rename = "FuelType")]
    #[tabled(rename = "FuelType")]
    pub fuel_type: String,
    #[serde(rename = "COD")]
    #[tabled(rename = "COD")]
    pub cod: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChangedRow {
    #[serde(rename = "INR")]
    #[tabled(rename = "INR")]
    pub inr: String,
    #[serde(rename = "ProjectName")]
    #[tabled(rename = "ProjectName")]
    pub project_name: String,
    #[serde(rename = "County")]
    #[tabled(rename = "County")]
    pub county: String,
    #[serde(rename = "Changes")]
    #[tabled(rename = "Changes")]
    pub changes: usize,
    #[serde(rename = "Details")]
    #[tabled(rename = "Details")]
    pub details: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FlaggedRow {
    #[serde(rename = "INR")]
    #[tabled(rename = "INR")]
    pub inr: String,
    #[serde(rename = "ProjectName")]
    #[tabled(rename = "ProjectName")]
    pub project_name: String,
    #[serde(rename = "County")]
    #[tabled(rename = "County")]
    pub county: String,
    #[serde(rename = "ChangeFlag")]
    #[tabled(rename = "ChangeFlag")]
    pub change_flag: String,
    #[serde(rename = "NewValues")]
    #[tabled(rename = "NewValues")]
    pub new_values: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CountyTotal {
    pub county: String,
    pub mw: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CountyEntry {
    pub county: String,
    pub total_mw: f64,
    pub project_count: usize,
    pub fuel_breakdown: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuarterSummary {
    pub quarters: Vec<String>,
    pub total_mw: f64,
    pub total_projects: usize,
    pub top_counties: Vec<CountyTotal>,
    pub fuel_chart: ChartSeries,
    pub county_data: Vec<CountyEntry>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProjectSummary {
    pub inr: Option<String>,
    pub project_name: Option<String>,
    pub category: String,
    pub capacity_mw: f64,
    pub projected_cod: Option<NaiveDate>,
    pub period: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct CountyMix {
    pub solar_mw: f64,
    pub wind_mw: f64,
    pub storage_mw: f64,
    pub total_mw: f64,
    pub project_count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CountyDetails {
    pub county: String,
    pub quarters: Vec<String>,
    pub summary: CountyMix,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ComparisonReport {
    pub base_period: String,
    pub target_period: String,
    #[serde(flatten)]
    pub result: ComparisonResult,
}
