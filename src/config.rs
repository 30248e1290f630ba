// Runtime settings for the reporter.
//
// Everything has a default matching the known ERCOT GIM layout; each value
// can be overridden through the environment or a `.env` file.
use crate::diff::DiffOptions;
use crate::error::{ReportError, Result};
use std::path::PathBuf;

pub const DEFAULT_SHEET: &str = "Project Details - Large Gen";
/// 0-based row of the primary header row (UI row 31).
pub const DEFAULT_HEADER_OFFSET: usize = 30;

const INPUTS_DIR: &str = "REPORTER_INPUTS_DIR";
const OUTPUTS_DIR: &str = "REPORTER_OUTPUTS_DIR";
const SHEET: &str = "REPORTER_SHEET";
const HEADER_OFFSET: &str = "REPORTER_HEADER_OFFSET";
const CACHE_FILE: &str = "REPORTER_CACHE_FILE";
const INCLUDE_CHANGE_INDICATOR: &str = "REPORTER_DIFF_INCLUDE_CHANGE_INDICATOR";

#[derive(Debug, Clone)]
pub struct Settings {
    pub inputs_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub sheet_name: String,
    pub header_offset: usize,
    pub cache_file: PathBuf,
    pub diff: DiffOptions,
}

impl Default for Settings {
    fn default() -> Self {
        let outputs_dir = PathBuf::from("outputs");
        Settings {
            inputs_dir: PathBuf::from("inputs"),
            cache_file: outputs_dir.join("artifact_cache.json"),
            outputs_dir,
            sheet_name: DEFAULT_SHEET.to_string(),
            header_offset: DEFAULT_HEADER_OFFSET,
            diff: DiffOptions::default(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if
    /// one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(dir) = get(INPUTS_DIR) {
            settings.inputs_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(OUTPUTS_DIR) {
            settings.outputs_dir = PathBuf::from(dir);
        }
        settings.cache_file = match get(CACHE_FILE) {
            Some(file) => PathBuf::from(file),
            None => settings.outputs_dir.join("artifact_cache.json"),
        };
        if let Some(sheet) = get(SHEET) {
            settings.sheet_name = sheet;
        }
        if let Some(raw) = get(HEADER_OFFSET) {
            settings.header_offset = raw.parse().map_err(|_| ReportError::Config {
                key: HEADER_OFFSET.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = get(INCLUDE_CHANGE_INDICATOR) {
            settings.diff.include_change_indicator = parse_bool(&raw).ok_or_else(|| {
                ReportError::Config {
                    key: INCLUDE_CHANGE_INDICATOR.to_string(),
                    value: raw.clone(),
                }
            })?;
        }
        Ok(settings)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
