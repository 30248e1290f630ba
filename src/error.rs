use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Sheet '{sheet}' not found in {}: {source}", .path.display())]
    SheetNotFound {
        sheet: String,
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Malformed header in sheet '{sheet}' at row {offset}: {reason}")]
    MalformedHeader {
        sheet: String,
        offset: usize,
        reason: String,
    },

    #[error("Identifier column '{column}' missing from {side} snapshot")]
    IdentifierColumnMissing { column: String, side: String },

    #[error("No report file for {year}-{month:02} under {}", .root.display())]
    SnapshotNotFound {
        root: PathBuf,
        year: i32,
        month: u32,
    },

    #[error("Invalid period label '{0}' (expected e.g. 2025Q1)")]
    InvalidPeriod(String),

    #[error("Invalid configuration value for {key}: '{value}'")]
    Config { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
