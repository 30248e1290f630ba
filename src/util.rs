// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" spreadsheet text/number/date handling
// so the rest of the code can assume clean, typed values.
use chrono::{Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Text date layouts seen in GIM exports, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d, %Y",
];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace and strips thousands separators.
/// - Accepts accounting negatives like `(100)` as `-100`.
/// - Accepts scientific notation (`1e3`).
/// - Returns `None` for anything that cannot be parsed or is not finite,
///   so `nan` and `inf` never sneak through.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    let (negative, body) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s.as_str()),
    };
    let v = body.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -v } else { v })
}

/// Parse a date from free text. Datetime strings are truncated to the date.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Convert an Excel 1900-system serial number into a datetime.
///
/// Serials below 1 are not dates (a bare time of day, or garbage).
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    // Day 0 is 1899-12-30 once Excel's phantom 1900-02-29 is accounted for.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(secs))
}

/// Render a number the way a spreadsheet shows it: integral values have no
/// decimal part.
pub fn format_plain(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
