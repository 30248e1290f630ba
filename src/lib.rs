// Generator interconnection queue reports from monthly spreadsheet snapshots.
//
// Pipeline: `sheet` reads the raw grid, `header` resolves the stacked
// header block, `loader` builds a normalized `RecordSet`, and `aggregate`,
// `diff` and `reports` derive views from it.
pub mod aggregate;
pub mod cache;
pub mod categories;
pub mod config;
pub mod diff;
pub mod error;
pub mod header;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod paths;
pub mod record;
pub mod reports;
pub mod schema;
pub mod sheet;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
