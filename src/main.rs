// Entry point and interactive menu.
//
// - Option [1] loads one monthly snapshot (latest by default).
// - Option [2] exports the county, quarterly, fuel and technology reports
//   plus the quarter summary, optionally restricted to some quarters.
// - Option [3] drills into a single county.
// - Option [4] compares two monthly snapshots.
use interconnect_report::aggregate::Dimension;
use interconnect_report::cache::{ArtifactCache, ArtifactKey};
use interconnect_report::config::Settings;
use interconnect_report::diff::compare;
use interconnect_report::loader::load_snapshot;
use interconnect_report::paths::{self, Snapshot};
use interconnect_report::record::{PeriodFilter, RecordSet};
use interconnect_report::{output, reports, util, Result};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// The loaded snapshot is kept between menu actions so the workbook is only
// parsed once per selection.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Loaded>,
}

#[derive(Clone)]
struct Loaded {
    snapshot: Snapshot,
    records: RecordSet,
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice")
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Report Selection (Y/N)").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn loaded() -> Option<Loaded> {
    let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.data.clone()
}

/// `2025-09` or `2025/9` into (year, month).
fn parse_year_month(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.trim().split_once(['-', '/'])?;
    let year = y.trim().parse().ok()?;
    let month = m.trim().parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

fn join_numbers<T: ToString>(items: &[T]) -> String {
    items.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
}

/// Interactive snapshot selection: blank year means the latest snapshot.
fn choose_snapshot(settings: &Settings) -> Result<Option<Snapshot>> {
    let root = &settings.inputs_dir;
    let years = paths::available_years(root)?;
    if years.is_empty() {
        println!("No report files found under {}.\n", root.display());
        return Ok(None);
    }
    println!("Available years: {}", join_numbers(&years));
    let raw = prompt("Year (blank for latest)");
    if raw.is_empty() {
        return paths::latest_snapshot(root);
    }
    let Ok(year) = raw.parse::<i32>() else {
        println!("Invalid year '{}'.\n", raw);
        return Ok(None);
    };
    let months = paths::available_months(root, year)?;
    if months.is_empty() {
        println!("No reports for {}.\n", year);
        return Ok(None);
    }
    println!("Available months: {}", join_numbers(&months));
    let month = match prompt("Month").parse::<u32>() {
        Ok(m) => m,
        Err(_) => {
            println!("Invalid month.\n");
            return Ok(None);
        }
    };
    paths::resolve_snapshot(root, year, month).map(Some)
}

/// Handle option [1]: pick a snapshot and load it into `APP_STATE`.
fn handle_load(settings: &Settings) -> Result<()> {
    let Some(snapshot) = choose_snapshot(settings)? else {
        return Ok(());
    };
    let (records, load_report) =
        load_snapshot(&snapshot.path, &settings.sheet_name, settings.header_offset)?;
    println!(
        "Processing report {}... ({} projects loaded, {} columns)",
        snapshot.label(),
        util::format_int(load_report.total_rows),
        util::format_int(load_report.columns)
    );
    println!(
        "Total capacity: {} MW",
        util::format_number(records.total_capacity(), 2)
    );
    if load_report.undated_rows > 0 {
        println!(
            "Note: {} projects have no projected COD and are left out of quarterly views.",
            util::format_int(load_report.undated_rows)
        );
    }
    if !load_report.unresolved_roles.is_empty() {
        let names: Vec<String> = load_report
            .unresolved_roles
            .iter()
            .map(|r| r.to_string())
            .collect();
        println!("Warning: columns not found: {}", names.join(", "));
    }
    println!();
    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.data = Some(Loaded { snapshot, records });
    Ok(())
}

/// Ask for a quarter selection. Blank selects everything.
fn prompt_filter(records: &RecordSet) -> Result<PeriodFilter> {
    let quarters = reports::available_quarters(&records.records);
    println!("Available quarters: {}", quarters.join(", "));
    let raw = prompt("Quarters to include (comma separated, blank for all)");
    let labels: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    PeriodFilter::parse(&labels)
}

fn filter_tag(filter: &PeriodFilter) -> String {
    if filter.is_empty() {
        "all".to_string()
    } else {
        filter.labels().join("_")
    }
}

/// Handle option [2]: export every report view for the loaded snapshot.
fn handle_generate_reports(settings: &Settings, cache: &mut ArtifactCache) -> Result<()> {
    let Some(Loaded { snapshot, records }) = loaded() else {
        println!("Error: No report loaded. Please load a report first (option 1).\n");
        return Ok(());
    };
    let filter = prompt_filter(&records)?;
    let selected = (!filter.is_empty()).then_some(&filter);
    let data = &records.records;

    let dir = settings
        .outputs_dir
        .join(snapshot.label())
        .join(filter_tag(&filter));
    let files = [
        "county_summary.csv",
        "quarterly_timeline.csv",
        "fuel_breakdown.csv",
        "technology_breakdown.csv",
        "quarter_summary.json",
    ]
    .map(|f| dir.join(f));

    let key = ArtifactKey::new("reports", &snapshot.path, &filter.labels());
    if cache.is_fresh(&key) {
        println!("Reports for {} ({}) are up to date:", snapshot.label(), filter_tag(&filter));
        for f in &files {
            println!("  {}", f.display());
        }
        println!();
        return Ok(());
    }

    println!("Generating reports...");
    println!("Outputs saved to {}\n", dir.display());

    let counties = reports::county_report(data, selected);
    output::write_csv(&files[0], &counties)?;
    println!("Report 1: Capacity by County\n");
    output::preview_table_rows(&counties, 5);
    println!("(Full table exported to {})\n", files[0].display());

    let quarters = reports::quarterly_report(data, selected);
    output::write_csv(&files[1], &quarters)?;
    println!("Report 2: Projected COD Timeline\n");
    output::preview_table_rows(&quarters, 8);
    println!("(Full table exported to {})\n", files[1].display());

    let fuels = reports::category_report(data, Dimension::Fuel, selected);
    output::write_csv(&files[2], &fuels)?;
    println!("Report 3: Fuel Type Breakdown\n");
    output::preview_table_rows(&fuels, 10);
    println!("(Full table exported to {})\n", files[2].display());

    let techs = reports::category_report(data, Dimension::Technology, selected);
    output::write_csv(&files[3], &techs)?;
    println!("Report 4: Technology Type Breakdown\n");
    output::preview_table_rows(&techs, 10);
    println!("(Full table exported to {})\n", files[3].display());

    let summary_filter = if filter.is_empty() {
        PeriodFilter::parse(&reports::available_quarters(data))?
    } else {
        filter.clone()
    };
    let summary = reports::quarter_summary(data, &summary_filter);
    output::write_json(&files[4], &summary)?;
    println!("Quarter Summary ({}):", files[4].display());
    println!(
        "{{\"total_mw\": {}, \"total_projects\": {}}}\n",
        util::format_number(summary.total_mw, 2),
        util::format_int(summary.total_projects)
    );

    cache.put(&key, files.to_vec())?;
    cache.save()?;
    info!(snapshot = %snapshot.label(), filter = %filter_tag(&filter), "reports generated");
    Ok(())
}

/// Handle option [3]: capacity mix and project list for one county.
fn handle_county_details(settings: &Settings) -> Result<()> {
    let Some(Loaded { snapshot, records }) = loaded() else {
        println!("Error: No report loaded. Please load a report first (option 1).\n");
        return Ok(());
    };
    let county = prompt("County");
    if county.is_empty() {
        return Ok(());
    }
    let filter = prompt_filter(&records)?;
    let selected = (!filter.is_empty()).then_some(&filter);
    let details = reports::county_details(&records.records, &county, selected);
    if details.projects.is_empty() {
        println!("No projects found for county '{}'.\n", county);
        return Ok(());
    }

    let mix = &details.summary;
    println!("\n{} County ({} projects)", details.county, mix.project_count);
    println!("  Solar:   {} MW", util::format_number(mix.solar_mw, 1));
    println!("  Wind:    {} MW", util::format_number(mix.wind_mw, 1));
    println!("  Storage: {} MW", util::format_number(mix.storage_mw, 1));
    println!("  Total:   {} MW\n", util::format_number(mix.total_mw, 1));
    for p in details.projects.iter().take(10) {
        println!(
            "  {:<12} {:<40} {:>10} MW  {}",
            p.inr.as_deref().unwrap_or("-"),
            p.project_name.as_deref().unwrap_or("-"),
            util::format_number(p.capacity_mw, 1),
            p.period.as_deref().unwrap_or("undated")
        );
    }

    let file = settings
        .outputs_dir
        .join(snapshot.label())
        .join(filter_tag(&filter))
        .join(format!("county_{}.json", details.county.to_lowercase().replace(' ', "_")));
    output::write_json(&file, &details)?;
    println!("\n(Full details exported to {})\n", file.display());
    Ok(())
}

fn prompt_snapshot(settings: &Settings, label: &str) -> Result<Option<Snapshot>> {
    let raw = prompt(label);
    let Some((year, month)) = parse_year_month(&raw) else {
        println!("Invalid month '{}'. Use YYYY-MM.\n", raw);
        return Ok(None);
    };
    paths::resolve_snapshot(&settings.inputs_dir, year, month).map(Some)
}

fn comparison_dir(outputs: &Path, base: &Snapshot, target: &Snapshot) -> PathBuf {
    outputs.join(format!("compare_{}_to_{}", base.label(), target.label()))
}

/// Handle option [4]: month-over-month comparison.
fn handle_compare(settings: &Settings) -> Result<()> {
    let Some(base) = prompt_snapshot(settings, "Base month (YYYY-MM)")? else {
        return Ok(());
    };
    let Some(target) = prompt_snapshot(settings, "Target month (YYYY-MM)")? else {
        return Ok(());
    };
    let (base_set, _) = load_snapshot(&base.path, &settings.sheet_name, settings.header_offset)?;
    let (target_set, _) =
        load_snapshot(&target.path, &settings.sheet_name, settings.header_offset)?;
    let result = compare(&base_set, &target_set, &settings.diff)?;

    let dir = comparison_dir(&settings.outputs_dir, &base, &target);
    let added = reports::added_rows(&result);
    let changed = reports::changed_rows(&result);
    let flagged = reports::flagged_rows(&result);

    println!("\nComparing {} -> {}\n", base.label(), target.label());

    output::write_csv(&dir.join("added_projects.csv"), &added)?;
    println!("New Projects ({})\n", util::format_int(added.len()));
    output::preview_table_rows(&added, 5);

    output::write_csv(&dir.join("changed_projects.csv"), &changed)?;
    println!("Changed Projects ({})\n", util::format_int(changed.len()));
    output::preview_table_rows(&changed, 5);

    output::write_csv(&dir.join("flagged_projects.csv"), &flagged)?;
    println!("Flagged Changes ({})\n", util::format_int(flagged.len()));
    output::preview_table_rows(&flagged, 5);

    let report = reports::comparison_report(&base.label(), &target.label(), result);
    output::write_json(&dir.join("comparison.json"), &report)?;
    println!("(Full comparison exported to {})\n", dir.display());
    Ok(())
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let mut cache = match ArtifactCache::open(&settings.cache_file) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "could not open artifact cache");
            ArtifactCache::empty(&settings.cache_file)
        }
    };

    loop {
        println!("Select Report Action:");
        println!("[1] Load a report");
        println!("[2] Generate Reports");
        println!("[3] County Details");
        println!("[4] Compare Months\n");
        let outcome = match read_choice().as_str() {
            "1" => handle_load(&settings),
            "2" => {
                println!();
                handle_generate_reports(&settings, &mut cache)
            }
            "3" => handle_county_details(&settings),
            "4" => handle_compare(&settings),
            _ => {
                println!("Invalid choice. Please enter 1, 2, 3 or 4.\n");
                continue;
            }
        };
        if let Err(e) = outcome {
            error!(error = %e, "action failed");
            eprintln!("Error: {}\n", e);
            continue;
        }
        if !prompt_back_to_menu() {
            println!("Exiting the program.");
            break;
        }
    }
}
