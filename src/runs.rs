use chrono::{Local, NaiveDate};
use clap::Args;
use kmatch_sponsors::config::AppConfig;
use kmatch_sponsors::error::AppError;
use kmatch_sponsors::pipeline::{
    capture_snapshot, compare_latest, export_new_entries, read_name_list, update_registry,
    RegistryUpdate, SnapshotComparison,
};
use kmatch_sponsors::register::HttpRegisterFetcher;
use kmatch_sponsors::snapshot::{
    snapshot_file_name, FileTableStore, OrganizationRecord, TabularStore,
};
use kmatch_sponsors::sponsors::{derive_key, DerivedKey, JsonRegistryStore, KeyRules};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct ScrapeArgs {
    /// Override the configured register URL
    #[arg(long)]
    url: Option<String>,
    /// Write the snapshot here instead of the dated file in the data directory
    #[arg(long)]
    output: Option<PathBuf>,
    /// Date used for the snapshot file name (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SnapshotRunArgs {
    /// Run date used for output names and `lastUpdated` (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct MergeArgs {
    /// CSV or spreadsheet export holding the organisations to merge
    #[arg(
        long,
        visible_alias = "csv",
        conflicts_with = "names",
        required_unless_present = "names"
    )]
    table: Option<PathBuf>,
    /// Plain text file with one organisation name per line
    #[arg(long)]
    names: Option<PathBuf>,
    /// Run date used for `lastUpdated` (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct KeyArgs {
    /// Organisation names to derive keys for
    #[arg(required = true)]
    names: Vec<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct KeyReport<'a> {
    name: &'a str,
    #[serde(flatten)]
    derived: DerivedKey,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) fn run_scrape(config: &AppConfig, args: ScrapeArgs) -> Result<(), AppError> {
    let ScrapeArgs { url, output, today } = args;
    let url = url.unwrap_or_else(|| config.source.register_url.clone());
    let output = output.unwrap_or_else(|| {
        config
            .paths
            .data_dir
            .join(snapshot_file_name(today_or_now(today)))
    });

    if let Some(parent) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let fetcher = HttpRegisterFetcher::new(config.source.http_timeout)?;
    let table = capture_snapshot(
        &fetcher,
        &FileTableStore,
        &url,
        &config.source.name_column,
        &output,
    )?;

    println!("Saved {} sponsors to {}", table.len(), output.display());
    Ok(())
}

pub(crate) fn run_export_new(config: &AppConfig, args: SnapshotRunArgs) -> Result<(), AppError> {
    let data_dir = &config.paths.data_dir;
    let Some(comparison) = compare_latest(&FileTableStore, data_dir, &config.source.name_column)?
    else {
        println!("Need at least 2 snapshots to compare");
        return Ok(());
    };

    match export_new_entries(&FileTableStore, &comparison, data_dir, today_or_now(args.today))? {
        Some(path) => {
            println!("Found {} new entries", comparison.diff.added.len());
            println!("Exported to: {}", path.display());
        }
        None => println!("No new entries found"),
    }
    Ok(())
}

pub(crate) fn run_update(
    config: &AppConfig,
    rules: &KeyRules,
    args: SnapshotRunArgs,
) -> Result<(), AppError> {
    let Some(comparison) = compare_latest(
        &FileTableStore,
        &config.paths.data_dir,
        &config.source.name_column,
    )?
    else {
        println!("Need at least 2 snapshots to compare");
        return Ok(());
    };

    render_comparison(&comparison);

    if comparison.diff.added.is_empty() {
        println!("\nNo new entries to merge");
        return Ok(());
    }

    let update = update_registry(
        &JsonRegistryStore,
        &config.paths.registry_path,
        rules,
        comparison.diff.added_names(),
        today_or_now(args.today),
    )?;
    render_update(&update, config);
    Ok(())
}

pub(crate) fn run_merge(
    config: &AppConfig,
    rules: &KeyRules,
    args: MergeArgs,
) -> Result<(), AppError> {
    let names: Vec<String> = match (args.table, args.names) {
        (Some(path), _) => {
            let table = FileTableStore.read_table(&path, &config.source.name_column)?;
            info!(rows = table.len(), path = %path.display(), "read organisations");
            table.names().map(str::to_string).collect()
        }
        (None, Some(path)) => read_name_list(BufReader::new(File::open(&path)?))?,
        (None, None) => Vec::new(),
    };

    if names.is_empty() {
        println!("No names to merge");
        return Ok(());
    }

    let update = update_registry(
        &JsonRegistryStore,
        &config.paths.registry_path,
        rules,
        &names,
        today_or_now(args.today),
    )?;
    render_update(&update, config);
    Ok(())
}

pub(crate) fn run_key(rules: &KeyRules, args: KeyArgs) -> Result<(), AppError> {
    let reports: Vec<KeyReport<'_>> = args
        .names
        .iter()
        .map(|name| KeyReport {
            name,
            derived: derive_key(rules, name),
        })
        .collect();

    if args.json {
        let rendered = serde_json::to_string_pretty(&reports)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
    } else {
        for report in &reports {
            println!(
                "{} -> {} ({}, {})",
                report.name,
                report.derived.key,
                report.derived.rule.label(),
                report.derived.policy.label()
            );
        }
    }
    Ok(())
}

fn render_records(title: &str, records: &[OrganizationRecord]) {
    println!("\n{title}: {} entries", records.len());
    for record in records {
        println!("- {}", record.name);
    }
}

fn render_comparison(comparison: &SnapshotComparison) {
    println!(
        "Comparing {} with {}",
        comparison.pair.latest.path.display(),
        comparison.pair.previous.path.display()
    );
    render_records("New entries", &comparison.diff.added);
    render_records("Removed entries", &comparison.diff.removed);
}

fn render_update(update: &RegistryUpdate, config: &AppConfig) {
    let summary = &update.summary;
    println!(
        "\nMerged: {} added, {} replaced, {} already present, {} skipped",
        summary.added, summary.replaced, summary.unchanged, summary.skipped
    );
    if summary.relocated > 0 {
        println!("Removed duplicate filings of {} names", summary.relocated);
    }
    for name in &summary.displaced {
        println!("- displaced {name}");
    }

    if update.written {
        println!(
            "{} has been updated successfully!",
            config.paths.registry_path.display()
        );
    } else {
        println!(
            "{} is already up to date",
            config.paths.registry_path.display()
        );
    }
}
